//! Streaming of decoded records.
//!
//! [`RecordStream`] pulls lines from a line iterator (normally a
//! [`LineSource`]), keeps the ones carrying its extractor's record-type tag
//! and decodes them one at a time. Lines of other record types are skipped
//! silently: CAT files interleave every record type in a single file.

use crate::config::{CatConfig, ErrorPolicy};
use crate::constants::MAX_RECORDED_ERRORS;
use crate::error::Result;
use crate::extractor::RecordExtractor;
use crate::models::{RecordMap, RecordTuple};
use crate::source::LineSource;
use std::path::Path;
use tracing::{debug, warn};

/// Counters for one pass over a line source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub lines_read: usize,
    pub records_matched: usize,
    pub records_decoded: usize,
    pub records_skipped: usize,
    /// First few decode failures, for reporting
    pub errors: Vec<String>,
}

impl StreamStats {
    fn record_skip(&mut self, message: String) {
        self.records_skipped += 1;
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(message);
        }
    }
}

type DecodeFn<'a, R> = fn(&RecordExtractor<'a>, &str) -> Result<R>;

/// Lazy sequence of decoded records of one type
pub struct RecordStream<'a, I, R> {
    lines: I,
    extractor: RecordExtractor<'a>,
    decode: DecodeFn<'a, R>,
    policy: ErrorPolicy,
    stats: StreamStats,
    done: bool,
}

/// Stream yielding records as value tuples
pub type TupleStream<'a, I> = RecordStream<'a, I, RecordTuple>;

/// Stream yielding records as name-keyed maps
pub type MapStream<'a, I> = RecordStream<'a, I, RecordMap>;

impl<'a, I> RecordStream<'a, I, RecordTuple>
where
    I: Iterator<Item = Result<String>>,
{
    pub fn tuples(lines: I, extractor: RecordExtractor<'a>) -> Self {
        Self::with_decoder(lines, extractor, RecordExtractor::decode_tuple)
    }
}

impl<'a, I> RecordStream<'a, I, RecordMap>
where
    I: Iterator<Item = Result<String>>,
{
    pub fn maps(lines: I, extractor: RecordExtractor<'a>) -> Self {
        Self::with_decoder(lines, extractor, RecordExtractor::decode_map)
    }
}

impl<'a, I, R> RecordStream<'a, I, R>
where
    I: Iterator<Item = Result<String>>,
{
    fn with_decoder(lines: I, extractor: RecordExtractor<'a>, decode: DecodeFn<'a, R>) -> Self {
        Self {
            lines,
            extractor,
            decode,
            policy: ErrorPolicy::default(),
            stats: StreamStats::default(),
            done: false,
        }
    }

    /// Choose what happens to lines that fail to decode
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn extractor(&self) -> &RecordExtractor<'a> {
        &self.extractor
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn into_stats(self) -> StreamStats {
        self.stats
    }
}

impl<'a, I, R> Iterator for RecordStream<'a, I, R>
where
    I: Iterator<Item = Result<String>>,
{
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    debug!(
                        "Record type {}: {} of {} lines decoded, {} skipped",
                        self.extractor.tag(),
                        self.stats.records_decoded,
                        self.stats.lines_read,
                        self.stats.records_skipped
                    );
                    return None;
                }
            };
            self.stats.lines_read += 1;

            if !self.extractor.matches(&line) {
                continue;
            }
            self.stats.records_matched += 1;

            match (self.decode)(&self.extractor, &line) {
                Ok(record) => {
                    self.stats.records_decoded += 1;
                    return Some(Ok(record));
                }
                Err(e) => {
                    let e = e.at_line(self.stats.lines_read);
                    match self.policy {
                        ErrorPolicy::Skip => {
                            warn!("Skipping record: {}", e);
                            self.stats.record_skip(e.to_string());
                        }
                        ErrorPolicy::Fail => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
        None
    }
}

/// Open `path` (`-` for standard input) and stream records of type `tag` as
/// tuples
pub fn stream_tuples(
    path: impl AsRef<Path>,
    tag: &str,
    fields: Option<&[&str]>,
    config: &CatConfig,
) -> Result<TupleStream<'static, LineSource>> {
    let extractor = RecordExtractor::for_tag(tag, fields)?;
    let source = LineSource::open_or_stdin(path, config.encoding)?;
    Ok(RecordStream::tuples(source, extractor).with_error_policy(config.error_policy))
}

/// Open `path` (`-` for standard input) and stream records of type `tag` as
/// maps
pub fn stream_maps(
    path: impl AsRef<Path>,
    tag: &str,
    fields: Option<&[&str]>,
    config: &CatConfig,
) -> Result<MapStream<'static, LineSource>> {
    let extractor = RecordExtractor::for_tag(tag, fields)?;
    let source = LineSource::open_or_stdin(path, config.encoding)?;
    Ok(RecordStream::maps(source, extractor).with_error_policy(config.error_policy))
}

/// Count lines of record type `tag` with a fresh pass over `path`
pub fn count_records(path: impl AsRef<Path>, tag: &str, config: &CatConfig) -> Result<usize> {
    let extractor = RecordExtractor::for_tag(tag, None)?;
    let mut count = 0;
    for line in LineSource::open(path, config.encoding)? {
        if extractor.matches(&line?) {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatError, DecodeError};
    use crate::models::FieldValue;
    use crate::source::TextEncoding;
    use std::io::Cursor;

    fn lines(raw: &[&str]) -> impl Iterator<Item = Result<String>> {
        raw.iter()
            .map(|line| Ok(line.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn header_extractor() -> RecordExtractor<'static> {
        RecordExtractor::for_tag("01", Some(&["tipo_registro", "tipo_entidad_generadora"])).unwrap()
    }

    #[test]
    fn test_filters_mixed_record_types_in_order() {
        let stream = RecordStream::tuples(lines(&["01A", "11B", "01C"]), header_extractor());
        let records: Vec<_> = stream.map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0][1], FieldValue::Text("A".to_string()));
        assert_eq!(records[1][1], FieldValue::Text("C".to_string()));
    }

    #[test]
    fn test_map_stream_yields_named_fields() {
        let stream = RecordStream::maps(lines(&["11X", "01G"]), header_extractor());
        let records: Vec<_> = stream.map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("tipo_entidad_generadora"),
            Some(&FieldValue::Text("G".to_string()))
        );
    }

    #[test]
    fn test_skip_policy_drops_bad_lines_and_counts_them() {
        // second header line is too short for tipo_entidad_generadora
        let mut stream = RecordStream::tuples(lines(&["01A", "01", "11Z", "01C"]), header_extractor())
            .with_error_policy(ErrorPolicy::Skip);

        let records: Vec<_> = stream.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);

        let stats = stream.stats();
        assert_eq!(stats.lines_read, 4);
        assert_eq!(stats.records_matched, 3);
        assert_eq!(stats.records_decoded, 2);
        assert_eq!(stats.records_skipped, 1);
        assert!(stats.errors[0].contains("line 2"));
    }

    #[test]
    fn test_fail_policy_stops_at_first_bad_line() {
        let mut stream = RecordStream::tuples(lines(&["01A", "01", "01C"]), header_extractor())
            .with_error_policy(ErrorPolicy::Fail);

        assert!(stream.next().unwrap().is_ok());
        match stream.next() {
            Some(Err(CatError::Decode { line, source, .. })) => {
                assert_eq!(line, 2);
                assert!(matches!(source, DecodeError::OutOfBounds { .. }));
            }
            other => panic!("Expected decode error, got {:?}", other),
        }
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_io_errors_end_the_stream() {
        let source = vec![
            Ok("01A".to_string()),
            Err(CatError::Io(std::io::Error::other("disk gone"))),
            Ok("01B".to_string()),
        ];
        let mut stream = RecordStream::tuples(source.into_iter(), header_extractor());

        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(stream.next(), Some(Err(CatError::Io(_)))));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_empty_source() {
        let mut stream = RecordStream::tuples(lines(&[]), header_extractor());
        assert!(stream.next().is_none());
        assert_eq!(stream.stats().lines_read, 0);
    }

    #[test]
    fn test_streams_from_an_in_memory_reader() {
        let input = Cursor::new(b"01A\r\n11B\r\n01\xc7\r\n".to_vec());
        let source = LineSource::from_reader(input, "<stdin>", TextEncoding::Latin1);
        let mut stream = RecordStream::tuples(source, header_extractor());

        let records: Vec<_> = stream.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][1], FieldValue::Text("A".to_string()));
        assert_eq!(records[1][1], FieldValue::Text("Ç".to_string()));
        assert_eq!(stream.stats().lines_read, 3);
    }
}
