//! Line sourcing from plain or compressed CAT files.
//!
//! A [`LineSource`] owns the open file (and decompressor) for as long as it
//! is iterated and yields decoded text lines on demand. Dropping the source
//! closes the handle, whether iteration finished, failed or was abandoned.

use crate::constants::{
    GZIP_EXTENSION, READ_BUFFER_SIZE, STDIN_LABEL, STDIN_PATH, UNSUPPORTED_EXTENSIONS,
};
use crate::error::{CatError, Result};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Character encoding of the stored text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// ISO-8859-1, the legacy character set of CAT files
    #[default]
    Latin1,
    /// UTF-8; invalid sequences are replaced
    Utf8,
}

impl TextEncoding {
    /// Decode one line of raw bytes
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            other => Err(CatError::Configuration {
                message: format!("Unsupported text encoding: {}", other),
            }),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Latin1 => f.write_str("latin1"),
            TextEncoding::Utf8 => f.write_str("utf8"),
        }
    }
}

/// Storage container of a file, decided by its extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    Plain,
    Gzip,
    Unsupported(String),
}

impl StorageKind {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some(GZIP_EXTENSION) => StorageKind::Gzip,
            Some(ext) if UNSUPPORTED_EXTENSIONS.contains(&ext) => {
                StorageKind::Unsupported(ext.to_string())
            }
            _ => StorageKind::Plain,
        }
    }
}

/// Lazy, single-pass sequence of text lines from one storage location
pub struct LineSource {
    path: PathBuf,
    kind: StorageKind,
    encoding: TextEncoding,
    reader: Box<dyn BufRead>,
    buffer: Vec<u8>,
    line_number: usize,
    // last line ended at '\r'; a following '\n' belongs to it
    after_cr: bool,
    finished: bool,
}

impl LineSource {
    /// Open `path`, failing before any line is read if it is missing or uses
    /// an unsupported container
    pub fn open(path: impl AsRef<Path>, encoding: TextEncoding) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let kind = StorageKind::from_path(path);
        let reader: Box<dyn BufRead> = match &kind {
            StorageKind::Unsupported(extension) => {
                return Err(CatError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension: extension.clone(),
                });
            }
            StorageKind::Gzip => {
                let file = File::open(path)?;
                Box::new(BufReader::with_capacity(
                    READ_BUFFER_SIZE,
                    MultiGzDecoder::new(file),
                ))
            }
            StorageKind::Plain => {
                let file = File::open(path)?;
                Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            }
        };

        debug!(
            "Opened {} ({:?}, {})",
            path.display(),
            kind,
            encoding
        );

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            encoding,
            reader,
            buffer: Vec::with_capacity(1024),
            line_number: 0,
            after_cr: false,
            finished: false,
        })
    }

    /// Wrap an already-open reader, e.g. standard input
    pub fn from_reader(
        reader: impl BufRead + 'static,
        label: impl Into<PathBuf>,
        encoding: TextEncoding,
    ) -> Self {
        Self {
            path: label.into(),
            kind: StorageKind::Plain,
            encoding,
            reader: Box::new(reader),
            buffer: Vec::with_capacity(1024),
            line_number: 0,
            after_cr: false,
            finished: false,
        }
    }

    /// Open `path`, or standard input when `path` is `-`
    pub fn open_or_stdin(path: impl AsRef<Path>, encoding: TextEncoding) -> Result<Self> {
        let path = path.as_ref();
        if path != Path::new(STDIN_PATH) {
            return Self::open(path, encoding);
        }

        debug!("Reading standard input ({})", encoding);
        Ok(Self::from_reader(
            BufReader::with_capacity(READ_BUFFER_SIZE, io::stdin()),
            STDIN_LABEL,
            encoding,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &StorageKind {
        &self.kind
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Number of lines produced so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Next line without its terminator. `\n`, `\r\n` and a lone `\r` all
    /// end a line.
    fn read_line(&mut self) -> Result<Option<String>> {
        self.buffer.clear();

        if self.after_cr {
            self.after_cr = false;
            if self.reader.fill_buf()?.first() == Some(&b'\n') {
                self.reader.consume(1);
            }
        }

        let mut terminated = false;
        while !terminated {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                break;
            }

            let used = match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    self.after_cr = available[end] == b'\r';
                    self.buffer.extend_from_slice(&available[..end]);
                    terminated = true;
                    end + 1
                }
                None => {
                    self.buffer.extend_from_slice(available);
                    available.len()
                }
            };
            self.reader.consume(used);
        }

        if !terminated && self.buffer.is_empty() {
            return Ok(None);
        }

        self.line_number += 1;
        Ok(Some(self.encoding.decode(&self.buffer)))
    }
}

impl Iterator for LineSource {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.finished = true;
                debug!(
                    "Finished {} after {} lines",
                    self.path.display(),
                    self.line_number
                );
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl fmt::Debug for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSource")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("encoding", &self.encoding)
            .field("line_number", &self.line_number)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    fn collect(source: LineSource) -> Vec<String> {
        source.map(|line| line.unwrap()).collect()
    }

    #[test]
    fn test_storage_kind_from_extension() {
        assert_eq!(StorageKind::from_path(Path::new("a.cat")), StorageKind::Plain);
        assert_eq!(StorageKind::from_path(Path::new("a.CAT.GZ")), StorageKind::Gzip);
        assert_eq!(StorageKind::from_path(Path::new("no_extension")), StorageKind::Plain);
        assert_eq!(
            StorageKind::from_path(Path::new("a.cat.bz2")),
            StorageKind::Unsupported("bz2".to_string())
        );
        assert_eq!(
            StorageKind::from_path(Path::new("bundle.ZIP")),
            StorageKind::Unsupported("zip".to_string())
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.cat");

        match LineSource::open(&path, TextEncoding::Latin1) {
            Err(CatError::NotFound { path: reported }) => assert_eq!(reported, path),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_container_fails_before_reading() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.cat.bz2");
        fs::write(&path, "01HEADER\n").unwrap();

        match LineSource::open(&path, TextEncoding::Latin1) {
            Err(CatError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "bz2"),
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_and_gzip_yield_identical_lines() {
        let temp_dir = TempDir::new().unwrap();
        let content = "01HEADER\r\n11PARCEL\n\n15ASSET";

        let plain = temp_dir.path().join("data.cat");
        fs::write(&plain, content).unwrap();

        let gzipped = temp_dir.path().join("data.cat.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&gzipped).unwrap(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let expected = vec!["01HEADER", "11PARCEL", "", "15ASSET"];
        assert_eq!(collect(LineSource::open(&plain, TextEncoding::Latin1).unwrap()), expected);
        assert_eq!(collect(LineSource::open(&gzipped, TextEncoding::Latin1).unwrap()), expected);
    }

    #[test]
    fn test_latin1_decoding() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.cat");
        // "11CORUÑA" in ISO-8859-1
        fs::write(&path, b"11CORU\xd1A\n").unwrap();

        let lines = collect(LineSource::open(&path, TextEncoding::Latin1).unwrap());
        assert_eq!(lines, vec!["11CORUÑA"]);

        let lossy = collect(LineSource::open(&path, TextEncoding::Utf8).unwrap());
        assert_eq!(lossy[0].chars().count(), 8);
    }

    #[test]
    fn test_line_numbers_and_exhaustion() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("three.cat");
        fs::write(&path, "01\n11\n01\n").unwrap();

        let mut source = LineSource::open(&path, TextEncoding::Latin1).unwrap();
        assert_eq!(source.line_number(), 0);
        source.next();
        source.next();
        assert_eq!(source.line_number(), 2);
        assert!(source.next().is_some());
        assert!(source.next().is_none());
        assert!(source.next().is_none());
        assert_eq!(source.line_number(), 3);
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("latin1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("ISO-8859-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("utf-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_lone_carriage_return_ends_a_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mac.cat");
        fs::write(&path, "01HEADER\r11PARCEL\r\r\n15ASSET\r").unwrap();

        let mut source = LineSource::open(&path, TextEncoding::Latin1).unwrap();
        assert_eq!(source.next().unwrap().unwrap(), "01HEADER");
        assert_eq!(source.next().unwrap().unwrap(), "11PARCEL");
        assert_eq!(source.next().unwrap().unwrap(), "");
        assert_eq!(source.next().unwrap().unwrap(), "15ASSET");
        assert!(source.next().is_none());
        assert_eq!(source.line_number(), 4);
    }

    #[test]
    fn test_crlf_split_across_buffer_refills() {
        // one-byte buffer puts '\r' and '\n' in separate fill_buf calls
        let reader = BufReader::with_capacity(1, Cursor::new(b"01A\r\n11B\r\n".to_vec()));
        let source = LineSource::from_reader(reader, "split", TextEncoding::Latin1);
        assert_eq!(collect(source), vec!["01A", "11B"]);
    }

    #[test]
    fn test_from_reader_labels_the_source() {
        let source = LineSource::from_reader(
            Cursor::new(b"01\xd1\n".to_vec()),
            STDIN_LABEL,
            TextEncoding::Latin1,
        );
        assert_eq!(source.path(), Path::new("<stdin>"));
        assert_eq!(source.kind(), &StorageKind::Plain);
        assert_eq!(collect(source), vec!["01Ñ"]);
    }

    #[test]
    fn test_dash_selects_standard_input() {
        let source = LineSource::open_or_stdin("-", TextEncoding::Utf8).unwrap();
        assert_eq!(source.path(), Path::new(STDIN_LABEL));
        assert_eq!(source.encoding(), TextEncoding::Utf8);
        assert_eq!(source.line_number(), 0);

        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.cat");
        match LineSource::open_or_stdin(&missing, TextEncoding::Latin1) {
            Err(CatError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}
