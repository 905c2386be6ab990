//! Record matching and field extraction.
//!
//! A [`RecordExtractor`] is bound to one [`RecordSchema`] and an ordered
//! selection of its fields. It recognises lines of its record type and
//! decodes them into a tuple or a name-keyed map.

use crate::constants::TAG_LENGTH;
use crate::error::{CatError, DecodeError, Result};
use crate::models::{FieldValue, RecordMap, RecordTuple, StorageType};
use crate::schema::{FieldSpec, RecordSchema, SchemaRegistry};
use std::collections::HashSet;

/// Decoder for one record type and field selection
#[derive(Debug, Clone)]
pub struct RecordExtractor<'a> {
    schema: &'a RecordSchema,
    selected: Vec<&'a FieldSpec>,
}

impl<'a> RecordExtractor<'a> {
    /// Bind to `schema`, selecting `fields` in the given order or every field
    /// in declaration order when `None`
    pub fn new(schema: &'a RecordSchema, fields: Option<&[&str]>) -> Result<Self> {
        let selected = match fields {
            None => schema.fields().iter().collect(),
            Some(names) => {
                let mut seen = HashSet::with_capacity(names.len());
                let mut selected = Vec::with_capacity(names.len());
                for name in names {
                    let spec = schema.field(name).ok_or_else(|| CatError::FieldNotFound {
                        tag: schema.tag().to_string(),
                        field: name.to_string(),
                    })?;
                    if !seen.insert(spec.name) {
                        return Err(CatError::SchemaDefinition {
                            tag: schema.tag().to_string(),
                            reason: format!("field '{}' requested more than once", name),
                        });
                    }
                    selected.push(spec);
                }
                selected
            }
        };

        Ok(Self { schema, selected })
    }

    pub fn schema(&self) -> &'a RecordSchema {
        self.schema
    }

    pub fn tag(&self) -> &'static str {
        self.schema.tag()
    }

    /// Selected field names, in output order
    pub fn columns(&self) -> Vec<&'static str> {
        self.selected.iter().map(|spec| spec.name).collect()
    }

    /// Storage types of the selected fields, in output order
    pub fn storage_types(&self) -> Vec<StorageType> {
        self.selected.iter().map(|spec| spec.storage).collect()
    }

    pub fn selected_fields(&self) -> &[&'a FieldSpec] {
        &self.selected
    }

    /// True when the line starts with this extractor's record-type tag
    pub fn matches(&self, line: &str) -> bool {
        line.starts_with(self.schema.tag())
    }

    /// Decode a line into values ordered like [`columns`](Self::columns).
    /// Lines of another record type produce an empty tuple.
    pub fn decode_tuple(&self, line: &str) -> Result<RecordTuple> {
        let mut values = Vec::with_capacity(self.selected.len());
        if self.matches(line) {
            self.decode_each(line, |_, value| values.push(value))?;
        }
        Ok(values)
    }

    /// Decode a line into a map keyed by field name.
    /// Lines of another record type produce an empty map.
    pub fn decode_map(&self, line: &str) -> Result<RecordMap> {
        let mut map = RecordMap::with_capacity(self.selected.len());
        if self.matches(line) {
            self.decode_each(line, |name, value| map.push(name, value))?;
        }
        Ok(map)
    }

    fn decode_each(
        &self,
        line: &str,
        mut emit: impl FnMut(&'static str, FieldValue),
    ) -> Result<()> {
        let view = LineView::new(line);
        for spec in &self.selected {
            let value = view
                .slice(spec)
                .and_then(|raw| spec.codec.decode(raw))
                .map_err(|source| CatError::Decode {
                    tag: self.schema.tag().to_string(),
                    field: spec.name.to_string(),
                    line: 0,
                    source,
                })?;
            emit(spec.name, value);
        }
        Ok(())
    }
}

impl RecordExtractor<'static> {
    /// Extractor over the process-wide schema registry
    pub fn for_tag(tag: &str, fields: Option<&[&str]>) -> Result<Self> {
        let schema = SchemaRegistry::global()?.get(tag)?;
        Self::new(schema, fields)
    }
}

/// Character-indexed view of a line. ASCII lines are sliced by byte.
struct LineView<'l> {
    line: &'l str,
    /// Byte offset of every character plus the end of the line, for non-ASCII lines
    boundaries: Option<Vec<usize>>,
}

impl<'l> LineView<'l> {
    fn new(line: &'l str) -> Self {
        let boundaries = if line.is_ascii() {
            None
        } else {
            let mut offsets: Vec<usize> = line.char_indices().map(|(i, _)| i).collect();
            offsets.push(line.len());
            Some(offsets)
        };
        Self { line, boundaries }
    }

    fn char_len(&self) -> usize {
        match &self.boundaries {
            None => self.line.len(),
            Some(offsets) => offsets.len() - 1,
        }
    }

    fn slice(&self, spec: &FieldSpec) -> std::result::Result<&'l str, DecodeError> {
        let window = spec.window();
        let line_length = self.char_len();
        if window.end > line_length {
            return Err(DecodeError::OutOfBounds {
                start: spec.start,
                width: spec.width,
                line_length,
            });
        }

        Ok(match &self.boundaries {
            None => &self.line[window],
            Some(offsets) => &self.line[offsets[window.start]..offsets[window.end]],
        })
    }
}

/// Record-type tag of a line, if it is long enough to carry one
pub fn line_tag(line: &str) -> Option<&str> {
    let end = line.char_indices().nth(TAG_LENGTH).map_or(line.len(), |(i, _)| i);
    (line[..end].chars().count() == TAG_LENGTH).then(|| &line[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::record_tags;

    /// Line of `length` spaces with `(1-based offset, text)` pieces written in
    fn fixed_line(length: usize, pieces: &[(usize, &str)]) -> String {
        let mut chars: Vec<char> = vec![' '; length];
        for (start, text) in pieces {
            for (i, c) in text.chars().enumerate() {
                chars[start - 1 + i] = c;
            }
        }
        chars.into_iter().collect()
    }

    fn parcel_line() -> String {
        fixed_line(
            1000,
            &[
                (1, "11"),
                (24, "28"),
                (26, "079"),
                (31, "1234567VK4713S"),
                (53, "MADRID"),
                (78, "900"),
                (164, "CALLE DE ALCALÁ"),
                (189, "0012"),
                (193, "B"),
                (199, "01250"),
                (296, "0000012345"),
                (334, "440123456"),
                (343, "4474123450"),
                (667, "EPSG:25830"),
            ],
        )
    }

    #[test]
    fn test_matches_own_tag_only() {
        for tag in record_tags::ALL {
            let extractor = RecordExtractor::for_tag(tag, None).unwrap();
            assert!(extractor.matches(&format!("{}ABC", tag)));
            for other in record_tags::ALL.iter().filter(|t| *t != tag) {
                assert!(!extractor.matches(&format!("{}ABC", other)));
            }
            assert!(!extractor.matches(""));
        }
    }

    #[test]
    fn test_header_tipo_registro() {
        let extractor = RecordExtractor::for_tag("01", Some(&["tipo_registro"])).unwrap();
        let line = "01ENT...";
        assert!(extractor.matches(line));
        assert_eq!(
            extractor.decode_tuple(line).unwrap(),
            vec![FieldValue::Text("01".to_string())]
        );
    }

    #[test]
    fn test_decode_parcel_fields() {
        let extractor = RecordExtractor::for_tag("11", None).unwrap();
        let record = extractor.decode_map(&parcel_line()).unwrap();

        assert_eq!(record.get("parcela_catastral").unwrap().as_str(), Some("1234567VK4713S"));
        assert_eq!(record.get("codigo_municipio_dgc").unwrap().as_str(), Some("079"));
        assert_eq!(
            record.get("codigo_municipio_dgc_domicilio").unwrap().as_str(),
            Some("900")
        );
        assert_eq!(record.get("nombre_provincia").unwrap().as_str(), Some("MADRID"));
        assert_eq!(record.get("nombre_via").unwrap().as_str(), Some("CALLE DE ALCALÁ"));
        assert_eq!(record.get("numero").unwrap().as_i64(), Some(12));
        assert_eq!(record.get("numero2"), Some(&FieldValue::Null));
        assert_eq!(record.get("letra").unwrap().as_str(), Some("B"));
        assert_eq!(record.get("letra2").unwrap().as_str(), Some(""));
        assert_eq!(record.get("kilometro").unwrap().as_f64(), Some(12.5));
        assert_eq!(record.get("superficie_parcela").unwrap().as_i64(), Some(12345));
        assert_eq!(record.get("srs").unwrap().as_str(), Some("EPSG:25830"));

        let x = record.get("coordenada_x").unwrap().as_f64().unwrap();
        assert!((x - 4401234.56).abs() < 1e-6);
        let y = record.get("coordenada_y").unwrap().as_f64().unwrap();
        assert!((y - 44741234.50).abs() < 1e-6);
    }

    #[test]
    fn test_tuple_and_map_agree() {
        let extractor = RecordExtractor::for_tag(
            "11",
            Some(&["numero", "parcela_catastral", "kilometro", "tipo_registro"]),
        )
        .unwrap();
        let line = parcel_line();

        let tuple = extractor.decode_tuple(&line).unwrap();
        let map = extractor.decode_map(&line).unwrap();

        assert_eq!(map.keys().collect::<Vec<_>>(), extractor.columns());
        assert_eq!(map.into_tuple(), tuple);
    }

    #[test]
    fn test_decoding_is_idempotent() {
        let extractor = RecordExtractor::for_tag("11", None).unwrap();
        let line = parcel_line();
        assert_eq!(
            extractor.decode_tuple(&line).unwrap(),
            extractor.decode_tuple(&line).unwrap()
        );
    }

    #[test]
    fn test_other_record_type_decodes_to_empty() {
        let extractor = RecordExtractor::for_tag("15", None).unwrap();
        assert!(extractor.decode_tuple(&parcel_line()).unwrap().is_empty());
        assert!(extractor.decode_map(&parcel_line()).unwrap().is_empty());
    }

    #[test]
    fn test_short_line_is_out_of_bounds() {
        let extractor = RecordExtractor::for_tag("11", Some(&["srs"])).unwrap();
        let line = fixed_line(600, &[(1, "11")]);

        match extractor.decode_tuple(&line) {
            Err(CatError::Decode { field, source, .. }) => {
                assert_eq!(field, "srs");
                assert_eq!(
                    source,
                    DecodeError::OutOfBounds {
                        start: 667,
                        width: 10,
                        line_length: 600
                    }
                );
            }
            other => panic!("Expected out-of-bounds decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_ascii_lines_are_sliced_by_character() {
        let extractor =
            RecordExtractor::for_tag("11", Some(&["nombre_provincia", "codigo_municipio_dgc_domicilio"]))
                .unwrap();
        let line = fixed_line(700, &[(1, "11"), (53, "A CORUÑA"), (78, "015")]);

        let values = extractor.decode_tuple(&line).unwrap();
        assert_eq!(values[0], FieldValue::Text("A CORUÑA".to_string()));
        assert_eq!(values[1], FieldValue::Text("015".to_string()));
    }

    #[test]
    fn test_malformed_integer_reports_field() {
        let extractor = RecordExtractor::for_tag("11", Some(&["numero"])).unwrap();
        let line = fixed_line(700, &[(1, "11"), (189, "12X4")]);

        match extractor.decode_tuple(&line) {
            Err(CatError::Decode { tag, field, source, .. }) => {
                assert_eq!(tag, "11");
                assert_eq!(field, "numero");
                assert!(matches!(source, DecodeError::InvalidInteger { .. }));
            }
            other => panic!("Expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_fails_at_construction() {
        match RecordExtractor::for_tag("14", Some(&["tipo_registro", "no_such_field"])) {
            Err(CatError::FieldNotFound { tag, field }) => {
                assert_eq!(tag, "14");
                assert_eq!(field, "no_such_field");
            }
            other => panic!("Expected FieldNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_field_request_is_rejected() {
        assert!(RecordExtractor::for_tag("14", Some(&["planta", "planta"])).is_err());
    }

    #[test]
    fn test_unknown_tag_fails_at_construction() {
        assert!(matches!(
            RecordExtractor::for_tag("42", None),
            Err(CatError::UnknownRecordType { .. })
        ));
    }

    #[test]
    fn test_every_schema_decodes_into_its_storage_types() {
        let registry = SchemaRegistry::global().unwrap();
        for schema in registry.iter() {
            let extractor = RecordExtractor::new(schema, None).unwrap();

            // digits everywhere decode under every codec; blanks cover the null path
            let mut digits = "1".repeat(schema.max_line_length());
            digits.replace_range(0..2, schema.tag());
            let blank = format!("{:<width$}", schema.tag(), width = schema.max_line_length());

            for line in [digits, blank] {
                let values = extractor.decode_tuple(&line).unwrap();
                for (spec, value) in extractor.selected_fields().iter().zip(&values) {
                    assert!(
                        spec.storage.accepts(value),
                        "{}.{} produced {:?} for storage {}",
                        schema.tag(),
                        spec.name,
                        value,
                        spec.storage
                    );
                }
            }
        }
    }

    #[test]
    fn test_line_tag() {
        assert_eq!(line_tag("11ABC"), Some("11"));
        assert_eq!(line_tag("1"), None);
        assert_eq!(line_tag("Ñ1x"), Some("Ñ1"));
    }
}
