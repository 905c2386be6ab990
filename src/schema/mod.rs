//! Record schemas and the schema registry.
//!
//! Every CAT record type has a [`RecordSchema`]: the ordered list of named
//! fields with their 1-based offset, width, codec and storage type. Schemas
//! are built once from the declarative tables in [`tables`] and never
//! mutated afterwards; the [`SchemaRegistry`] maps record-type tags to them.

pub mod tables;

use crate::codec::FieldCodec;
use crate::constants::{TAG_LENGTH, record_tags};
use crate::error::{CatError, Result};
use crate::models::StorageType;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

use self::tables::FieldDef;

/// Location and decoding rule of one field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// 1-based offset of the first character
    pub start: usize,
    pub width: usize,
    pub codec: FieldCodec,
    pub storage: StorageType,
}

impl FieldSpec {
    /// 1-based offset of the last character (inclusive)
    pub fn end(&self) -> usize {
        self.start + self.width - 1
    }

    /// 0-based, end-exclusive character window
    pub fn window(&self) -> Range<usize> {
        self.start - 1..self.start - 1 + self.width
    }
}

impl From<&FieldDef> for FieldSpec {
    fn from(def: &FieldDef) -> Self {
        Self {
            name: def.name,
            start: def.start,
            width: def.width,
            codec: def.codec,
            storage: def.storage,
        }
    }
}

/// Ordered, uniquely named field layout of one record type
#[derive(Debug, Clone)]
pub struct RecordSchema {
    tag: &'static str,
    description: &'static str,
    fields: Vec<FieldSpec>,
    index: HashMap<&'static str, usize>,
}

impl RecordSchema {
    /// Build a schema, rejecting invalid offsets and repeated field names
    pub fn new(
        tag: &'static str,
        description: &'static str,
        fields: Vec<FieldSpec>,
    ) -> Result<Self> {
        let definition_error = |reason: String| CatError::SchemaDefinition {
            tag: tag.to_string(),
            reason,
        };

        if tag.chars().count() != TAG_LENGTH {
            return Err(definition_error(format!(
                "tag must be {} characters long",
                TAG_LENGTH
            )));
        }
        if fields.is_empty() {
            return Err(definition_error("schema has no fields".to_string()));
        }

        let mut index = HashMap::with_capacity(fields.len());
        for (position, spec) in fields.iter().enumerate() {
            if spec.start == 0 || spec.width == 0 {
                return Err(definition_error(format!(
                    "field '{}' has offset {} and width {}; both must be at least 1",
                    spec.name, spec.start, spec.width
                )));
            }
            if let Some(previous) = index.insert(spec.name, position) {
                return Err(definition_error(format!(
                    "field '{}' declared twice (at offsets {} and {})",
                    spec.name, fields[previous].start, spec.start
                )));
            }
        }

        Ok(Self {
            tag,
            description,
            fields,
            index,
        })
    }

    fn from_table(
        tag: &'static str,
        description: &'static str,
        table: &[FieldDef],
    ) -> Result<Self> {
        Self::new(tag, description, table.iter().map(FieldSpec::from).collect())
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Shortest line length that covers every field
    pub fn max_line_length(&self) -> usize {
        self.fields.iter().map(FieldSpec::end).max().unwrap_or(0)
    }
}

/// Record-type tag -> schema lookup
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, RecordSchema>,
}

static GLOBAL_REGISTRY: OnceLock<std::result::Result<SchemaRegistry, String>> = OnceLock::new();

impl SchemaRegistry {
    /// Build the registry from the static CAT tables
    pub fn try_build() -> Result<Self> {
        let definitions: [(&'static str, &'static str, &[FieldDef]); 7] = [
            (record_tags::HEADER, "header", tables::HEADER),
            (record_tags::PARCEL, "parcel", tables::PARCEL),
            (
                record_tags::CONSTRUCTION_UNIT,
                "construction unit",
                tables::CONSTRUCTION_UNIT,
            ),
            (
                record_tags::CONSTRUCTION,
                "construction",
                tables::CONSTRUCTION,
            ),
            (
                record_tags::REAL_ESTATE,
                "real-estate asset",
                tables::REAL_ESTATE,
            ),
            (
                record_tags::COMMON_ELEMENTS,
                "common-element apportionment",
                tables::COMMON_ELEMENTS,
            ),
            (record_tags::CROPS, "crops / land use", tables::CROPS),
        ];

        let mut schemas = HashMap::with_capacity(definitions.len());
        for (tag, description, table) in definitions {
            let schema = RecordSchema::from_table(tag, description, table)?;
            debug!(
                "Registered record type {} ({}) with {} fields",
                tag,
                description,
                schema.len()
            );
            schemas.insert(tag, schema);
        }

        Ok(Self { schemas })
    }

    /// Process-wide registry, built on first use
    pub fn global() -> Result<&'static SchemaRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Self::try_build().map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|reason| CatError::SchemaDefinition {
                tag: "*".to_string(),
                reason: reason.clone(),
            })
    }

    /// Schema for a record-type tag
    pub fn get(&self, tag: &str) -> Result<&RecordSchema> {
        self.schemas
            .get(tag)
            .ok_or_else(|| CatError::UnknownRecordType {
                tag: tag.to_string(),
            })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.schemas.contains_key(tag)
    }

    /// Supported tags in format order
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.schemas.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordSchema> {
        self.tags().into_iter().filter_map(|tag| self.schemas.get(tag))
    }
}
