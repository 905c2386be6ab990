//! Columnar tables built from decoded records
//!
//! Decoded tuples are appended into one typed buffer per selected field and
//! turned into a polars [`DataFrame`] once the stream is exhausted. Column
//! dtypes follow the fields' storage types: text columns keep `""` for blank
//! codes and dates, numeric columns hold nulls for blank numbers.
//!
//! Two strategies are offered:
//! - [`read_cat_as_dataframe`]: single streaming pass, growable columns
//! - [`read_cat_presized`]: count first, then decode into fixed-capacity columns

use crate::config::CatConfig;
use crate::error::{CatError, Result};
use crate::extractor::RecordExtractor;
use crate::models::{FieldValue, RecordTuple, StorageType};
use crate::stream::{RecordStream, StreamStats, count_records};
use crate::source::LineSource;
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decoded table plus the statistics of the pass that produced it
#[derive(Debug)]
pub struct Table {
    pub frame: DataFrame,
    pub stats: StreamStats,
}

impl Table {
    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Polars dtype used to store a field
pub fn polars_dtype(storage: StorageType) -> DataType {
    match storage {
        StorageType::Text(_) => DataType::String,
        StorageType::Int32 => DataType::Int32,
        StorageType::Int64 => DataType::Int64,
        StorageType::Float32 => DataType::Float32,
        StorageType::Float64 => DataType::Float64,
    }
}

/// Column names and dtypes a table built by `extractor` will have
pub fn table_schema(extractor: &RecordExtractor<'_>) -> Vec<(&'static str, DataType)> {
    extractor
        .selected_fields()
        .iter()
        .map(|spec| (spec.name, polars_dtype(spec.storage)))
        .collect()
}

/// Typed values for one column
#[derive(Debug)]
enum ColumnBuffer {
    Text(Vec<Option<String>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
}

impl ColumnBuffer {
    fn with_capacity(storage: StorageType, capacity: usize) -> Self {
        match storage {
            StorageType::Text(_) => ColumnBuffer::Text(Vec::with_capacity(capacity)),
            StorageType::Int32 => ColumnBuffer::Int32(Vec::with_capacity(capacity)),
            StorageType::Int64 => ColumnBuffer::Int64(Vec::with_capacity(capacity)),
            StorageType::Float32 => ColumnBuffer::Float32(Vec::with_capacity(capacity)),
            StorageType::Float64 => ColumnBuffer::Float64(Vec::with_capacity(capacity)),
        }
    }

    /// Append a value, handing it back if the column cannot hold it
    fn push(&mut self, value: FieldValue) -> std::result::Result<(), FieldValue> {
        match (self, value) {
            (ColumnBuffer::Text(values), FieldValue::Text(s)) => values.push(Some(s)),
            (ColumnBuffer::Text(values), FieldValue::Null) => values.push(None),
            (ColumnBuffer::Int32(values), FieldValue::Integer(v)) => match i32::try_from(v) {
                Ok(v) => values.push(Some(v)),
                Err(_) => return Err(FieldValue::Integer(v)),
            },
            (ColumnBuffer::Int32(values), FieldValue::Null) => values.push(None),
            (ColumnBuffer::Int64(values), FieldValue::Integer(v)) => values.push(Some(v)),
            (ColumnBuffer::Int64(values), FieldValue::Null) => values.push(None),
            (ColumnBuffer::Float32(values), FieldValue::Decimal(v)) => values.push(Some(v as f32)),
            (ColumnBuffer::Float32(values), FieldValue::Null) => values.push(None),
            (ColumnBuffer::Float64(values), FieldValue::Decimal(v)) => values.push(Some(v)),
            (ColumnBuffer::Float64(values), FieldValue::Null) => values.push(None),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    fn into_column(self, name: &str) -> Column {
        let series = match self {
            ColumnBuffer::Text(values) => Series::new(name.into(), values),
            ColumnBuffer::Int32(values) => Series::new(name.into(), values),
            ColumnBuffer::Int64(values) => Series::new(name.into(), values),
            ColumnBuffer::Float32(values) => Series::new(name.into(), values),
            ColumnBuffer::Float64(values) => Series::new(name.into(), values),
        };
        Column::from(series)
    }
}

/// Row-wise appender producing a typed DataFrame
#[derive(Debug)]
pub struct TableBuilder {
    tag: &'static str,
    names: Vec<&'static str>,
    storage: Vec<StorageType>,
    columns: Vec<ColumnBuffer>,
    rows: usize,
    capacity: Option<usize>,
}

impl TableBuilder {
    /// Growable table for the extractor's selected fields
    pub fn new(extractor: &RecordExtractor<'_>) -> Self {
        Self::build(extractor, 0, None)
    }

    /// Table that accepts at most `capacity` rows
    pub fn with_fixed_capacity(extractor: &RecordExtractor<'_>, capacity: usize) -> Self {
        Self::build(extractor, capacity, Some(capacity))
    }

    fn build(extractor: &RecordExtractor<'_>, reserve: usize, capacity: Option<usize>) -> Self {
        let storage = extractor.storage_types();
        Self {
            tag: extractor.tag(),
            names: extractor.columns(),
            columns: storage
                .iter()
                .map(|s| ColumnBuffer::with_capacity(*s, reserve))
                .collect(),
            storage,
            rows: 0,
            capacity,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// True when a fixed-capacity table cannot take another row
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|capacity| self.rows >= capacity)
    }

    /// Append one decoded record in column order
    pub fn push_row(&mut self, row: RecordTuple) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(CatError::SchemaDefinition {
                tag: self.tag.to_string(),
                reason: format!(
                    "record has {} values for {} columns",
                    row.len(),
                    self.columns.len()
                ),
            });
        }

        // check the whole row first so columns never get out of step
        if let Some(index) = row
            .iter()
            .zip(&self.storage)
            .position(|(value, storage)| !storage.accepts(value))
        {
            return Err(self.rejected(index, &row[index]));
        }

        for (index, value) in row.into_iter().enumerate() {
            if let Err(rejected) = self.columns[index].push(value) {
                return Err(self.rejected(index, &rejected));
            }
        }
        self.rows += 1;
        Ok(())
    }

    fn rejected(&self, index: usize, value: &FieldValue) -> CatError {
        CatError::SchemaDefinition {
            tag: self.tag.to_string(),
            reason: format!(
                "value {:?} does not fit column '{}' ({})",
                value, self.names[index], self.storage[index]
            ),
        }
    }

    pub fn finish(self) -> Result<DataFrame> {
        let columns = self
            .columns
            .into_iter()
            .zip(&self.names)
            .map(|(buffer, name)| buffer.into_column(name))
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

/// Decode every record of type `tag` in `path` into a DataFrame, one pass
pub fn read_cat_as_dataframe(
    path: impl AsRef<Path>,
    tag: &str,
    fields: Option<&[&str]>,
    config: &CatConfig,
) -> Result<Table> {
    let path = path.as_ref();
    let extractor = RecordExtractor::for_tag(tag, fields)?;
    let source = LineSource::open(path, config.encoding)?;
    let mut builder = TableBuilder::new(&extractor);

    let mut stream = RecordStream::tuples(source, extractor).with_error_policy(config.error_policy);
    for record in stream.by_ref() {
        builder.push_row(record?)?;
    }

    let stats = stream.into_stats();
    debug!(
        "Built {} rows of record type {} from {}",
        builder.rows(),
        tag,
        path.display()
    );
    Ok(Table {
        frame: builder.finish()?,
        stats,
    })
}

/// Two-pass variant: count matching lines, then decode into columns of
/// exactly that capacity
///
/// The passes use independent sources. Fewer records in the second pass
/// truncate the table; more mean the file changed underneath and fail.
pub fn read_cat_presized(
    path: impl AsRef<Path>,
    tag: &str,
    fields: Option<&[&str]>,
    config: &CatConfig,
) -> Result<Table> {
    let path = path.as_ref();
    let extractor = RecordExtractor::for_tag(tag, fields)?;
    let expected = count_records(path, tag, config)?;
    debug!("Counted {} records of type {} in {}", expected, tag, path.display());

    let source = LineSource::open(path, config.encoding)?;
    let mut builder = TableBuilder::with_fixed_capacity(&extractor, expected);

    let mut stream = RecordStream::tuples(source, extractor).with_error_policy(config.error_policy);
    for record in stream.by_ref() {
        let record = record?;
        if builder.is_full() {
            return Err(grew_between_passes(path, expected));
        }
        builder.push_row(record)?;
    }

    if builder.rows() < expected {
        info!(
            "{}: {} of {} counted records decoded, table truncated",
            path.display(),
            builder.rows(),
            expected
        );
    }

    Ok(Table {
        stats: stream.into_stats(),
        frame: builder.finish()?,
    })
}

/// Build a table with the strategy selected in `config`
pub fn read_cat(
    path: impl AsRef<Path>,
    tag: &str,
    fields: Option<&[&str]>,
    config: &CatConfig,
) -> Result<Table> {
    if config.presize_tables {
        read_cat_presized(path, tag, fields, config)
    } else {
        read_cat_as_dataframe(path, tag, fields, config)
    }
}

fn grew_between_passes(path: &Path, expected: usize) -> CatError {
    CatError::ProcessingFailed {
        path: PathBuf::from(path),
        reason: format!(
            "more than the {} counted records found on the second pass; the file changed while reading",
            expected
        ),
    }
}
