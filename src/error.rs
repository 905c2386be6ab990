//! Error handling for CAT decoding operations.
//!
//! Provides error types with context for storage access, schema lookup,
//! field decoding and table conversion failures.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to decode a single field slice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error(
        "field out of bounds: offset {start} width {width} exceeds line of {line_length} characters"
    )]
    OutOfBounds {
        start: usize,
        width: usize,
        line_length: usize,
    },

    #[error("invalid integer: '{raw}'")]
    InvalidInteger { raw: String },

    #[error("invalid decimal: '{raw}'")]
    InvalidDecimal { raw: String },
}

#[derive(Error, Debug)]
pub enum CatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unsupported storage format '.{extension}' for file: {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Unknown record type: '{tag}'")]
    UnknownRecordType { tag: String },

    #[error("Field '{field}' not found in record type {tag}")]
    FieldNotFound { tag: String, field: String },

    #[error("Invalid schema definition for record type {tag}: {reason}")]
    SchemaDefinition { tag: String, reason: String },

    #[error("Decode error in record type {tag}, field '{field}' (line {line}): {source}")]
    Decode {
        tag: String,
        field: String,
        line: usize,
        #[source]
        source: DecodeError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },
}

impl CatError {
    /// Attach a line number to a decode error raised without one.
    pub fn at_line(self, line_number: usize) -> Self {
        match self {
            CatError::Decode {
                tag, field, source, ..
            } => CatError::Decode {
                tag,
                field,
                line: line_number,
                source,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatError>;
