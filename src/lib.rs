//! CAT Processor Library
//!
//! A Rust library for decoding the fixed-width interchange files ("CAT"
//! format) published by the Spanish Cadastre (Dirección General del
//! Catastro) and converting their records into typed tables.
//!
//! This library provides tools for:
//! - Decoding field slices into text, integers, decimals, dates and times
//! - Declarative layouts for record types 01, 11, 13, 14, 15, 16 and 17
//! - Reading plain or gzip-compressed files line by line in Latin-1 or UTF-8
//! - Streaming decoded records of one type as tuples or name-keyed maps
//! - Building polars DataFrames and writing them to Parquet or CSV
//!
//! ```no_run
//! use cat_processor::{CatConfig, stream_maps};
//!
//! # fn main() -> cat_processor::Result<()> {
//! let config = CatConfig::default();
//! for record in stream_maps("28_079_U_2024.CAT.gz", "15", None, &config)? {
//!     let record = record?;
//!     println!("{:?}", record.get("parcela_catastral"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod models;
pub mod processor;
pub mod schema;
pub mod source;
pub mod stream;

// Re-export commonly used types
pub use codec::FieldCodec;
pub use config::{CatConfig, ErrorPolicy, OutputConfig, OutputFormat};
pub use error::{CatError, DecodeError, Result};
pub use extractor::RecordExtractor;
pub use models::{FieldValue, ProcessingStats, RecordMap, RecordTuple, StorageType};
pub use processor::CatProcessor;
pub use processor::table::{Table, read_cat, read_cat_as_dataframe, read_cat_presized};
pub use schema::{FieldSpec, RecordSchema, SchemaRegistry};
pub use source::{LineSource, StorageKind, TextEncoding};
pub use stream::{RecordStream, StreamStats, count_records, stream_maps, stream_tuples};
