//! Configuration management and validation.
//!
//! Provides the decoding options (text encoding, decode-error policy) and the
//! table output settings used by the conversion pipeline. Configuration can
//! be loaded from a TOML file and is then overridden by command-line flags.

use crate::constants::{CONFIG_ENV_VAR, DEFAULT_CONVERT_TAGS};
use crate::error::{CatError, Result};
use crate::schema::SchemaRegistry;
use crate::source::TextEncoding;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// What to do with a line whose fields cannot be decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Drop the record, log a warning and keep streaming
    #[default]
    Skip,
    /// Stop the stream with the decode error
    Fail,
}

impl FromStr for ErrorPolicy {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(ErrorPolicy::Skip),
            "fail" => Ok(ErrorPolicy::Fail),
            other => Err(CatError::Configuration {
                message: format!("Unknown error policy: {} (expected skip or fail)", other),
            }),
        }
    }
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }

    /// Parse the command-line spelling
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(CatError::Configuration {
                message: format!("Unknown compression algorithm: {}", other),
            }),
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Table file format written by the converter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(CatError::Configuration {
                message: format!("Unknown output format: {}", other),
            }),
        }
    }
}

/// Output settings for converted tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Parquet compression algorithm
    pub compression: CompressionAlgorithm,

    /// Write column statistics into parquet files
    pub enable_statistics: bool,

    /// Rows per parquet row group (None = polars default)
    pub row_group_size: Option<usize>,

    /// Replace existing output files
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Parquet,
            compression: CompressionAlgorithm::Snappy,
            enable_statistics: true,
            row_group_size: None,
            overwrite: false,
        }
    }
}

/// Global configuration for CAT processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatConfig {
    /// Character encoding of input files
    pub encoding: TextEncoding,

    /// Handling of lines that fail to decode
    pub error_policy: ErrorPolicy,

    /// Record types converted when none are requested explicitly
    pub record_types: Vec<String>,

    /// Count records first and build fixed-capacity tables (two passes)
    pub presize_tables: bool,

    /// Table output settings
    pub output: OutputConfig,
}

impl Default for CatConfig {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Latin1,
            error_policy: ErrorPolicy::Skip,
            record_types: DEFAULT_CONVERT_TAGS.iter().map(|t| t.to_string()).collect(),
            presize_tables: false,
            output: OutputConfig::default(),
        }
    }
}

impl CatConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CatError::NotFound {
                path: path.to_path_buf(),
            },
            _ => CatError::Io(e),
        })?;

        let config: CatConfig = toml::from_str(&content).map_err(|e| CatError::Configuration {
            message: format!("Invalid configuration file {}: {}", path.display(), e),
        })?;

        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file, the file named by the environment, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let registry = SchemaRegistry::global()?;
        for tag in &self.record_types {
            if !registry.contains(tag) {
                return Err(CatError::Configuration {
                    message: format!("Unknown record type in configuration: '{}'", tag),
                });
            }
        }

        if self.output.row_group_size == Some(0) {
            return Err(CatError::Configuration {
                message: "row_group_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Set the input text encoding
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the decode-error policy
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Set the record types to convert
    pub fn with_record_types(mut self, tags: Vec<String>) -> Self {
        self.record_types = tags;
        self
    }

    /// Enable two-pass, fixed-capacity table building
    pub fn with_presized_tables(mut self) -> Self {
        self.presize_tables = true;
        self
    }

    /// Configure table output settings
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }
}
