//! Command-line argument definitions for the CAT processor
//!
//! Defines the CLI surface with the clap derive API. Options shared by every
//! subcommand (configuration file, decoding options, verbosity) live in
//! [`CommonArgs`] and are flattened into each subcommand.

use crate::config::{CatConfig, CompressionAlgorithm, ErrorPolicy, OutputFormat};
use crate::constants::DEFAULT_INSPECT_LIMIT;
use crate::source::TextEncoding;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the CAT processor
///
/// Decodes Spanish Cadastre (Catastro) CAT interchange files and converts
/// their records into Parquet or CSV tables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cat-processor",
    version,
    about = "Decode Catastro CAT fixed-width files and convert them to Parquet or CSV",
    long_about = "Reads Spanish Cadastre (Catastro) CAT interchange files, plain or gzip \
                  compressed, decodes the fixed-width records of each type (parcels, \
                  construction units, constructions, real-estate assets, common elements, \
                  crops) and writes one typed table per file and record type."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert CAT files to Parquet or CSV tables (main command)
    Convert(ConvertArgs),
    /// Count the records of each type in a CAT file
    Count(CountArgs),
    /// Print the first decoded records of one type
    Inspect(InspectArgs),
    /// Show the field layout of the supported record types
    Schema(SchemaArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Parser)]
pub struct CommonArgs {
    /// Path to configuration file
    ///
    /// TOML file with decoding and output settings. Falls back to the file
    /// named by CAT_PROCESSOR_CONFIG, then to built-in defaults.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Character encoding of the input files (latin1, utf8)
    #[arg(long = "encoding", value_name = "ENCODING")]
    pub encoding: Option<TextEncoding>,

    /// What to do with records that fail to decode (skip, fail)
    #[arg(long = "error-policy", value_name = "POLICY")]
    pub error_policy: Option<ErrorPolicy>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl CommonArgs {
    /// Get log level based on verbosity settings
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Load the configuration file and apply the decoding overrides
    pub fn load_config(&self) -> Result<CatConfig> {
        let mut config = CatConfig::load(self.config_file.as_deref())
            .context("Failed to load configuration")?;

        if let Some(encoding) = self.encoding {
            config = config.with_encoding(encoding);
        }
        if let Some(policy) = self.error_policy {
            config = config.with_error_policy(policy);
        }
        Ok(config)
    }
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// CAT file or directory of CAT files (*.cat, *.cat.gz)
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Output directory for the generated tables
    ///
    /// Tables are named <file-stem>_<record-type>.<format>, e.g.
    /// 28_079_U_2024_15.parquet. Created if it doesn't exist.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = "output",
        help = "Output directory for generated tables"
    )]
    pub output_dir: PathBuf,

    /// Record types to convert (comma-separated, e.g. 11,13,15)
    #[arg(
        short = 't',
        long = "tags",
        value_name = "LIST",
        value_delimiter = ',',
        help = "Comma-separated list of record types to convert"
    )]
    pub tags: Vec<String>,

    /// Output table format (parquet, csv)
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long = "compression", value_name = "ALGORITHM")]
    pub compression: Option<CompressionAlgorithm>,

    /// Rows per parquet row group
    #[arg(long = "row-group-size", value_name = "ROWS")]
    pub row_group_size: Option<usize>,

    /// Skip parquet column statistics
    #[arg(long = "no-statistics")]
    pub no_statistics: bool,

    /// Force overwrite of existing output files
    #[arg(long = "force", help = "Force overwrite of existing output files")]
    pub force_overwrite: bool,

    /// Count records first and build fixed-size tables (reads each file twice)
    #[arg(long = "presize")]
    pub presize: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ConvertArgs {
    /// Build the effective configuration: file, then command-line flags
    pub fn to_config(&self) -> Result<CatConfig> {
        let mut config = self.common.load_config()?;

        if !self.tags.is_empty() {
            config = config.with_record_types(self.tags.clone());
        }
        if self.presize {
            config = config.with_presized_tables();
        }

        let mut output = config.output.clone();
        if let Some(format) = self.format {
            output.format = format;
        }
        if let Some(compression) = self.compression {
            output.compression = compression;
        }
        if self.row_group_size.is_some() {
            output.row_group_size = self.row_group_size;
        }
        if self.no_statistics {
            output.enable_statistics = false;
        }
        if self.force_overwrite {
            output.overwrite = true;
        }

        let config = config.with_output(output);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Arguments for the count command
#[derive(Debug, Clone, Parser)]
pub struct CountArgs {
    /// CAT file to scan (`-` for standard input)
    #[arg(value_name = "FILE")]
    pub input_path: PathBuf,

    /// Only report these record types (comma-separated)
    #[arg(short = 't', long = "tags", value_name = "LIST", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: ReportFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// CAT file to read (`-` for standard input)
    #[arg(value_name = "FILE")]
    pub input_path: PathBuf,

    /// Record type to decode (e.g. 15)
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Fields to decode, in output order (comma-separated; default: all)
    #[arg(long = "fields", value_name = "LIST", value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Maximum number of records to print
    #[arg(short = 'n', long = "limit", value_name = "COUNT", default_value_t = DEFAULT_INSPECT_LIMIT)]
    pub limit: usize,

    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: ReportFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl InspectArgs {
    /// Requested field names, or None for every field
    pub fn field_names(&self) -> Option<Vec<&str>> {
        (!self.fields.is_empty()).then(|| self.fields.iter().map(String::as_str).collect())
    }
}

/// Arguments for the schema command
#[derive(Debug, Clone, Parser)]
pub struct SchemaArgs {
    /// Record type to describe (default: list all record types)
    #[arg(value_name = "TAG")]
    pub tag: Option<String>,

    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: ReportFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Output format options for results printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable output
    Human,
    /// JSON output (one document per record for inspect)
    Json,
}
