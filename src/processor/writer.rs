//! Table writing for converted CAT records
//!
//! Writes decoded DataFrames to Parquet (with the configured compression,
//! statistics and row group size) or to CSV.

use crate::config::{OutputConfig, OutputFormat};
use crate::error::{CatError, Result};

use polars::prelude::{CsvWriter, DataFrame, ParquetWriter, SerWriter, StatisticsOptions};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer for decoded record tables
#[derive(Debug, Clone)]
pub struct TableWriter {
    config: OutputConfig,
}

impl TableWriter {
    /// Create a new table writer
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Output file for one record type of one input: `<dir>/<stem>_<tag>.<ext>`
    pub fn output_path(&self, output_dir: &Path, stem: &str, tag: &str) -> PathBuf {
        output_dir.join(format!("{}_{}.{}", stem, tag, self.config.format.extension()))
    }

    /// Write `df` to `path`, returning the number of rows written
    pub fn write(&self, df: &mut DataFrame, path: &Path) -> Result<usize> {
        if path.exists() && !self.config.overwrite {
            return Err(CatError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: "output file already exists (enable overwrite to replace it)".to_string(),
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.config.format {
            OutputFormat::Parquet => self.write_parquet(df, path)?,
            OutputFormat::Csv => self.write_csv(df, path)?,
        }

        debug!(
            "Wrote {} rows x {} columns to {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df.height())
    }

    fn write_parquet(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let statistics = if self.config.enable_statistics {
            StatisticsOptions::full()
        } else {
            StatisticsOptions::empty()
        };

        ParquetWriter::new(file)
            .with_compression(self.config.compression.to_polars_compression())
            .with_statistics(statistics)
            .with_row_group_size(self.config.row_group_size)
            .finish(df)
            .map_err(|e| CatError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write parquet: {}", e),
            })?;
        Ok(())
    }

    fn write_csv(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| CatError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write csv: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionAlgorithm;
    use polars::prelude::{Column, NamedFrom, Series};
    use tempfile::TempDir;

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::from(Series::new("parcela_catastral".into(), vec!["1234567VK4713S", "7654321VK4773N"])),
            Column::from(Series::new("numero".into(), vec![Some(12i32), None])),
        ])
        .unwrap()
    }

    #[test]
    fn test_output_path_naming() {
        let writer = TableWriter::new(OutputConfig::default());
        assert_eq!(
            writer.output_path(Path::new("/out"), "28_079_U", "11"),
            PathBuf::from("/out/28_079_U_11.parquet")
        );

        let csv = TableWriter::new(OutputConfig {
            format: OutputFormat::Csv,
            ..Default::default()
        });
        assert_eq!(
            csv.output_path(Path::new("out"), "x", "15"),
            PathBuf::from("out/x_15.csv")
        );
    }

    #[test]
    fn test_write_parquet() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("t_11.parquet");
        let writer = TableWriter::new(OutputConfig {
            compression: CompressionAlgorithm::Zstd,
            row_group_size: Some(1),
            ..Default::default()
        });

        let rows = writer.write(&mut sample_frame(), &path).unwrap();
        assert_eq!(rows, 2);
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t_11.csv");
        let writer = TableWriter::new(OutputConfig {
            format: OutputFormat::Csv,
            ..Default::default()
        });

        writer.write(&mut sample_frame(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("parcela_catastral,numero"));
        assert_eq!(lines.next(), Some("1234567VK4713S,12"));
        assert_eq!(lines.next(), Some("7654321VK4773N,"));
    }

    #[test]
    fn test_existing_output_is_kept_without_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t_11.parquet");
        fs::write(&path, "keep me").unwrap();

        let writer = TableWriter::new(OutputConfig::default());
        match writer.write(&mut sample_frame(), &path) {
            Err(CatError::ProcessingFailed { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("Expected ProcessingFailed, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        let overwriting = TableWriter::new(OutputConfig {
            overwrite: true,
            ..Default::default()
        });
        assert_eq!(overwriting.write(&mut sample_frame(), &path).unwrap(), 2);
    }
}
