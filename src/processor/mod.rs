//! Conversion pipeline for CAT files.
//!
//! Orchestrates the workflow from input discovery through table building to
//! writing one output table per input file and record type.

pub mod discovery;
pub mod table;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{
    discovery::{FileDiscovery, cat_file_stem},
    table::read_cat,
    writer::TableWriter,
};

use crate::config::{CatConfig, ErrorPolicy};
use crate::error::{CatError, Result};
use crate::models::ProcessingStats;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of converting one input file
#[derive(Debug, Default)]
struct FileOutcome {
    records: usize,
    skipped: usize,
    outputs: Vec<PathBuf>,
}

/// Main processor for CAT to table conversion
#[derive(Debug)]
pub struct CatProcessor {
    input_path: PathBuf,
    output_dir: PathBuf,
    config: CatConfig,
    file_discovery: FileDiscovery,
    writer: TableWriter,
    show_progress: bool,
}

impl CatProcessor {
    /// Create a new processor reading `input_path` (file or directory)
    pub fn new(input_path: PathBuf, output_dir: PathBuf) -> Result<Self> {
        if !input_path.exists() {
            return Err(CatError::NotFound { path: input_path });
        }

        let config = CatConfig::default();
        Ok(Self {
            file_discovery: FileDiscovery::new(input_path.clone()),
            writer: TableWriter::new(config.output.clone()),
            input_path,
            output_dir,
            config,
            show_progress: false,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: CatConfig) -> Self {
        self.writer = TableWriter::new(config.output.clone());
        self.config = config;
        self
    }

    /// Show console output and a progress bar while converting
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Main processing entry point
    pub fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;

        if self.show_progress {
            println!("{}", "Starting CAT conversion".bright_green().bold());
            println!("  {} {}", "Input:".bright_cyan(), self.input_path.display());
            println!("  {} {}", "Output:".bright_cyan(), self.output_dir.display());
            println!(
                "  {} {}",
                "Record types:".bright_cyan(),
                self.config.record_types.join(", ")
            );
        }

        let files = self.file_discovery.discover_cat_files()?;
        info!("Found {} CAT files under {}", files.len(), self.input_path.display());

        let mut stats = ProcessingStats::default();
        if files.is_empty() {
            if self.show_progress {
                println!("  {}", "No CAT files found".bright_yellow());
            }
            stats.processing_time_ms = start_time.elapsed().as_millis();
            return Ok(stats);
        }

        let pb = self.progress_bar(files.len());

        for path in &files {
            if let Some(name) = path.file_name() {
                pb.set_message(format!("Converting: {}", name.to_string_lossy()));
            }

            match self.convert_file(path) {
                Ok(outcome) => {
                    stats.files_processed += 1;
                    stats.total_records += outcome.records;
                    stats.records_skipped += outcome.skipped;
                    stats.outputs.extend(outcome.outputs);
                }
                Err(e) if self.config.error_policy == ErrorPolicy::Fail => {
                    pb.abandon_with_message("Conversion failed");
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to convert {}: {}", path.display(), e);
                    stats.files_failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message("All CAT files converted");

        stats.processing_time_ms = start_time.elapsed().as_millis();
        if self.show_progress {
            print_summary(&stats);
        }
        Ok(stats)
    }

    /// Convert every configured record type of one file
    fn convert_file(&self, path: &Path) -> Result<FileOutcome> {
        let stem = cat_file_stem(path);
        let mut outcome = FileOutcome::default();

        for tag in &self.config.record_types {
            let mut table = read_cat(path, tag, None, &self.config)?;
            outcome.skipped += table.stats.records_skipped;

            if table.height() == 0 {
                debug!("No records of type {} in {}", tag, path.display());
                continue;
            }

            let output = self.writer.output_path(&self.output_dir, &stem, tag);
            outcome.records += self.writer.write(&mut table.frame, &output)?;
            outcome.outputs.push(output);
        }

        Ok(outcome)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    if stats.records_skipped > 0 {
        println!(
            "  {} {}",
            "Records skipped:".bright_yellow(),
            stats.records_skipped.to_string().bright_yellow()
        );
    }
    println!(
        "  {} {}",
        "Records written:".bright_cyan(),
        stats.total_records.to_string().bright_white().bold()
    );
    for output in &stats.outputs {
        println!("    {}", output.display());
    }
}
