//! Command implementations for the CAT processor CLI
//!
//! Each subcommand sets up logging, builds its configuration and reports its
//! results on stdout. Errors are returned with context for `main` to print.

use crate::cli::args::{
    Args, Commands, CommonArgs, ConvertArgs, CountArgs, InspectArgs, ReportFormat, SchemaArgs,
};
use crate::constants::record_tags;
use crate::extractor::line_tag;
use crate::processor::CatProcessor;
use crate::schema::{RecordSchema, SchemaRegistry};
use crate::source::LineSource;
use crate::stream::stream_maps;
use anyhow::{Context, Result, bail};
use colored::*;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Main command runner
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Count(args)) => run_count(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Schema(args)) => run_schema(args),
        None => bail!("No command given"),
    }
}

/// Convert CAT files to tables
fn run_convert(args: ConvertArgs) -> Result<()> {
    setup_logging(&args.common)?;
    debug!("Command line arguments: {:?}", args);

    let config = args.to_config()?;
    debug!("Effective configuration: {:?}", config);

    let processor = CatProcessor::new(args.input_path.clone(), args.output_dir.clone())
        .with_context(|| format!("Cannot read input {}", args.input_path.display()))?
        .with_config(config)
        .with_progress(args.common.show_progress());

    let stats = processor.process().context("Conversion failed")?;
    info!(
        "Converted {} files ({} failed), {} records in {}ms",
        stats.files_processed, stats.files_failed, stats.total_records, stats.processing_time_ms
    );

    if stats.files_failed > 0 {
        bail!(
            "{} of {} files could not be converted",
            stats.files_failed,
            stats.files_failed + stats.files_processed
        );
    }
    Ok(())
}

/// Count records per record type in a single pass
fn run_count(args: CountArgs) -> Result<()> {
    setup_logging(&args.common)?;
    let config = args.common.load_config()?;
    let registry = SchemaRegistry::global()?;

    let source = LineSource::open_or_stdin(&args.input_path, config.encoding)
        .with_context(|| format!("Cannot open {}", args.input_path.display()))?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut lines = 0usize;
    for line in source {
        let line = line.with_context(|| format!("Failed reading {}", args.input_path.display()))?;
        lines += 1;
        if let Some(tag) = line_tag(&line) {
            *counts.entry(tag.to_string()).or_default() += 1;
        }
    }
    debug!("Scanned {} lines of {}", lines, args.input_path.display());

    if !args.tags.is_empty() {
        counts.retain(|tag, _| args.tags.contains(tag));
        for tag in &args.tags {
            counts.entry(tag.clone()).or_default();
        }
    }

    match args.output_format {
        ReportFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "file": args.input_path.display().to_string(),
                    "lines": lines,
                    "records": counts,
                }))?
            );
        }
        ReportFormat::Human => {
            println!(
                "{} {}",
                "Record counts for".bright_green().bold(),
                args.input_path.display()
            );
            for (tag, count) in &counts {
                let description = registry
                    .get(tag)
                    .map(RecordSchema::description)
                    .unwrap_or("unsupported record type");
                println!(
                    "  {} {}  {}",
                    tag.bright_cyan(),
                    format!("{:>10}", count).bright_white().bold(),
                    description.bright_black()
                );
            }
            println!("  {} {}", "Lines:".bright_cyan(), lines);
        }
    }
    Ok(())
}

/// Print the first records of one type
fn run_inspect(args: InspectArgs) -> Result<()> {
    setup_logging(&args.common)?;
    let config = args.common.load_config()?;

    let fields = args.field_names();
    let records = stream_maps(&args.input_path, &args.tag, fields.as_deref(), &config)
        .with_context(|| {
            format!(
                "Cannot read record type {} from {}",
                args.tag,
                args.input_path.display()
            )
        })?;

    let mut shown = 0;
    for record in records.take(args.limit) {
        let record = record.context("Failed to decode record")?;
        shown += 1;

        match args.output_format {
            ReportFormat::Json => println!("{}", serde_json::to_string(&record)?),
            ReportFormat::Human => {
                println!("{}", format!("Record {}", shown).bright_green().bold());
                let width = record.keys().map(|k| k.chars().count()).max().unwrap_or(0);
                for (name, value) in record.iter() {
                    let shown_value = if value.is_null() {
                        "null".bright_black().to_string()
                    } else {
                        value.to_string()
                    };
                    let name = format!("{:<width$}", name, width = width);
                    println!("  {}  {}", name.bright_cyan(), shown_value);
                }
            }
        }
    }

    if shown == 0 && args.output_format == ReportFormat::Human {
        println!("{}", format!("No records of type {}", args.tag).bright_yellow());
    }
    Ok(())
}

/// Describe record layouts
fn run_schema(args: SchemaArgs) -> Result<()> {
    setup_logging(&args.common)?;
    let registry = SchemaRegistry::global()?;

    let Some(tag) = &args.tag else {
        match args.output_format {
            ReportFormat::Json => {
                let listing: Vec<_> = record_tags::ALL
                    .iter()
                    .filter_map(|tag| registry.get(tag).ok())
                    .map(|schema| {
                        json!({
                            "tag": schema.tag(),
                            "description": schema.description(),
                            "fields": schema.len(),
                            "line_length": schema.max_line_length(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
            ReportFormat::Human => {
                println!("{}", "Supported record types".bright_green().bold());
                for tag in record_tags::ALL {
                    let schema = registry.get(tag)?;
                    println!(
                        "  {}  {:<45} {:>3} fields, {} characters",
                        schema.tag().bright_cyan(),
                        schema.description(),
                        schema.len(),
                        schema.max_line_length()
                    );
                }
            }
        }
        return Ok(());
    };

    let schema = registry.get(tag)?;
    match args.output_format {
        ReportFormat::Json => {
            let fields: Vec<_> = schema
                .fields()
                .iter()
                .map(|spec| {
                    json!({
                        "name": spec.name,
                        "start": spec.start,
                        "width": spec.width,
                        "codec": spec.codec.to_string(),
                        "storage": spec.storage.to_string(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "tag": schema.tag(),
                    "description": schema.description(),
                    "fields": fields,
                }))?
            );
        }
        ReportFormat::Human => {
            println!(
                "{} {}",
                schema.tag().bright_green().bold(),
                schema.description().bright_green()
            );
            println!(
                "  {:<40} {:>5} {:>5}  {:<14} {}",
                "field", "start", "width", "codec", "storage"
            );
            for spec in schema.fields() {
                println!(
                    "  {:<40} {:>5} {:>5}  {:<14} {}",
                    spec.name,
                    spec.start,
                    spec.width,
                    spec.codec.to_string(),
                    spec.storage
                );
            }
        }
    }
    Ok(())
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cat_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialise logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialise logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}
