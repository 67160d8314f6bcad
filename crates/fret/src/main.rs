//! Command-line interface for the `fret` ingestion pipeline.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use fret_document::SourceFormat;
use fret_format::parse_file;
use fret_pipeline::{Aggregator, IngestOutput, PipelineConfig, read_scraped_file};

#[derive(Parser)]
#[command(name = "fret")]
#[command(about = "Ingest musical content into uniform chunks for a vector index")]
/// Top-level CLI options.
struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    command: Commands,
}

#[derive(Subcommand)]
/// Supported `fret` subcommands.
enum Commands {
    /// Ingest files and scraped records into chunks
    Ingest {
        /// Files to ingest
        files: Vec<PathBuf>,

        /// Force a format instead of detecting one (tab-file, midi,
        /// ascii-tab, alpha-notation)
        #[arg(long)]
        format: Option<String>,

        /// JSON file of scraped-page records to ingest
        #[arg(long)]
        scraped: Option<PathBuf>,

        /// Write the chunk JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show how fret parses a file
    Inspect {
        /// File to inspect
        file: PathBuf,
    },

    /// List supported formats and their extensions
    Formats,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            files,
            format,
            scraped,
            output,
            config,
        } => cmd_ingest(&files, format.as_deref(), scraped.as_deref(), output.as_deref(), config.as_deref()),
        Commands::Inspect { file } => cmd_inspect(&file),
        Commands::Formats => cmd_formats(),
    }
}

/// Parses a `--format` value into a source format.
fn parse_format(name: &str) -> Option<SourceFormat> {
    match name {
        "tab-file" | "tabfile" => Some(SourceFormat::TabFile),
        "midi" => Some(SourceFormat::Midi),
        "ascii-tab" => Some(SourceFormat::AsciiTab),
        "chord-chart" => Some(SourceFormat::ChordChart),
        "alpha-notation" | "alpha" => Some(SourceFormat::AlphaNotation),
        _ => None,
    }
}

/// Implements the `fret ingest` command.
fn cmd_ingest(
    files: &[PathBuf],
    format: Option<&str>,
    scraped: Option<&Path>,
    output: Option<&Path>,
    config: Option<&Path>,
) -> ExitCode {
    if files.is_empty() && scraped.is_none() {
        eprintln!("error: nothing to ingest (pass files and/or --scraped)");
        return ExitCode::FAILURE;
    }

    let hint = match format {
        Some(name) => match parse_format(name) {
            Some(format) => Some(format),
            None => {
                eprintln!("error: unknown format '{name}' (see 'fret formats')");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let config = match config {
        Some(path) => match PipelineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig::default(),
    };

    let mut aggregator = Aggregator::with_config(&config);
    for file in files {
        aggregator.ingest_file(file, hint);
    }
    if let Some(path) = scraped {
        match read_scraped_file(path) {
            Ok(pages) => aggregator.ingest_scraped(pages),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let result = aggregator.finish();
    let json = match serde_json::to_string_pretty(&result) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("error: failed to serialize output: {e}");
            return ExitCode::FAILURE;
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, json) {
                eprintln!("error: failed to write {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
            print_summary(&result, &mut io::stdout());
        }
        None => {
            println!("{json}");
            print_summary(&result, &mut io::stderr());
        }
    }

    let attempted: u64 = result.tallies.values().map(|t| t.attempted).sum();
    let failed: u64 = result.tallies.values().map(|t| t.failed).sum();
    if attempted > 0 && failed == attempted {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Prints the per-source tally and run totals.
fn print_summary(result: &IngestOutput, out: &mut dyn io::Write) {
    let _ = writeln!(out, "Sources:");
    for (source, tally) in &result.tallies {
        let status = if tally.failed > 0 && tally.succeeded == 0 {
            "failed"
        } else {
            "ok"
        };
        let _ = writeln!(
            out,
            "  {source} [{status}] {} chunk(s)",
            tally.chunks_produced
        );
    }
    let _ = writeln!(
        out,
        "Total: {} chunk(s), {} collision(s) disambiguated, {} empty discarded",
        result.chunks.len(),
        result.collisions,
        result.empty_discarded
    );
}

/// Implements the `fret inspect` command.
fn cmd_inspect(file: &Path) -> ExitCode {
    let outcome = match parse_file(file, None) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for doc in &outcome.documents {
        println!("{} ({})", doc.title, doc.format);
        if !doc.metadata.is_empty() {
            for (key, value) in &doc.metadata {
                println!("  {key}: {value}");
            }
        }
        for section in &doc.sections {
            match &section.instrument {
                Some(instrument) => println!("  [{} @ {instrument}]", section.name),
                None => println!("  [{}]", section.name),
            }
            for unit in &section.units {
                let rendered = unit.render();
                if !rendered.is_empty() {
                    println!("    {rendered}");
                }
            }
        }
    }

    if !outcome.warnings.is_empty() {
        println!("Warnings:");
        for warning in &outcome.warnings {
            println!("  {warning}");
        }
    }

    ExitCode::SUCCESS
}

/// Implements the `fret formats` command.
fn cmd_formats() -> ExitCode {
    println!("Supported formats:");
    println!("  tab-file        .tab.json          structured tab container");
    println!("  midi            .mid, .midi        standard MIDI files");
    println!("  ascii-tab       .txt, .crd         plain-text tabs and charts");
    println!("  chord-chart     (detected)         chord-only ascii-tab sources");
    println!("  alpha-notation  .tab, .alpha       simplified textual tablature");
    println!("  web-text        (via --scraped)    scraped-page records");
    ExitCode::SUCCESS
}
