//! pdftools - Merge PDFs, shrink their embedded images, and build PDFs from
//! images.
//!
//! Command-line front-end over the `pdftools` library.

mod cli;
mod config;
mod inputs;
mod output;
mod session;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use pdftools::{
    CancelFlag, CompressionReport, ConversionSummary, DocumentMerger, ImageRecompressor,
    ImageToPdfConverter, MergeSummary, PdfToolsError,
};

use crate::cli::Cli;
use crate::config::{Config, OutputConfig, OutputExists, OutputMode, OverwriteMode};
use crate::output::{ConsoleProgress, OutputFormatter, file_size_label};
use crate::session::{Operation, Session};

/// Exit code when the output exists and may not be replaced.
const EXIT_OUTPUT_EXISTS: i32 = 4;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(err) = run(cli).await {
        OutputFormatter::default().error(&format!("Error: {err:#}"));
        process::exit(exit_code(&err));
    }
}

/// Install the log subscriber. `RUST_LOG` wins over `-v` and `-q`.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Outcome of one operation.
#[derive(Debug)]
enum Report {
    Merge(MergeSummary),
    Compress(CompressionReport),
    Convert(ConversionSummary),
}

/// Main application logic.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_command(&cli.command).await?;
    let json = config.output().mode == OutputMode::Json;

    // Keep stdout clean for the JSON document
    let formatter = if json {
        OutputFormatter::quiet()
    } else {
        OutputFormatter::new(cli.quiet, cli.verbose)
    };

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdftools::NAME, pdftools::VERSION));
        formatter.blank_line();
    }

    let mut session = Session::new();
    session.select(config.sources())?;

    handle_output_overwrite(config.output(), &formatter).await?;

    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.cancel();
        }
    });

    let operation = operation_of(&config);
    let sources = session.start(operation)?;
    tracing::debug!(state = ?session.state(), "Session running");
    formatter.info(&format!("Running {operation} on {} file(s)...", sources.len()));
    if formatter.is_verbose() {
        for (index, source) in sources.iter().enumerate() {
            formatter.list_item(index + 1, &source.display().to_string());
        }
    }

    let output = config.output().clone();
    let progress = ConsoleProgress::new(formatter, cancel);
    let outcome = execute(config, sources, progress).await;
    session.finish()?;

    let report = outcome?;
    if json {
        println!("{}", report_json(&report)?);
    } else {
        display_report(&formatter, &report, &output);
    }

    Ok(())
}

fn operation_of(config: &Config) -> Operation {
    match config {
        Config::Merge(_) => Operation::Merge,
        Config::Compress(_) => Operation::Compress,
        Config::Convert(_) => Operation::Convert,
    }
}

/// Run the configured operation on a blocking thread.
async fn execute(
    config: Config,
    sources: Vec<PathBuf>,
    mut progress: ConsoleProgress,
) -> anyhow::Result<Report> {
    let task = tokio::task::spawn_blocking(move || -> pdftools::Result<Report> {
        match config {
            Config::Merge(config) => DocumentMerger::with_options(config.options)
                .merge_with_progress(&sources, &config.output.path, &mut progress)
                .map(Report::Merge),
            Config::Compress(config) => ImageRecompressor::with_config(config.compression)
                .compress_with_progress(&config.input, &config.output.path, &mut progress)
                .map(Report::Compress),
            Config::Convert(config) => ImageToPdfConverter::new()
                .convert_with_progress(&sources, &config.output.path, &mut progress)
                .map(Report::Convert),
        }
    });

    let report = task.await.context("Operation thread panicked")??;
    Ok(report)
}

fn report_json(report: &Report) -> serde_json::Result<String> {
    match report {
        Report::Merge(summary) => serde_json::to_string_pretty(summary),
        Report::Compress(report) => serde_json::to_string_pretty(report),
        Report::Convert(summary) => serde_json::to_string_pretty(summary),
    }
}

fn display_report(formatter: &OutputFormatter, report: &Report, output: &OutputConfig) {
    let path = output.path.display();

    match report {
        Report::Merge(summary) => {
            formatter.success(&format!(
                "Merged {} file(s) into {} pages: {} ({})",
                summary.files_merged,
                summary.total_pages,
                path,
                file_size_label(&output.path)
            ));

            if formatter.is_verbose() {
                formatter.section("Statistics");
                formatter.detail("Input size", &pdftools::io::format_file_size(summary.input_size));
                formatter.detail(
                    "Output size",
                    &pdftools::io::format_file_size(summary.output_size),
                );
                formatter.detail("PDF version", &summary.version);
                formatter.detail("Bookmarks", &summary.bookmarks_added.to_string());
                formatter.detail(
                    "Merge time",
                    &format!("{:.2}s", summary.merge_time.as_secs_f64()),
                );
            }
        }
        Report::Compress(report) => {
            let sizes = format!(
                "{} -> {}",
                pdftools::io::format_file_size(report.original_size),
                pdftools::io::format_file_size(report.compressed_size)
            );
            if report.is_reduced() {
                formatter.success(&format!(
                    "Compressed {path}: {sizes} ({:.1}% smaller)",
                    report.reduction_percent()
                ));
            } else {
                formatter.success(&format!("Wrote {path}: {sizes}"));
                formatter.warning("Output is not smaller than the source");
            }
        }
        Report::Convert(summary) => {
            formatter.success(&format!(
                "Created {path} with {} page(s) ({})",
                summary.pages,
                pdftools::io::format_file_size(summary.output_size)
            ));
        }
    }
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    output: &OutputConfig,
    formatter: &OutputFormatter,
) -> anyhow::Result<()> {
    if !output.path.exists() {
        return Ok(());
    }

    let refuse = || OutputExists {
        path: output.path.clone(),
    };

    match output.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(refuse().into()),
        OverwriteMode::Prompt => {
            // Nobody to ask
            if formatter.is_quiet() {
                return Err(refuse().into());
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                output.path.display()
            ));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .context("Failed to read confirmation")?;

            let response = response.trim().to_lowercase();
            if response == "y" || response == "yes" {
                Ok(())
            } else {
                Err(PdfToolsError::Cancelled.into())
            }
        }
    }
}

/// Map an error to the documented process exit code.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<PdfToolsError>() {
        return err.exit_code();
    }
    if err.downcast_ref::<OutputExists>().is_some() {
        return EXIT_OUTPUT_EXISTS;
    }
    1
}
