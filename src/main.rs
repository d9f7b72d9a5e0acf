//! LSM Reader - inspect Zeiss LSM datasets from the command line.
//!
//! This binary opens a dataset and prints its structure, lists its files or
//! extracts raw plane bytes.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lsm_reader::{
    config::{Cli, Command, ExtractArgs, FilesArgs, InfoArgs, OpenArgs},
    series::{LocalFileSource, LsmReader},
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.command.open_args().verbose);

    match cli.command {
        Command::Info(args) => run_info(args),
        Command::Files(args) => run_files(args),
        Command::Extract(args) => run_extract(args),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "lsm_reader=debug"
    } else {
        "lsm_reader=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Validate options and open the dataset, logging any failure.
fn open_dataset(args: &OpenArgs) -> Option<LsmReader<LocalFileSource>> {
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        return None;
    }

    let mut reader = LsmReader::new(args.source()).with_options(args.resolve_options());
    match reader.open(&args.path) {
        Ok(()) => Some(reader),
        Err(e) => {
            error!("Failed to open {}: {}", args.path.display(), e);
            None
        }
    }
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(args: InfoArgs) -> ExitCode {
    let Some(reader) = open_dataset(&args.open) else {
        return ExitCode::FAILURE;
    };

    let series: Vec<_> = reader.all_series().iter().map(|s| s.summary()).collect();
    let json = if args.no_metadata {
        serde_json::json!({ "series": series })
    } else {
        serde_json::json!({ "series": series, "metadata": reader.metadata() })
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    match output {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Files Command
// =============================================================================

fn run_files(args: FilesArgs) -> ExitCode {
    let Some(reader) = open_dataset(&args.open) else {
        return ExitCode::FAILURE;
    };

    match reader.used_files(args.no_pixels) {
        Ok(files) => {
            for file in files {
                println!("{}", file.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to list files: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Extract Command
// =============================================================================

fn run_extract(args: ExtractArgs) -> ExitCode {
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    let Some(reader) = open_dataset(&args.open) else {
        return ExitCode::FAILURE;
    };

    let bytes = match args.region() {
        Some((x, y, w, h)) => reader.open_bytes(args.series, args.plane, x, y, w, h),
        None => reader.open_plane(args.series, args.plane),
    };
    let bytes = match bytes {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read plane {}: {}", args.plane, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::write(&args.output, &bytes) {
        error!("Failed to write {}: {}", args.output.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        series = args.series,
        plane = args.plane,
        bytes = bytes.len(),
        output = %args.output.display(),
        "wrote plane"
    );
    ExitCode::SUCCESS
}
