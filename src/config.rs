//! Command-line configuration for the `lsm-reader` binary.
//!
//! Options are read from command-line arguments via clap, with environment
//! variable fallbacks under the `LSM_` prefix:
//!
//! - `LSM_BLOCK_SIZE` - Block size of the per-file read cache (default: 64KB)
//! - `LSM_CACHE_BLOCKS` - Blocks cached per open file (default: 64)
//! - `LSM_PREFER_PROJECT` - Open the project database next to an image file
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use lsm_reader::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.command {
//!     Command::Info(args) => println!("inspecting {}", args.open.path.display()),
//!     _ => {}
//! }
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::io::{DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};
use crate::series::{LocalFileSource, ResolveOptions};

// =============================================================================
// Limits
// =============================================================================

/// Smallest accepted block size.
pub const MIN_BLOCK_SIZE: usize = 512;

/// Largest accepted block size.
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// LSM Reader - inspect Zeiss LSM confocal datasets.
///
/// Decodes the vendor metadata, scan information, dimensions and overlay
/// shapes of `.lsm` files and `.mdb` projects, and extracts raw planes.
#[derive(Parser, Debug, Clone)]
#[command(name = "lsm-reader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of the binary.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print series dimensions and all decoded metadata as JSON.
    Info(InfoArgs),

    /// List the files a dataset is made of.
    Files(FilesArgs),

    /// Write the raw bytes of one plane to a file.
    Extract(ExtractArgs),
}

impl Command {
    /// Options shared by every subcommand.
    pub fn open_args(&self) -> &OpenArgs {
        match self {
            Command::Info(args) => &args.open,
            Command::Files(args) => &args.open,
            Command::Extract(args) => &args.open,
        }
    }
}

/// How to open a dataset.
#[derive(Args, Debug, Clone)]
pub struct OpenArgs {
    /// Path to an `.lsm` image or an `.mdb` project database.
    pub path: PathBuf,

    /// When given an `.lsm` file, open the project database in the same
    /// directory instead.
    #[arg(long, default_value_t = false, env = "LSM_PREFER_PROJECT")]
    pub prefer_project: bool,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Block size in bytes for the per-file read cache.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, env = "LSM_BLOCK_SIZE")]
    pub block_size: usize,

    /// Maximum number of blocks cached per open file.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "LSM_CACHE_BLOCKS")]
    pub cache_blocks: usize,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl OpenArgs {
    /// Validate the options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("A dataset path is required".to_string());
        }

        if self.cache_blocks == 0 {
            return Err("cache_blocks must be greater than 0".to_string());
        }

        if self.block_size < MIN_BLOCK_SIZE || self.block_size > MAX_BLOCK_SIZE {
            return Err("block_size must be between 512B and 16MB".to_string());
        }

        Ok(())
    }

    /// File source configured with these cache settings.
    pub fn source(&self) -> LocalFileSource {
        LocalFileSource::with_cache(self.block_size, self.cache_blocks)
    }

    /// Series resolution options.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            prefer_project: self.prefer_project,
        }
    }
}

/// Arguments of `info`.
#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    #[command(flatten)]
    pub open: OpenArgs,

    /// Pretty-print the JSON output.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Leave the metadata store out of the output.
    #[arg(long, default_value_t = false)]
    pub no_metadata: bool,
}

/// Arguments of `files`.
#[derive(Args, Debug, Clone)]
pub struct FilesArgs {
    #[command(flatten)]
    pub open: OpenArgs,

    /// List only files that hold no pixel data.
    #[arg(long, default_value_t = false)]
    pub no_pixels: bool,
}

/// Arguments of `extract`.
#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub open: OpenArgs,

    /// Series index.
    #[arg(short, long, default_value_t = 0)]
    pub series: usize,

    /// Logical plane index within the series.
    #[arg(short = 'n', long, default_value_t = 0)]
    pub plane: usize,

    /// Crop rectangle as `x,y,width,height`.
    #[arg(long, value_delimiter = ',', num_args = 4)]
    pub region: Option<Vec<u32>>,

    /// Output file for the raw bytes.
    #[arg(short, long)]
    pub output: PathBuf,
}

impl ExtractArgs {
    /// Validate the options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.open.validate()?;

        if let Some(region) = &self.region {
            if region.len() != 4 {
                return Err("region must be given as x,y,width,height".to_string());
            }
        }

        if self.output.as_os_str().is_empty() {
            return Err("An output path is required".to_string());
        }

        Ok(())
    }

    /// Crop rectangle as `(x, y, w, h)`, if one was given.
    pub fn region(&self) -> Option<(u32, u32, u32, u32)> {
        match self.region.as_deref() {
            Some(&[x, y, w, h]) => Some((x, y, w, h)),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
