//! Series resolution and the dataset reader.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               LsmReader                 │
//! │  (open / close, planes, used files)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │    resolver     │    │   decode_series     │
//! │ (.lsm / .mdb →  │    │ (envelope, header,  │
//! │  image files)   │    │  scan info, ...)    │
//! └────────┬────────┘    └──────────┬──────────┘
//!          └───────────┬────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         SeriesSource Trait              │
//! │  (LocalFileSource, MemorySource)        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use lsm_reader::series::{LocalFileSource, LsmReader};
//!
//! let mut reader = LsmReader::new(LocalFileSource::new());
//! reader.open(Path::new("cells.lsm"))?;
//!
//! let info = reader.series(0)?;
//! println!("{} planes in {}", info.image_count(), info.dimensions.order);
//! let plane = reader.open_plane(0, 0)?;
//! # let _ = plane;
//! # Ok::<(), lsm_reader::LsmError>(())
//! ```

mod pixels;
mod reader;
mod resolver;
mod source;

pub use pixels::{check_compression, read_samples, Region};
pub use reader::{decode_series, LookupTable, LsmReader, SeriesInfo, SeriesSummary};
pub use resolver::{
    resolve, sample_file_name, Resolution, ResolveOptions, Table, TableParser, RECORDINGS_TABLE,
    SAMPLE_DATA_COLUMN,
};
pub use source::{LocalFileSource, MemorySource, SeriesSource};
