//! # LSM Reader
//!
//! A reader for Zeiss LSM confocal microscopy datasets.
//!
//! An LSM file is a classic TIFF whose first full-resolution plane carries a
//! vendor metadata block. This library decodes that block and everything it
//! points at, reconciles the declared dimensions with the planes actually
//! stored, and serves raw uncompressed planes.
//!
//! ## Features
//!
//! - **Envelope decoding**: Classic TIFF IFD chains, thumbnails dropped,
//!   strip offsets past 4 GiB corrected
//! - **Vendor metadata**: The CZ_LSMINFO header, channel names, timestamps
//!   and the acquisition event list
//! - **Scan information**: The recording / laser / track / channel record
//!   tree, validated and mapped onto channel and light-source slots
//! - **Overlays**: Nine overlay lists decoded into typed shapes
//! - **Projects**: `.mdb` project databases resolved into multi-series
//!   datasets through a pluggable table parser
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`io`] - Range readers, block caching and the record cursor
//! - [`mod@format`] - TIFF envelope and LSM vendor structure parsers
//! - [`metadata`] - The metadata sink and in-memory store
//! - [`series`] - Series resolution and the dataset reader
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use lsm_reader::{LocalFileSource, LsmReader, MetaTarget};
//!
//! let mut reader = LsmReader::new(LocalFileSource::new());
//! reader.open(Path::new("cells.lsm"))?;
//!
//! for info in reader.all_series() {
//!     let d = &info.dimensions;
//!     println!("{}x{}x{}x{}x{} {}", d.size_x, d.size_y, d.size_z, d.size_c, d.size_t, d.order);
//! }
//! let name = reader.metadata().get(MetaTarget::Channel { series: 0, channel: 0 }, "Name");
//! # let _ = name;
//! # Ok::<(), lsm_reader::LsmError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod metadata;
pub mod series;

// Re-export commonly used types
pub use config::{Cli, Command, OpenArgs};
pub use error::{IoError, LsmError, TiffError};
pub use format::lsm::{
    DimensionOrder, Dimensions, MetadataHeader, OverlayShape, PixelType, ScanRecord, ShapeGeometry,
};
pub use format::tiff::{Envelope, ImageFileDecoder, PlaneDescriptor, TiffDecoder};
pub use format::{detect_kind, is_tiff_header, kind_from_path, FileKind};
pub use io::{BlockCache, ByteOrder, FileRangeReader, MemoryRangeReader, RangeReader, RecordCursor};
pub use metadata::{MetaTarget, MetaValue, MetadataSink, MetadataStore};
pub use series::{
    LocalFileSource, LookupTable, LsmReader, MemorySource, ResolveOptions, SeriesInfo,
    SeriesSource, Table, TableParser,
};
