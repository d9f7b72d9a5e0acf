//! Zeiss LSM vendor decoding.
//!
//! An LSM file is a classic TIFF whose first full-resolution plane carries a
//! private tag (34412, `CZ_LSMINFO`). The tag's payload is a fixed header
//! with offsets to further structures stored elsewhere in the file:
//!
//! ```text
//! CZ_LSMINFO ──┬── channel colors ── channel names
//!              ├── timestamps
//!              ├── event list
//!              ├── scan information ── recording / lasers / tracks / channels
//!              └── overlay lists (x9) ── shapes
//! ```
//!
//! The submodules decode each structure independently; the series reader
//! drives them in order.

pub mod dimensions;
pub mod header;
pub mod labels;
pub mod normalize;
pub mod overlay;
pub mod scan_info;

pub use dimensions::{
    zct_coords, Axis, DimensionOrder, Dimensions, PixelType, PlaneTiming, Reconciliation,
};
pub use header::{
    read_channel_names, read_events, read_timestamps, LsmEvent, MetadataHeader, MIN_HEADER_LEN,
};
pub use labels::label_for;
pub use normalize::normalize_planes;
pub use overlay::{
    read_overlay_list, MarkerKind, OverlayList, OverlayShape, Point, ShapeGeometry, ShapeStyle,
};
pub use scan_info::{
    map_records, publish_records, read_scan_records, validate_adjacency, ChannelSlots,
    ObjectiveInfo, RecordFields, RecordKind, ScanRecord, ScanValue,
};

use crate::format::tiff::TiffTag;

/// TIFF tag holding the CZ_LSMINFO header.
pub const LSM_INFO_TAG: u16 = TiffTag::CzLsmInfo.as_u16();
