//! CZ_LSMINFO header decoding.
//!
//! The vendor tag (34412) carries a fixed-layout record: declared dimensions,
//! scan type, voxel sizes and an offset table pointing at auxiliary
//! structures elsewhere in the file. All values use the file's byte order.
//!
//! # Layout
//! ```text
//! 0    i32  magic number              88   i16  scan type
//! 4    i32  structure size            90   i16  spectral scan
//! 8    i32  dimension X               92   i32  data type 2
//! 12   i32  dimension Y               96   i32  vector overlay offset
//! 16   i32  dimension Z               100  i32  input LUT offset
//! 20   i32  dimension channels        104  i32  output LUT offset
//! 24   i32  dimension time            108  i32  channel colors offset
//! 28   i32  data type                 112  f64  time interval
//! 32   i32  thumbnail X               124  i32  scan information offset
//! 36   i32  thumbnail Y               132  i32  timestamps offset
//! 40   f64  voxel size X (m)          136  i32  event list offset
//! 48   f64  voxel size Y (m)          140  i32  ROI offset
//! 56   f64  voxel size Z (m)          144  i32  bleach ROI offset
//! 64   f64  origin X                  152  f64  display aspect X, Y, Z, time
//! 72   f64  origin Y                  184  i32  mean-of-ROIs .. linescan overlays
//! 80   f64  origin Z                  200  i32  toolbar flags
//!                                     204  i32  channel wavelength offset
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{IoError, LsmError};
use crate::io::{ByteOrder, MemoryRangeReader, RangeReader, RecordCursor};
use crate::metadata::{MetaValue, MetadataSink};

use super::overlay::OverlayList;

/// Minimum length of the fixed header.
pub const MIN_HEADER_LEN: usize = 208;

/// Event lists claiming more entries than this are treated as corrupt.
pub const MAX_EVENTS: i32 = 65535;

/// Longest event description read.
const MAX_EVENT_DESCRIPTION: i64 = 65536;

/// Longest channel name published.
const MAX_CHANNEL_NAME: usize = 128;

/// Meters to micrometers.
const METERS_TO_MICRONS: f64 = 1_000_000.0;

// =============================================================================
// MetadataHeader
// =============================================================================

/// The decoded fixed header. Offsets of 0 mean the structure is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataHeader {
    pub magic_number: i32,
    pub structure_size: i32,
    pub dimension_x: i32,
    pub dimension_y: i32,
    pub dimension_z: i32,
    pub dimension_channels: i32,
    pub dimension_time: i32,
    pub data_type: i32,
    pub thumbnail_x: i32,
    pub thumbnail_y: i32,
    /// Voxel sizes in micrometers
    pub voxel_size_x: f64,
    pub voxel_size_y: f64,
    pub voxel_size_z: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub origin_z: f64,
    pub scan_type: i16,
    pub spectral_scan: i16,
    pub data_type_2: i32,
    pub channel_colors_offset: u64,
    pub time_interval: f64,
    pub scan_info_offset: u64,
    pub timestamps_offset: u64,
    pub event_list_offset: u64,
    pub display_aspect_x: f64,
    pub display_aspect_y: f64,
    pub display_aspect_z: f64,
    pub display_aspect_time: f64,
    pub toolbar_flags: i32,
    pub channel_wavelength_offset: u64,
    /// Offsets of the overlay lists, in [`OverlayList::ALL`] order
    pub overlay_offsets: [u64; 9],
}

impl MetadataHeader {
    /// Decode the header from the vendor tag payload.
    ///
    /// # Errors
    /// `MalformedHeader` when the payload is shorter than [`MIN_HEADER_LEN`].
    pub fn parse(payload: &[u8], order: ByteOrder) -> Result<Self, LsmError> {
        if payload.len() < MIN_HEADER_LEN {
            return Err(LsmError::MalformedHeader {
                required: MIN_HEADER_LEN,
                actual: payload.len(),
            });
        }

        let buffer = MemoryRangeReader::new(payload.to_vec(), "CZ_LSMINFO");
        let mut c = RecordCursor::new(&buffer, order);
        Self::read(&mut c).map_err(|_| LsmError::MalformedHeader {
            required: MIN_HEADER_LEN,
            actual: payload.len(),
        })
    }

    fn read<R: RangeReader + ?Sized>(c: &mut RecordCursor<'_, R>) -> Result<Self, IoError> {
        fn offset<R: RangeReader + ?Sized>(c: &mut RecordCursor<'_, R>) -> Result<u64, IoError> {
            Ok(c.read_u32()? as u64)
        }

        let mut overlays = [0u64; 9];

        let magic_number = c.read_i32()?;
        let structure_size = c.read_i32()?;
        let dimension_x = c.read_i32()?;
        let dimension_y = c.read_i32()?;
        let dimension_z = c.read_i32()?;
        let dimension_channels = c.read_i32()?;
        let dimension_time = c.read_i32()?;
        let data_type = c.read_i32()?;
        let thumbnail_x = c.read_i32()?;
        let thumbnail_y = c.read_i32()?;
        let voxel_size_x = c.read_f64()? * METERS_TO_MICRONS;
        let voxel_size_y = c.read_f64()? * METERS_TO_MICRONS;
        let voxel_size_z = c.read_f64()? * METERS_TO_MICRONS;
        let origin_x = c.read_f64()?;
        let origin_y = c.read_f64()?;
        let origin_z = c.read_f64()?;
        let scan_type = c.read_i16()?;
        let spectral_scan = c.read_i16()?;
        let data_type_2 = c.read_i32()?;
        overlays[0] = offset(c)?;
        overlays[1] = offset(c)?;
        overlays[2] = offset(c)?;
        let channel_colors_offset = offset(c)?;
        let time_interval = c.read_f64()?;
        c.skip(4); // channel data types
        let scan_info_offset = offset(c)?;
        c.skip(4); // KS data
        let timestamps_offset = offset(c)?;
        let event_list_offset = offset(c)?;
        overlays[3] = offset(c)?;
        overlays[4] = offset(c)?;
        c.skip(4); // next recording
        let display_aspect_x = c.read_f64()?;
        let display_aspect_y = c.read_f64()?;
        let display_aspect_z = c.read_f64()?;
        let display_aspect_time = c.read_f64()?;
        for slot in &mut overlays[5..] {
            *slot = offset(c)?;
        }
        let toolbar_flags = c.read_i32()?;
        let channel_wavelength_offset = offset(c)?;

        Ok(MetadataHeader {
            magic_number,
            structure_size,
            dimension_x,
            dimension_y,
            dimension_z,
            dimension_channels,
            dimension_time,
            data_type,
            thumbnail_x,
            thumbnail_y,
            voxel_size_x,
            voxel_size_y,
            voxel_size_z,
            origin_x,
            origin_y,
            origin_z,
            scan_type,
            spectral_scan,
            data_type_2,
            channel_colors_offset,
            time_interval,
            scan_info_offset,
            timestamps_offset,
            event_list_offset,
            display_aspect_x,
            display_aspect_y,
            display_aspect_z,
            display_aspect_time,
            toolbar_flags,
            channel_wavelength_offset,
            overlay_offsets: overlays,
        })
    }

    /// Overlay lists that are present, with their offsets.
    pub fn overlay_offsets(&self) -> impl Iterator<Item = (OverlayList, u64)> + '_ {
        OverlayList::ALL
            .into_iter()
            .zip(self.overlay_offsets)
            .filter(|&(_, offset)| offset != 0)
    }

    pub fn scan_type_label(&self) -> &'static str {
        match self.scan_type {
            1 => "z scan (x-z plane)",
            2 => "line scan",
            3 => "time series x-y",
            4 => "time series x-z",
            5 => "time series 'Mean of ROIs'",
            6 => "time series x-y-z",
            7 => "spline scan",
            8 => "spline scan x-z",
            9 => "time series spline plane x-z",
            10 => "point mode",
            _ => "x-y-z scan",
        }
    }

    pub fn data_type_label(&self) -> &'static str {
        match self.data_type {
            0 => "varying data types",
            2 => "12 bit unsigned integer",
            5 => "32 bit float",
            _ => "8 bit unsigned integer",
        }
    }

    pub fn data_type_2_label(&self) -> &'static str {
        match self.data_type_2 {
            1 => "calculated data",
            2 => "animation",
            _ => "original scan data",
        }
    }

    pub fn spectral_scan_label(&self) -> &'static str {
        if self.spectral_scan == 1 {
            "acquired with spectral scan"
        } else {
            "no spectral scan"
        }
    }

    /// Publish the header fields as global metadata under `prefix`.
    ///
    /// DimensionZ and DimensionChannels are left to the caller, which knows
    /// the reconciled values.
    pub fn publish(&self, sink: &mut dyn MetadataSink, prefix: &str) {
        let mut put = |key: &str, value: MetaValue| sink.put_global(&format!("{prefix}{key}"), value);

        put("MagicNumber", self.magic_number.into());
        put("StructureSize", self.structure_size.into());
        put("DimensionX", self.dimension_x.into());
        put("DimensionY", self.dimension_y.into());
        put("DataType", self.data_type_label().into());
        put("ThumbnailX", self.thumbnail_x.into());
        put("ThumbnailY", self.thumbnail_y.into());
        put("VoxelSizeX", self.voxel_size_x.into());
        put("VoxelSizeY", self.voxel_size_y.into());
        put("VoxelSizeZ", self.voxel_size_z.into());
        put("OriginX", self.origin_x.into());
        put("OriginY", self.origin_y.into());
        put("OriginZ", self.origin_z.into());
        put("ScanType", self.scan_type_label().into());
        put("SpectralScan", self.spectral_scan_label().into());
        put("DataType2", self.data_type_2_label().into());
        put("TimeInterval", self.time_interval.into());
        put("DisplayAspectX", self.display_aspect_x.into());
        put("DisplayAspectY", self.display_aspect_y.into());
        put("DisplayAspectZ", self.display_aspect_z.into());
        put("DisplayAspectTime", self.display_aspect_time.into());
        put("ToolbarFlags", self.toolbar_flags.into());
    }
}

// =============================================================================
// Auxiliary Structures
// =============================================================================

/// One entry of the acquisition event list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LsmEvent {
    pub time: f64,
    pub event_type: i32,
    pub description: String,
}

/// Read channel names from the channel colors structure.
///
/// Returns `(channel index, name)` for every name of at most 128
/// characters. Reading stops at the end of the file.
pub fn read_channel_names<R: RangeReader + ?Sized>(
    reader: &R,
    order: ByteOrder,
    channel_colors: u64,
    size_c: usize,
) -> Vec<(usize, String)> {
    let mut c = RecordCursor::new(reader, order);
    c.seek(channel_colors + 16);
    let names_offset = match c.read_i32() {
        Ok(v) => v,
        Err(e) => {
            warn!(offset = channel_colors, error = %e, "channel colors structure truncated");
            return Vec::new();
        }
    };
    if names_offset <= 0 {
        return Vec::new();
    }
    c.seek(channel_colors + 20 + names_offset as u64 - 16);

    let mut names = Vec::new();
    for i in 0..size_c {
        if c.position() + 1 >= c.len() {
            break;
        }
        match c.read_cstring() {
            Ok(name) if name.chars().count() <= MAX_CHANNEL_NAME => names.push((i, name)),
            Ok(_) => {}
            Err(_) => break,
        }
    }
    names
}

/// Read `size_t` timestamps (seconds). A truncated table yields the stamps
/// read so far.
pub fn read_timestamps<R: RangeReader + ?Sized>(
    reader: &R,
    order: ByteOrder,
    timestamps: u64,
    size_t: usize,
) -> Vec<f64> {
    let mut c = RecordCursor::new(reader, order);
    c.seek(timestamps + 8);

    let mut stamps = Vec::with_capacity(size_t.min(1 << 16));
    for _ in 0..size_t {
        match c.read_f64() {
            Ok(stamp) => stamps.push(stamp),
            Err(_) => {
                warn!(
                    offset = timestamps,
                    read = stamps.len(),
                    expected = size_t,
                    "timestamp table truncated"
                );
                break;
            }
        }
    }
    stamps
}

/// Read the acquisition event list.
///
/// The event count is stored inconsistently across writers, so it is read
/// in both byte orders: a negative native value defers to the swapped one,
/// otherwise the smaller of the two is used.
pub fn read_events<R: RangeReader + ?Sized>(
    reader: &R,
    order: ByteOrder,
    event_list: u64,
) -> Vec<LsmEvent> {
    let mut c = RecordCursor::new(reader, order);
    c.seek(event_list + 4);

    let native = c.read_i32();
    c.seek(event_list + 4);
    c.set_byte_order(order.swapped());
    let swapped = c.read_i32();
    c.set_byte_order(order);

    let count = match (native, swapped) {
        (Ok(native), Ok(swapped)) if native < 0 => swapped,
        (Ok(native), Ok(swapped)) => native.min(swapped),
        _ => {
            warn!(offset = event_list, "event list header truncated");
            return Vec::new();
        }
    };

    if count > MAX_EVENTS {
        warn!(count, "event list count out of range; skipping list");
        return Vec::new();
    }

    let mut events = Vec::new();
    for _ in 0..count.max(0) {
        if c.position() + 16 > c.len() {
            break;
        }
        let start = c.position();
        match read_event(&mut c) {
            Ok((size, event)) => {
                events.push(event);
                let next = start as i64 + size as i64;
                if next < 0 {
                    break;
                }
                c.seek(next as u64);
            }
            Err(_) => {
                debug!(offset = start, "event record truncated");
                break;
            }
        }
    }
    events
}

fn read_event<R: RangeReader + ?Sized>(
    c: &mut RecordCursor<'_, R>,
) -> Result<(i32, LsmEvent), IoError> {
    let size = c.read_i32()?;
    let time = c.read_f64()?;
    let event_type = c.read_i32()?;
    let len = (size as i64 - 16).clamp(0, MAX_EVENT_DESCRIPTION) as usize;
    let description = c.read_string(len)?;
    Ok((
        size,
        LsmEvent {
            time,
            event_type,
            description,
        },
    ))
}

// =============================================================================
// Tests
// =============================================================================
