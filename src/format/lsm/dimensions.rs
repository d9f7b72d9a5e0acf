//! Dimension reconciliation.
//!
//! The vendor header declares Z and T extents and the envelope supplies the
//! actual plane count. The two frequently disagree (aborted acquisitions,
//! channels stored as RGB samples), so the final extents are derived by a
//! fixed sequence of adjustments:
//!
//! 1. Initial extents from the first plane and the header ([`Dimensions::initial`])
//! 2. Reconciliation against the plane count ([`Dimensions::reconcile`])
//! 3. The split-planes decision once data channels are known
//!    ([`Dimensions::apply_split`])
//!
//! Plane indices are then mapped to (Z, C, T) along the dimension order.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::format::tiff::{PlaneDescriptor, PHOTOMETRIC_RGB};

// =============================================================================
// DimensionOrder
// =============================================================================

/// Rasterization order of the non-spatial axes. X and Y always come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionOrder {
    XYZCT,
    XYZTC,
    XYCZT,
    XYCTZ,
    XYTCZ,
    XYTZC,
}

/// A non-spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Z,
    C,
    T,
}

impl DimensionOrder {
    /// Order implied by an LSM scan type code.
    pub fn from_scan_type(scan_type: i16) -> Self {
        match scan_type {
            3 | 5 | 9 => DimensionOrder::XYTCZ,
            4 | 6 => DimensionOrder::XYZTC,
            7 => DimensionOrder::XYCTZ,
            8 => DimensionOrder::XYCZT,
            _ => DimensionOrder::XYZCT,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DimensionOrder::XYZCT => "XYZCT",
            DimensionOrder::XYZTC => "XYZTC",
            DimensionOrder::XYCZT => "XYCZT",
            DimensionOrder::XYCTZ => "XYCTZ",
            DimensionOrder::XYTCZ => "XYTCZ",
            DimensionOrder::XYTZC => "XYTZC",
        }
    }

    /// Move C to the position right after XY, keeping Z and T in order.
    ///
    /// Applied to RGB series, where channel is the fastest-varying axis.
    pub fn with_channel_first(self) -> Self {
        let without_c: String = self.as_str().chars().filter(|&c| c != 'C').collect();
        let reordered = without_c.replacen("XY", "XYC", 1);
        reordered.parse().unwrap_or(self)
    }

    /// Non-spatial axes from fastest to slowest varying.
    pub fn axes(self) -> [Axis; 3] {
        let mut axes = [Axis::Z; 3];
        for (slot, ch) in axes.iter_mut().zip(self.as_str()[2..].chars()) {
            *slot = match ch {
                'C' => Axis::C,
                'T' => Axis::T,
                _ => Axis::Z,
            };
        }
        axes
    }
}

impl fmt::Display for DimensionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimensionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XYZCT" => Ok(DimensionOrder::XYZCT),
            "XYZTC" => Ok(DimensionOrder::XYZTC),
            "XYCZT" => Ok(DimensionOrder::XYCZT),
            "XYCTZ" => Ok(DimensionOrder::XYCTZ),
            "XYTCZ" => Ok(DimensionOrder::XYTCZ),
            "XYTZC" => Ok(DimensionOrder::XYTZC),
            other => Err(format!("invalid dimension order: {}", other)),
        }
    }
}

impl Serialize for DimensionOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// =============================================================================
// PixelType
// =============================================================================

/// Sample type of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Derive the pixel type from TIFF BitsPerSample and SampleFormat.
    pub fn from_tiff(bits_per_sample: u16, sample_format: u16) -> Self {
        match (sample_format, bits_per_sample) {
            (3, 64) => PixelType::Float64,
            (3, _) => PixelType::Float32,
            (2, 0..=8) => PixelType::Int8,
            (2, 9..=16) => PixelType::Int16,
            (2, _) => PixelType::Int32,
            (_, 0..=8) => PixelType::Uint8,
            (_, 9..=16) => PixelType::Uint16,
            _ => PixelType::Uint32,
        }
    }

    /// Lowercase name, as used in serialized output.
    pub const fn as_str(self) -> &'static str {
        match self {
            PixelType::Uint8 => "uint8",
            PixelType::Uint16 => "uint16",
            PixelType::Uint32 => "uint32",
            PixelType::Int8 => "int8",
            PixelType::Int16 => "int16",
            PixelType::Int32 => "int32",
            PixelType::Float32 => "float32",
            PixelType::Float64 => "float64",
        }
    }

    /// Bytes per sample.
    pub const fn bytes(self) -> usize {
        match self {
            PixelType::Uint8 | PixelType::Int8 => 1,
            PixelType::Uint16 | PixelType::Int16 => 2,
            PixelType::Uint32 | PixelType::Int32 | PixelType::Float32 => 4,
            PixelType::Float64 => 8,
        }
    }
}

// =============================================================================
// Dimensions
// =============================================================================

/// Which reconciliation rule adjusted the extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// `diff` was a multiple of sizeZ; sizeT shrank or grew
    AdjustedTime,
    /// `diff` was a multiple of sizeT; sizeZ shrank or grew
    AdjustedDepth,
    /// Collapsed to sizeZ = plane count, sizeT = 1
    CollapsedToDepth,
    /// Collapsed to sizeT = plane count, sizeZ = 1
    CollapsedToTime,
    /// No rule applied; only the image count changed
    CountOnly,
}

/// Logical extents and layout flags of one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
    pub image_count: usize,
    pub order: DimensionOrder,
    pub rgb: bool,
    pub indexed: bool,
    pub split_planes: bool,
}

impl Dimensions {
    /// Initial extents from the first plane and the header's Z/T counts.
    pub fn initial(
        first_plane: &PlaneDescriptor,
        header_z: i32,
        header_t: i32,
        order: DimensionOrder,
    ) -> Self {
        let samples = first_plane.samples_per_pixel as usize;
        let mut rgb = samples > 1 || first_plane.photometric == PHOTOMETRIC_RGB;
        let mut size_c = if rgb { samples } else { 1 };

        let indexed = first_plane.has_color_map && size_c == 1;
        if indexed {
            size_c = 1;
            rgb = false;
        }
        if size_c == 0 {
            size_c = 1;
        }

        let order = if rgb { order.with_channel_first() } else { order };

        let mut dims = Dimensions {
            size_x: first_plane.width,
            size_y: first_plane.height,
            size_z: header_z.max(0) as usize,
            size_c,
            size_t: header_t.max(0) as usize,
            image_count: 0,
            order,
            rgb,
            indexed,
            split_planes: false,
        };
        dims.image_count = dims.declared_image_count();
        dims
    }

    /// Channel count used for plane arithmetic (1 for composite RGB).
    #[inline]
    pub fn effective_size_c(&self) -> usize {
        if self.rgb {
            1
        } else {
            self.size_c
        }
    }

    /// Image count implied by the current extents.
    pub fn declared_image_count(&self) -> usize {
        match self.effective_size_c() {
            0 => self.size_z * self.size_t,
            c => self.size_z * self.size_t * c,
        }
    }

    /// Adjust sizeZ/sizeT so the image count matches `plane_count`.
    ///
    /// Exactly one rule is applied, in order: a multiple of sizeZ adjusts
    /// sizeT, a multiple of sizeT adjusts sizeZ, otherwise the stack
    /// collapses onto whichever of Z or T is larger than one. Zero extents are
    /// then filled from the image count. Returns `None` when the counts
    /// already agree.
    pub fn reconcile(&mut self, plane_count: usize) -> Option<Reconciliation> {
        if self.image_count == plane_count {
            return None;
        }

        let diff = self.image_count as i64 - plane_count as i64;
        self.image_count = plane_count;

        let z = self.size_z as i64;
        let t = self.size_t as i64;

        let rule = if z != 0 && diff % z == 0 {
            self.size_t = (t - diff / z).max(0) as usize;
            Reconciliation::AdjustedTime
        } else if t != 0 && diff % t == 0 {
            self.size_z = (z - diff / t).max(0) as usize;
            Reconciliation::AdjustedDepth
        } else if z > 1 {
            self.size_z = plane_count;
            self.size_t = 1;
            Reconciliation::CollapsedToDepth
        } else if t > 1 {
            self.size_t = plane_count;
            self.size_z = 1;
            Reconciliation::CollapsedToTime
        } else {
            Reconciliation::CountOnly
        };

        self.fill_zero_extents();
        Some(rule)
    }

    /// Replace zero Z/T extents using the image count.
    pub fn fill_zero_extents(&mut self) {
        if self.size_z == 0 {
            self.size_z = self.image_count;
        }
        if self.size_t == 0 {
            self.size_t = self.image_count.checked_div(self.size_z).unwrap_or(0);
        }
    }

    /// Decide whether composite RGB planes are split into channels.
    ///
    /// `data_channels` is the number of data channels mapped onto channel
    /// slots. When it matches sizeC, an RGB series is split: RGB is cleared
    /// and every composite plane yields sizeC logical planes. A non-RGB
    /// series only has its RGB flag cleared. Returns whether planes are
    /// split.
    pub fn apply_split(&mut self, data_channels: usize) -> bool {
        let logical_channels = if data_channels == 0 { 1 } else { data_channels };
        if logical_channels == self.size_c {
            self.split_planes = self.rgb;
            self.rgb = false;
            if self.split_planes {
                self.image_count *= self.size_c;
            }
        }
        self.split_planes
    }

    /// Map a logical plane index to the stored plane and, for split series,
    /// the channel to extract from it.
    pub fn raw_plane(&self, no: usize) -> (usize, Option<usize>) {
        if self.split_planes && self.size_c > 1 {
            (no / self.size_c, Some(no % self.size_c))
        } else {
            (no, None)
        }
    }

    /// (Z, C, T) coordinates of a logical plane index.
    pub fn zct(&self, index: usize) -> (usize, usize, usize) {
        zct_coords(
            self.order,
            self.size_z,
            self.effective_size_c(),
            self.size_t,
            index,
        )
    }

    /// Per-plane timing derived from the shared timestamp sequence.
    ///
    /// `offset` is the index of this series' first timestamp. Planes whose
    /// timepoint has no timestamp are omitted.
    pub fn plane_timings(&self, stamps: &[f64], offset: usize) -> Vec<PlaneTiming> {
        let first = stamps.get(offset).copied().unwrap_or(0.0);

        (0..self.image_count)
            .filter_map(|plane| {
                let (_, _, t) = self.zct(plane);
                let mut this = *stamps.get(offset + t)?;
                let delta_t = this - first;
                let next = stamps.get(offset + t + 1).copied().unwrap_or(this);
                // The last timepoint reuses the preceding interval
                if plane + 1 == self.size_t && t > 0 {
                    this = stamps[offset + t - 1];
                }
                Some(PlaneTiming {
                    plane,
                    delta_t,
                    exposure: next - this,
                })
            })
            .collect()
    }
}

/// Rasterize a plane index into (Z, C, T) along `order`.
///
/// The first axis after XY varies fastest. Zero extents are treated as one.
pub fn zct_coords(
    order: DimensionOrder,
    size_z: usize,
    size_c: usize,
    size_t: usize,
    index: usize,
) -> (usize, usize, usize) {
    let extent = |axis: Axis| match axis {
        Axis::Z => size_z.max(1),
        Axis::C => size_c.max(1),
        Axis::T => size_t.max(1),
    };

    let [a0, a1, a2] = order.axes();
    let (l0, l1) = (extent(a0), extent(a1));
    let values = [index % l0, (index / l0) % l1, index / (l0 * l1)];

    let mut zct = (0, 0, 0);
    for (axis, value) in [a0, a1, a2].into_iter().zip(values) {
        match axis {
            Axis::Z => zct.0 = value,
            Axis::C => zct.1 = value,
            Axis::T => zct.2 = value,
        }
    }
    zct
}

/// Elapsed and exposure time of one plane, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaneTiming {
    pub plane: usize,
    pub delta_t: f64,
    pub exposure: f64,
}

// =============================================================================
// Tests
// =============================================================================
