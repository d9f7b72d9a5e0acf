//! Raw sample extraction from uncompressed strips.
//!
//! Planes are stored as TIFF strips of `rows_per_strip` rows. Chunky planes
//! interleave the samples of a pixel; separate planes store one run of
//! strips per sample. Either way the output holds one buffer per sample, in
//! the file's byte order.

use crate::error::{LsmError, TiffError};
use crate::format::tiff::{Compression, PlaneDescriptor, PLANAR_SEPARATE};
use crate::io::RangeReader;

/// A rectangle inside a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    /// The whole of a `width` x `height` plane.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width,
            h: height,
        }
    }

    /// Check that the region lies inside a `width` x `height` plane.
    pub fn check(&self, width: u32, height: u32) -> Result<(), LsmError> {
        let fits = |start: u32, len: u32, max: u32| start.checked_add(len).is_some_and(|end| end <= max);
        if fits(self.x, self.w, width) && fits(self.y, self.h, height) {
            Ok(())
        } else {
            Err(LsmError::RegionOutOfBounds {
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
                width,
                height,
            })
        }
    }
}

/// Fail unless the plane is stored uncompressed.
pub fn check_compression(plane: &PlaneDescriptor) -> Result<(), LsmError> {
    match Compression::from_u16(plane.compression) {
        Some(c) if c.is_supported() => Ok(()),
        Some(c) => Err(LsmError::UnsupportedCompression(c.name().to_string())),
        None => Err(LsmError::UnsupportedCompression(format!(
            "code {}",
            plane.compression
        ))),
    }
}

/// Read `region` of `plane`, returning one buffer per sample.
///
/// # Errors
/// `UnsupportedCompression` for compressed planes, `RegionOutOfBounds` for
/// regions outside the plane, `PlaneTooLarge` for regions larger than the
/// file, and I/O or strip-table errors.
pub fn read_samples<R: RangeReader + ?Sized>(
    reader: &R,
    plane: &PlaneDescriptor,
    region: Region,
) -> Result<Vec<Vec<u8>>, LsmError> {
    check_compression(plane)?;
    region.check(plane.width, plane.height)?;

    let samples = plane.samples_per_pixel.max(1) as usize;
    let bps = plane.bytes_per_sample();
    let sample_bytes = region_bytes(reader, region, bps)?;
    let needed = sample_bytes.saturating_mul(samples as u64);
    if needed > reader.size() {
        return Err(too_large(region, needed, reader.size()));
    }
    // bounded by the file size checked above
    let mut out = vec![Vec::with_capacity(sample_bytes as usize); samples];

    if region.w == 0 || region.h == 0 {
        return Ok(out);
    }

    let rows_per_strip = plane.rows_per_strip.clamp(1, plane.height.max(1)) as u64;
    let width = plane.width as u64;
    let x = region.x as u64;

    if plane.planar_configuration == PLANAR_SEPARATE && samples > 1 {
        let strips_per_sample = (plane.height as u64).div_ceil(rows_per_strip);
        let row_bytes = width * bps as u64;
        for (s, buf) in out.iter_mut().enumerate() {
            for row in region.y..region.y + region.h {
                let row = row as u64;
                let strip = s as u64 * strips_per_sample + row / rows_per_strip;
                let offset = strip_offset(plane, strip)?
                    + (row % rows_per_strip) * row_bytes
                    + x * bps as u64;
                let bytes = reader.read_exact_at(offset, region.w as usize * bps)?;
                buf.extend_from_slice(&bytes);
            }
        }
    } else {
        let pixel_bytes = samples * bps;
        let row_bytes = width * pixel_bytes as u64;
        for row in region.y..region.y + region.h {
            let row = row as u64;
            let offset = strip_offset(plane, row / rows_per_strip)?
                + (row % rows_per_strip) * row_bytes
                + x * pixel_bytes as u64;
            let bytes = reader.read_exact_at(offset, region.w as usize * pixel_bytes)?;
            for pixel in bytes.chunks_exact(pixel_bytes) {
                for (buf, sample) in out.iter_mut().zip(pixel.chunks_exact(bps)) {
                    buf.extend_from_slice(sample);
                }
            }
        }
    }

    Ok(out)
}

/// Bytes one sample of `region` occupies, or `PlaneTooLarge` on overflow.
fn region_bytes<R: RangeReader + ?Sized>(
    reader: &R,
    region: Region,
    bps: usize,
) -> Result<u64, LsmError> {
    (region.w as u64)
        .checked_mul(region.h as u64)
        .and_then(|pixels| pixels.checked_mul(bps as u64))
        .ok_or_else(|| too_large(region, u64::MAX, reader.size()))
}

fn too_large(region: Region, needed: u64, available: u64) -> LsmError {
    LsmError::PlaneTooLarge {
        w: region.w,
        h: region.h,
        needed,
        available,
    }
}

fn strip_offset(plane: &PlaneDescriptor, strip: u64) -> Result<u64, LsmError> {
    plane
        .strip_offsets
        .get(strip as usize)
        .copied()
        .ok_or_else(|| {
            TiffError::InvalidTagValue {
                tag: "StripOffsets",
                message: format!(
                    "strip {} missing (plane {} has {} strips)",
                    strip,
                    plane.ifd_index,
                    plane.strip_offsets.len()
                ),
            }
            .into()
        })
}

// =============================================================================
// Tests
// =============================================================================
