//! Envelope normalization.
//!
//! The raw IFD chain of an LSM file needs three fixes before its planes can be
//! indexed: thumbnails are interleaved with full-resolution planes, predictor
//! values are unreliable for uncompressed data, and strip offsets are stored
//! as 32-bit values even in files larger than 4 GiB.

use tracing::debug;

use crate::format::tiff::{Compression, PlaneDescriptor};

/// One 32-bit wrap of a stored offset.
const OFFSET_WRAP: u64 = 1 << 32;

/// Apply all normalization steps in order.
pub fn normalize_planes(planes: Vec<PlaneDescriptor>) -> Vec<PlaneDescriptor> {
    let total = planes.len();
    let mut planes = drop_thumbnails(planes);
    if planes.len() != total {
        debug!(
            dropped = total - planes.len(),
            kept = planes.len(),
            "removed thumbnail planes"
        );
    }

    force_predictor(&mut planes);

    let corrected = correct_offset_wrap(&mut planes);
    if corrected > 0 {
        debug!(corrected, "corrected strip offsets past 4 GiB");
    }
    planes
}

/// Keep only planes with subfile type 0.
pub fn drop_thumbnails(planes: Vec<PlaneDescriptor>) -> Vec<PlaneDescriptor> {
    planes.into_iter().filter(|p| p.subfile_type == 0).collect()
}

/// Reset the predictor to 1 on every plane that is not LZW-compressed.
pub fn force_predictor(planes: &mut [PlaneDescriptor]) {
    for plane in planes {
        if plane.compression != Compression::LZW_CODE {
            plane.predictor = 1;
        }
    }
}

/// Undo 32-bit wrap-around of strip offsets.
///
/// Planes are stored in ascending file order, so a first-strip offset that
/// is smaller than the previous plane's (already corrected) offset must lie
/// past a 4 GiB boundary. Each plane is placed in the same 4 GiB window as its
/// predecessor, or the next one when that would put it before the
/// predecessor. All strips of a corrected plane move together.
///
/// Returns the number of planes whose offsets changed.
pub fn correct_offset_wrap(planes: &mut [PlaneDescriptor]) -> usize {
    let mut corrected = 0;

    for i in 1..planes.len() {
        let Some(&prev) = planes[i - 1].strip_offsets.first() else {
            continue;
        };
        let Some(&raw) = planes[i].strip_offsets.first() else {
            continue;
        };

        let this = raw & 0xFFFF_FFFF;
        if prev <= this {
            continue;
        }

        let mut fixed = (prev & !0xFFFF_FFFF) | this;
        if fixed < prev {
            fixed += OFFSET_WRAP;
        }

        let shift = fixed - raw;
        if shift == 0 {
            continue;
        }
        for offset in &mut planes[i].strip_offsets {
            *offset += shift;
        }
        corrected += 1;
    }

    corrected
}
