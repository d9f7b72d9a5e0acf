//! File kind detection.
//!
//! An LSM dataset is opened either through one of its `.lsm` image files or
//! through the `.mdb` project database that lists them. Both can be told
//! apart by extension or by their first four bytes:
//!
//! - **LSM image**: a classic TIFF header (`II*\0` or `MM\0*`)
//! - **Project database**: an Access database, whose bytes 2..4 read `St`

use std::path::Path;

use crate::error::IoError;
use crate::io::{ByteOrder, RangeReader};

// =============================================================================
// FileKind
// =============================================================================

/// The kinds of file that can start a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A TIFF-based LSM image file
    Lsm,

    /// A project database listing LSM files
    ProjectDatabase,
}

impl FileKind {
    /// Get a human-readable name for the kind.
    pub const fn name(&self) -> &'static str {
        match self {
            FileKind::Lsm => "Zeiss LSM image",
            FileKind::ProjectDatabase => "Zeiss LSM project database",
        }
    }

    /// Extension (without the dot) used by files of this kind.
    pub const fn extension(&self) -> &'static str {
        match self {
            FileKind::Lsm => LSM_EXTENSION,
            FileKind::ProjectDatabase => MDB_EXTENSION,
        }
    }
}

/// Extension of LSM image files.
pub const LSM_EXTENSION: &str = "lsm";

/// Extension of project database files.
pub const MDB_EXTENSION: &str = "mdb";

/// Bytes inspected by [`is_this_type`].
pub const BLOCK_CHECK_LEN: usize = 4;

/// Bytes 2..4 of a project database.
const MDB_MARKER: &[u8] = b"St";

// =============================================================================
// Detection
// =============================================================================

/// Check whether `path` has the given extension, ignoring case.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Classify a path by its extension alone.
pub fn kind_from_path(path: &Path) -> Option<FileKind> {
    if has_extension(path, MDB_EXTENSION) {
        Some(FileKind::ProjectDatabase)
    } else if has_extension(path, LSM_EXTENSION) {
        Some(FileKind::Lsm)
    } else {
        None
    }
}

/// Classify the first bytes of a file.
///
/// Returns `None` when fewer than [`BLOCK_CHECK_LEN`] bytes are given or
/// neither signature matches.
pub fn kind_from_bytes(bytes: &[u8]) -> Option<FileKind> {
    if bytes.len() < BLOCK_CHECK_LEN {
        return None;
    }
    if is_tiff_header(bytes) {
        Some(FileKind::Lsm)
    } else if &bytes[2..4] == MDB_MARKER {
        Some(FileKind::ProjectDatabase)
    } else {
        None
    }
}

/// Check whether the first bytes belong to a file this crate can open.
pub fn is_this_type(bytes: &[u8]) -> bool {
    kind_from_bytes(bytes).is_some()
}

/// Detect the kind of file behind `reader` from its signature.
///
/// # Errors
/// Propagates read failures. Files shorter than [`BLOCK_CHECK_LEN`] yield
/// `Ok(None)`.
pub fn detect_kind<R: RangeReader + ?Sized>(reader: &R) -> Result<Option<FileKind>, IoError> {
    if reader.size() < BLOCK_CHECK_LEN as u64 {
        return Ok(None);
    }
    let bytes = reader.read_exact_at(0, BLOCK_CHECK_LEN)?;
    Ok(kind_from_bytes(&bytes))
}

/// Check if bytes start with a classic TIFF header.
///
/// Only the magic and version are checked; four bytes are enough.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    if bytes.len() < BLOCK_CHECK_LEN {
        return false;
    }

    let byte_order = match &bytes[0..2] {
        b"II" => ByteOrder::LittleEndian,
        b"MM" => ByteOrder::BigEndian,
        _ => return false,
    };
    byte_order.read_u16(&bytes[2..4]) == 42
}

// =============================================================================
// Tests
// =============================================================================
