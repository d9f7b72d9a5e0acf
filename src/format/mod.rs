//! Format parsers for Zeiss LSM datasets.
//!
//! Decoding is layered:
//!
//! - [`tiff`]: the classic TIFF envelope (IFD chain, plane descriptors,
//!   vendor tag payloads)
//! - [`lsm`]: the vendor structures reached from the CZ_LSMINFO tag
//!
//! # Format Detection
//!
//! Use [`detect::detect_kind`] or [`detect::kind_from_path`] to tell LSM
//! image files from project databases.

pub mod detect;
pub mod lsm;
pub mod tiff;

pub use detect::{detect_kind, is_tiff_header, kind_from_path, FileKind};
