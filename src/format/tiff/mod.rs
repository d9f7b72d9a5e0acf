//! Classic TIFF envelope parsing.
//!
//! LSM files are TIFF files underneath. This module reads just enough of the
//! TIFF structure to locate image planes and the vendor metadata tag.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian,
//!   MM = big-endian) in the header. The LSM vendor structures use the same
//!   order.
//!
//! - **IFD (Image File Directory)**: One per stored image. LSM files hold a
//!   full-resolution plane followed by a thumbnail for every acquisition step.
//!
//! - **Inline vs offset values**: Small values are stored inline in the IFD
//!   entry, larger values at an offset pointed to by the entry.

mod envelope;
mod parser;
mod tags;
mod values;

pub use envelope::{Envelope, ImageFileDecoder, PlaneDescriptor, TiffDecoder};
pub use parser::{Ifd, IfdEntry, TiffHeader, TIFF_HEADER_SIZE};
pub use tags::{
    Compression, FieldType, TiffTag, PHOTOMETRIC_PALETTE, PHOTOMETRIC_RGB, PLANAR_CHUNKY,
    PLANAR_SEPARATE,
};
pub use values::{parse_u32_array, ValueReader};
