//! Generic image-file envelope decoding.
//!
//! An LSM file is a classic TIFF whose IFD chain lists every image plane
//! (and a thumbnail after each plane). This module walks that chain and
//! reduces each IFD to a [`PlaneDescriptor`]: the strip layout and pixel
//! encoding the reader needs, plus the entry for the vendor tag.
//!
//! The [`ImageFileDecoder`] trait is the seam between the LSM layer and the
//! container decoder; [`TiffDecoder`] is the provided implementation.

use std::collections::HashSet;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::TiffError;
use crate::io::{ByteOrder, RangeReader};

use super::parser::{Ifd, IfdEntry, TiffHeader, IFD_COUNT_SIZE, TIFF_HEADER_SIZE};
use super::tags::{TiffTag, PLANAR_CHUNKY};
use super::values::ValueReader;

// =============================================================================
// Constants
// =============================================================================

/// Maximum number of IFDs to follow (safety limit).
///
/// Large time series hold tens of thousands of planes, each followed by a
/// thumbnail IFD.
const MAX_IFDS: usize = 1 << 20;

// =============================================================================
// PlaneDescriptor
// =============================================================================

/// Per-plane layout and encoding, reduced from one IFD.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneDescriptor {
    /// Index of the source IFD in the chain
    pub ifd_index: usize,

    /// NewSubfileType (0 = full-resolution plane, 1 = thumbnail)
    pub subfile_type: u32,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Components per pixel
    pub samples_per_pixel: u16,

    /// Bits per sample (first component)
    pub bits_per_sample: u16,

    /// SampleFormat (1 unsigned, 2 signed, 3 float)
    pub sample_format: u16,

    /// Compression code
    pub compression: u16,

    /// Predictor code. Uncompressed reads ignore it; it is kept for a
    /// delegated codec.
    pub predictor: u16,

    /// PlanarConfiguration (1 chunky, 2 separate)
    pub planar_configuration: u16,

    /// PhotometricInterpretation
    pub photometric: u16,

    /// Whether a ColorMap tag is present
    pub has_color_map: bool,

    /// Rows per strip
    pub rows_per_strip: u32,

    /// Strip offsets, widened to 64 bits so they can be corrected past 4 GiB
    pub strip_offsets: Vec<u64>,

    /// Strip byte counts
    pub strip_byte_counts: Vec<u64>,

    /// Entry for the CZ_LSMINFO vendor tag, if present
    pub vendor_entry: Option<IfdEntry>,
}

impl PlaneDescriptor {
    /// Build a descriptor from a parsed IFD.
    ///
    /// # Errors
    /// `MissingTag` when the image dimensions or strip offsets are absent.
    pub fn from_ifd<R: RangeReader + ?Sized>(
        ifd: &Ifd,
        ifd_index: usize,
        values: &ValueReader<'_, R>,
    ) -> Result<Self, TiffError> {
        let order = values.byte_order();
        let scalar = |tag: TiffTag| -> Result<Option<u32>, TiffError> {
            ifd.get_entry_by_tag(tag)
                .map(|entry| values.read_u32(entry))
                .transpose()
        };
        let required = |tag: TiffTag| -> Result<u32, TiffError> {
            scalar(tag)?.ok_or(TiffError::MissingTag(tag.name()))
        };

        let width = required(TiffTag::ImageWidth)?;
        let height = required(TiffTag::ImageLength)?;

        let offsets_entry = ifd
            .get_entry_by_tag(TiffTag::StripOffsets)
            .ok_or(TiffError::MissingTag(TiffTag::StripOffsets.name()))?;
        let strip_offsets = values.read_u64_array(offsets_entry)?;
        let strip_byte_counts = match ifd.get_entry_by_tag(TiffTag::StripByteCounts) {
            Some(entry) => values.read_u64_array(entry)?,
            None => Vec::new(),
        };

        Ok(PlaneDescriptor {
            ifd_index,
            subfile_type: scalar(TiffTag::NewSubfileType)?.unwrap_or(0),
            width,
            height,
            samples_per_pixel: scalar(TiffTag::SamplesPerPixel)?.unwrap_or(1) as u16,
            bits_per_sample: scalar(TiffTag::BitsPerSample)?.unwrap_or(1) as u16,
            sample_format: scalar(TiffTag::SampleFormat)?.unwrap_or(1) as u16,
            compression: scalar(TiffTag::Compression)?.unwrap_or(1) as u16,
            predictor: scalar(TiffTag::Predictor)?.unwrap_or(1) as u16,
            planar_configuration: scalar(TiffTag::PlanarConfiguration)?
                .unwrap_or(PLANAR_CHUNKY as u32) as u16,
            photometric: ifd
                .inline_u32(TiffTag::PhotometricInterpretation, order)
                .unwrap_or(1) as u16,
            has_color_map: ifd.get_entry_by_tag(TiffTag::ColorMap).is_some(),
            rows_per_strip: scalar(TiffTag::RowsPerStrip)?.unwrap_or(height),
            strip_offsets,
            strip_byte_counts,
            vendor_entry: ifd.get_entry_by_tag(TiffTag::CzLsmInfo).cloned(),
        })
    }

    /// Bytes needed to store one sample.
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8).max(1)
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// The decoded container: byte order, every IFD and its plane descriptor.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Byte order declared in the TIFF header
    pub byte_order: ByteOrder,

    /// Plane descriptors in IFD order
    pub planes: Vec<PlaneDescriptor>,
}

impl Envelope {
    /// Read the payload of a vendor tag attached to a plane.
    ///
    /// Returns `Ok(None)` when the plane has no such tag.
    pub fn vendor_tag<R: RangeReader + ?Sized>(
        &self,
        reader: &R,
        plane: usize,
        code: u16,
    ) -> Result<Option<Bytes>, TiffError> {
        let Some(descriptor) = self.planes.get(plane) else {
            return Ok(None);
        };
        match &descriptor.vendor_entry {
            Some(entry) if entry.tag == code => {
                let values = ValueReader::new(reader, self.byte_order);
                values.read_bytes(entry).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Whether the file is little-endian.
    #[inline]
    pub fn is_little_endian(&self) -> bool {
        self.byte_order == ByteOrder::LittleEndian
    }
}

// =============================================================================
// ImageFileDecoder
// =============================================================================

/// Decodes a container file into an [`Envelope`].
pub trait ImageFileDecoder: Send + Sync {
    /// Parse the container structure of `reader`.
    fn decode(&self, reader: &dyn RangeReader) -> Result<Envelope, TiffError>;
}

/// Classic TIFF envelope decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffDecoder;

impl TiffDecoder {
    /// Parse all IFDs in the file following the next-IFD chain.
    ///
    /// The walk stops at a zero offset, at an offset already visited, or at
    /// the safety limit.
    fn parse_all_ifds(
        reader: &dyn RangeReader,
        header: &TiffHeader,
    ) -> Result<Vec<Ifd>, TiffError> {
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 && ifds.len() < MAX_IFDS {
            if !visited.insert(offset) {
                warn!(offset, "IFD chain loops back; stopping");
                break;
            }

            let count_bytes = reader.read_exact_at(offset, IFD_COUNT_SIZE)?;
            let entry_count = header.byte_order.read_u16(&count_bytes) as u64;

            let ifd_size = Ifd::calculate_size(entry_count);
            let ifd_bytes = reader.read_exact_at(offset, ifd_size)?;
            let ifd = Ifd::parse(&ifd_bytes, header.byte_order)?;

            offset = ifd.next_ifd_offset;
            ifds.push(ifd);
        }

        Ok(ifds)
    }
}

impl ImageFileDecoder for TiffDecoder {
    fn decode(&self, reader: &dyn RangeReader) -> Result<Envelope, TiffError> {
        let size = reader.size();
        if size < TIFF_HEADER_SIZE as u64 {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: size,
            });
        }

        let header_bytes = reader.read_exact_at(0, TIFF_HEADER_SIZE)?;
        let header = TiffHeader::parse(&header_bytes, size)?;

        let ifds = Self::parse_all_ifds(reader, &header)?;
        let values = ValueReader::new(reader, header.byte_order);

        let planes = ifds
            .iter()
            .enumerate()
            .map(|(index, ifd)| PlaneDescriptor::from_ifd(ifd, index, &values))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            file = reader.identifier(),
            ifds = planes.len(),
            "decoded TIFF envelope"
        );

        Ok(Envelope {
            byte_order: header.byte_order,
            planes,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
