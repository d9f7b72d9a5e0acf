//! TIFF header and IFD structure parsing.
//!
//! LSM files are classic (32-bit offset) TIFF files. Their envelope is a chain
//! of IFDs: one per image plane, alternating with reduced-resolution
//! thumbnails.
//!
//! # TIFF Header Structure
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! # IFD Structure
//! ```text
//! 2 bytes:        entry count N
//! N * 12 bytes:   entries (2 tag + 2 type + 4 count + 4 value/offset)
//! 4 bytes:        offset of the next IFD (0 = end of chain)
//! ```

use crate::error::TiffError;
use crate::io::ByteOrder;

use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry in bytes
pub const IFD_ENTRY_SIZE: usize = 12;

/// Size of the entry count field at the start of an IFD
pub const IFD_COUNT_SIZE: usize = 2;

/// Size of the next-IFD offset at the end of an IFD
pub const IFD_NEXT_OFFSET_SIZE: usize = 4;

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// # Errors
    /// - `FileTooSmall` if there aren't enough bytes for the header
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if version is not 42
    /// - `InvalidIfdOffset` if the first IFD offset is outside the file
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        // Byte order marks are symmetric, so reading them little-endian is fine
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        if version != VERSION_TIFF {
            return Err(TiffError::InvalidVersion(version));
        }

        let first_ifd_offset = byte_order.read_u32(&bytes[4..8]) as u64;
        if first_ifd_offset >= file_size {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset,
        })
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// A single 12-byte IFD entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Numeric tag
    pub tag: u16,

    /// Field type, if recognized
    pub field_type: Option<FieldType>,

    /// Raw field type value
    pub field_type_raw: u16,

    /// Number of values
    pub count: u64,

    /// The 4 raw value/offset bytes
    pub value_offset_bytes: [u8; 4],

    /// Whether the value is stored inline in `value_offset_bytes`
    pub is_inline: bool,
}

impl IfdEntry {
    /// Parse an entry from its 12 raw bytes.
    pub fn parse(bytes: &[u8], byte_order: ByteOrder) -> Self {
        let tag = byte_order.read_u16(&bytes[0..2]);
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);
        let field_type = FieldType::from_u16(field_type_raw);
        let count = byte_order.read_u32(&bytes[4..8]) as u64;
        let value_offset_bytes = [bytes[8], bytes[9], bytes[10], bytes[11]];
        let is_inline = field_type.map(|t| t.fits_inline(count)).unwrap_or(false);

        IfdEntry {
            tag,
            field_type,
            field_type_raw,
            count,
            value_offset_bytes,
            is_inline,
        }
    }

    /// Total size of the value in bytes, if the field type is known.
    pub fn value_byte_size(&self) -> Option<u64> {
        self.field_type
            .map(|t| t.size_in_bytes() as u64 * self.count)
    }

    /// Offset of the value in the file (meaningful when not inline).
    pub fn value_offset(&self, byte_order: ByteOrder) -> u64 {
        byte_order.read_u32(&self.value_offset_bytes) as u64
    }

    /// Read an inline single Short or Long value.
    pub fn inline_u32(&self, byte_order: ByteOrder) -> Option<u32> {
        if self.count != 1 {
            return None;
        }
        match self.field_type? {
            FieldType::Short | FieldType::SShort => {
                Some(byte_order.read_u16(&self.value_offset_bytes) as u32)
            }
            FieldType::Long | FieldType::SLong => {
                Some(byte_order.read_u32(&self.value_offset_bytes))
            }
            FieldType::Byte | FieldType::SByte | FieldType::Undefined => {
                Some(self.value_offset_bytes[0] as u32)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Entries in file order
    pub entries: Vec<IfdEntry>,

    /// Offset of the next IFD (0 = end of chain)
    pub next_ifd_offset: u64,
}

impl Ifd {
    /// Total byte size of an IFD with `entry_count` entries.
    #[inline]
    pub const fn calculate_size(entry_count: u64) -> usize {
        IFD_COUNT_SIZE + entry_count as usize * IFD_ENTRY_SIZE + IFD_NEXT_OFFSET_SIZE
    }

    /// Parse an IFD from its raw bytes (entry count through next offset).
    pub fn parse(bytes: &[u8], byte_order: ByteOrder) -> Result<Self, TiffError> {
        if bytes.len() < IFD_COUNT_SIZE {
            return Err(TiffError::FileTooSmall {
                required: IFD_COUNT_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let entry_count = byte_order.read_u16(&bytes[0..2]) as u64;
        let required = Self::calculate_size(entry_count);
        if bytes.len() < required {
            return Err(TiffError::FileTooSmall {
                required: required as u64,
                actual: bytes.len() as u64,
            });
        }

        let entries = (0..entry_count as usize)
            .map(|i| {
                let start = IFD_COUNT_SIZE + i * IFD_ENTRY_SIZE;
                IfdEntry::parse(&bytes[start..start + IFD_ENTRY_SIZE], byte_order)
            })
            .collect();

        let next_start = required - IFD_NEXT_OFFSET_SIZE;
        let next_ifd_offset = byte_order.read_u32(&bytes[next_start..required]) as u64;

        Ok(Ifd {
            entries,
            next_ifd_offset,
        })
    }

    /// Find an entry by numeric tag.
    pub fn get_entry(&self, tag: u16) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// Find an entry by known tag.
    pub fn get_entry_by_tag(&self, tag: TiffTag) -> Option<&IfdEntry> {
        self.get_entry(tag.as_u16())
    }

    /// Read a single inline integer value for a known tag.
    pub fn inline_u32(&self, tag: TiffTag, byte_order: ByteOrder) -> Option<u32> {
        self.get_entry_by_tag(tag)?.inline_u32(byte_order)
    }
}

// =============================================================================
// Tests
// =============================================================================
