//! TIFF tag value reading.
//!
//! Values are stored either inline in the IFD entry (when they fit in four
//! bytes) or at an offset in the file. Array values such as StripOffsets are
//! fetched in a single range read.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::{ByteOrder, RangeReader};

use super::parser::IfdEntry;
use super::tags::FieldType;

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF file in the file's byte order.
pub struct ValueReader<'a, R: RangeReader + ?Sized> {
    reader: &'a R,
    byte_order: ByteOrder,
}

impl<'a, R: RangeReader + ?Sized> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a R, byte_order: ByteOrder) -> Self {
        Self { reader, byte_order }
    }

    /// Byte order used for all reads.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// For inline values, returns the bytes from the entry.
    /// For offset values, fetches the bytes from the file.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ))
        } else {
            let offset = entry.value_offset(self.byte_order);
            Ok(self.reader.read_exact_at(offset, size as usize)?)
        }
    }

    /// Read a single integer value (Byte, Short or Long).
    pub fn read_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        if let Some(value) = entry.inline_u32(self.byte_order) {
            return Ok(value);
        }
        let values = self.read_u32_array(entry)?;
        values
            .first()
            .copied()
            .ok_or_else(|| TiffError::InvalidTagValue {
                tag: "unknown",
                message: "expected at least one value".to_string(),
            })
    }

    /// Read an array of integer values as u64.
    ///
    /// Strip offsets are widened so the normalizer can correct values past
    /// the 32-bit boundary.
    pub fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        Ok(self
            .read_u32_array(entry)?
            .into_iter()
            .map(u64::from)
            .collect())
    }

    /// Read an array of Byte, Short or Long values as u32.
    pub fn read_u32_array(&self, entry: &IfdEntry) -> Result<Vec<u32>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.count == 0 {
            return Ok(Vec::new());
        }

        match field_type {
            FieldType::Byte | FieldType::Short | FieldType::Long => {}
            other => {
                return Err(TiffError::InvalidTagValue {
                    tag: "unknown",
                    message: format!("expected Byte, Short or Long array, got {:?}", other),
                })
            }
        }

        let bytes = self.read_bytes(entry)?;
        Ok(parse_u32_array(
            &bytes,
            entry.count as usize,
            field_type,
            self.byte_order,
        ))
    }

    /// Read an ASCII value, stripping the NUL terminator.
    pub fn read_string(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        let bytes = self.read_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

// =============================================================================
// Convenience functions for reading from bytes directly
// =============================================================================

/// Parse an array of unsigned values from raw bytes.
///
/// Values that would run past the end of `bytes` are dropped.
pub fn parse_u32_array(
    bytes: &[u8],
    count: usize,
    field_type: FieldType,
    byte_order: ByteOrder,
) -> Vec<u32> {
    let width = field_type.size_in_bytes();
    (0..count)
        .map(|i| i * width)
        .take_while(|offset| offset + width <= bytes.len())
        .filter_map(|offset| match field_type {
            FieldType::Byte => Some(bytes[offset] as u32),
            FieldType::Short => Some(byte_order.read_u16(&bytes[offset..]) as u32),
            FieldType::Long => Some(byte_order.read_u32(&bytes[offset..])),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
