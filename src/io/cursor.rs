//! Positioned, endian-aware record reading.
//!
//! Every LSM structure (vendor header, scan information, event list, overlay
//! lists) is a sequence of fixed-width scalars and length-bounded strings at
//! absolute file offsets. [`RecordCursor`] tracks the current offset over a
//! [`RangeReader`] and reads those values in the file's byte order.

use bytes::Bytes;

use crate::error::IoError;

use super::range_reader::{ByteOrder, RangeReader};

/// Maximum length of a NUL-terminated string before the read gives up.
const MAX_CSTRING_LEN: usize = 64 * 1024;

/// Chunk size used when scanning for a NUL terminator.
const CSTRING_CHUNK: usize = 256;

/// A byte-offset-addressable reader over a [`RangeReader`].
pub struct RecordCursor<'a, R: RangeReader + ?Sized> {
    reader: &'a R,
    pos: u64,
    order: ByteOrder,
}

impl<'a, R: RangeReader + ?Sized> RecordCursor<'a, R> {
    /// Create a cursor positioned at offset 0.
    pub fn new(reader: &'a R, order: ByteOrder) -> Self {
        Self {
            reader,
            pos: 0,
            order,
        }
    }

    /// Current absolute offset.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total length of the underlying resource.
    #[inline]
    pub fn len(&self) -> u64 {
        self.reader.size()
    }

    /// Whether the underlying resource is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reader.size() == 0
    }

    /// Bytes left between the current offset and the end.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.reader.size().saturating_sub(self.pos)
    }

    /// Byte order used for scalar reads.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Switch the byte order for subsequent reads.
    #[inline]
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Move to an absolute offset. Seeking past the end is allowed; the next
    /// read will fail.
    #[inline]
    pub fn seek(&mut self, offset: u64) {
        self.pos = offset;
    }

    /// Advance by `n` bytes without reading.
    #[inline]
    pub fn skip(&mut self, n: u64) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Read `len` raw bytes and advance.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, IoError> {
        let bytes = self.reader.read_exact_at(self.pos, len)?;
        self.pos += len as u64;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, IoError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16, IoError> {
        let bytes = self.read_bytes(2)?;
        Ok(self.order.read_u16(&bytes) as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, IoError> {
        let bytes = self.read_bytes(4)?;
        Ok(self.order.read_u32(&bytes))
    }

    pub fn read_i32(&mut self) -> Result<i32, IoError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f64(&mut self) -> Result<f64, IoError> {
        let bytes = self.read_bytes(8)?;
        Ok(self.order.read_f64(&bytes))
    }

    /// Read a fixed-length string. Bytes are interpreted as Latin-1 and
    /// trailing NULs are dropped.
    pub fn read_string(&mut self, len: usize) -> Result<String, IoError> {
        let bytes = self.read_bytes(len)?;
        Ok(latin1(trim_nul(&bytes)))
    }

    /// Read a NUL-terminated string, consuming the terminator.
    ///
    /// A string that runs to the end of the resource without a terminator is
    /// returned as-is.
    pub fn read_cstring(&mut self) -> Result<String, IoError> {
        let mut out = Vec::new();
        loop {
            let remaining = self.remaining();
            if remaining == 0 {
                if out.is_empty() {
                    return Err(IoError::RangeOutOfBounds {
                        offset: self.pos,
                        requested: 1,
                        size: self.reader.size(),
                    });
                }
                break;
            }

            let chunk_len = remaining.min(CSTRING_CHUNK as u64) as usize;
            let chunk = self.reader.read_exact_at(self.pos, chunk_len)?;
            match chunk.iter().position(|&b| b == 0) {
                Some(nul) => {
                    out.extend_from_slice(&chunk[..nul]);
                    self.pos += nul as u64 + 1;
                    break;
                }
                None => {
                    out.extend_from_slice(&chunk);
                    self.pos += chunk_len as u64;
                }
            }

            if out.len() >= MAX_CSTRING_LEN {
                break;
            }
        }
        Ok(latin1(&out))
    }
}

/// Strip trailing NUL bytes.
pub(crate) fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
