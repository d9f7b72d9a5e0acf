mod block_cache;
mod cursor;
mod range_reader;

pub use block_cache::{BlockCache, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};
pub use cursor::RecordCursor;
pub(crate) use cursor::trim_nul;
pub use range_reader::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le, ByteOrder,
    FileRangeReader, MemoryRangeReader, RangeReader,
};
