mod accessor;
pub mod chunked;
mod region;
mod shared;

pub use accessor::MemoryAccessor;
pub use chunked::{ChunkedRangeReader, DEFAULT_CHUNK_SIZE, RangeChunk};
pub use region::{AddressRange, validate_ranges};
pub use shared::{SharedMemory, SharedMemoryBuilder};
