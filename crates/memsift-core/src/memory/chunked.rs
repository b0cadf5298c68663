//! Chunked bulk reads over an address range.
//!
//! New Search is byte-granular, so issuing one accessor read per address
//! would touch every address `width` times. This iterator reads a range in
//! fixed-size chunks instead, with each chunk extended by a configurable
//! overlap so multi-byte windows that straddle a chunk seam still decode
//! from a single buffer.

use super::{AddressRange, MemoryAccessor};

/// Default chunk size for bulk range reads (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// One chunk of a range read.
///
/// `base..base + len` is the span of candidate start addresses this chunk
/// covers. `data`, when present, holds `len + overlap` bytes so every
/// window starting inside the span is fully buffered. `data` is `None`
/// when the bulk read failed (the span touches unmapped memory); callers
/// fall back to probing those addresses individually.
#[derive(Debug)]
pub struct RangeChunk {
    pub base: u64,
    pub len: usize,
    pub data: Option<Vec<u8>>,
}

/// Iterator producing [`RangeChunk`]s over an [`AddressRange`].
pub struct ChunkedRangeReader<'a, A: MemoryAccessor> {
    accessor: &'a A,
    current: u64,
    end: u64,
    chunk_size: usize,
    overlap: usize,
}

impl<'a, A: MemoryAccessor> ChunkedRangeReader<'a, A> {
    /// Read `range` in chunks of `chunk_size` start addresses, buffering
    /// `overlap` extra bytes past each chunk for window decoding.
    pub fn new(accessor: &'a A, range: &AddressRange, chunk_size: usize, overlap: usize) -> Self {
        Self {
            accessor,
            current: range.start,
            end: range.end(),
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }
}

impl<A: MemoryAccessor> Iterator for ChunkedRangeReader<'_, A> {
    type Item = RangeChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.end {
            return None;
        }

        let stride = self.chunk_size.min((self.end - self.current) as usize);
        let base = self.current;
        self.current += stride as u64;

        let data = self.accessor.read(base, stride + self.overlap).ok();
        Some(RangeChunk {
            base,
            len: stride,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SharedMemory;

    #[test]
    fn test_single_chunk_covers_range() {
        let mem = SharedMemory::builder()
            .region(0x1000, 8, true)
            .write_bytes(0, &[1, 2, 3, 4, 5, 6, 7, 8])
            .build();
        let range = AddressRange::new(0x1000, 8).unwrap();

        let chunks: Vec<_> = ChunkedRangeReader::new(&mem, &range, 16, 0).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].base, 0x1000);
        assert_eq!(chunks[0].len, 8);
        assert_eq!(chunks[0].data.as_deref(), Some(&[1, 2, 3, 4, 5, 6, 7, 8][..]));
    }

    #[test]
    fn test_overlap_extends_past_chunk_seam() {
        let mem = SharedMemory::builder()
            .region(0x1000, 8, true)
            .write_bytes(0, &[1, 2, 3, 4, 5, 6, 7, 8])
            .build();
        // Range stops at 6 start addresses; windows are 3 bytes wide.
        let range = AddressRange::new(0x1000, 6).unwrap();

        let chunks: Vec<_> = ChunkedRangeReader::new(&mem, &range, 4, 2).collect();
        assert_eq!(chunks.len(), 2);
        // First chunk buffers its 4 addresses plus 2 overlap bytes.
        assert_eq!(chunks[0].len, 4);
        assert_eq!(chunks[0].data.as_deref(), Some(&[1, 2, 3, 4, 5, 6][..]));
        // Second chunk covers the remaining 2 addresses.
        assert_eq!(chunks[1].base, 0x1004);
        assert_eq!(chunks[1].len, 2);
        assert_eq!(chunks[1].data.as_deref(), Some(&[5, 6, 7, 8][..]));
    }

    #[test]
    fn test_unmapped_chunk_yields_no_data() {
        let mem = SharedMemory::builder().region(0x1000, 4, true).build();
        let range = AddressRange::new(0x1000, 8).unwrap();

        let chunks: Vec<_> = ChunkedRangeReader::new(&mem, &range, 4, 0).collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].data.is_some());
        assert!(chunks[1].data.is_none());
    }
}
