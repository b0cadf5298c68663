//! Raw access to the host system's addressable memory.
//!
//! The scan engine never owns memory. It samples it through this trait,
//! which the host (an emulator bus, a dump file mapping) implements. The
//! host keeps running while scans are in progress, so every read is a
//! point-in-time sample of state that may already have moved on.

use crate::error::Result;

/// Trait for reading and writing a live address space.
///
/// Methods take `&self`: the host mutates memory concurrently with
/// scanning, so implementations are expected to route writes through
/// interior mutability rather than exclusive borrows.
pub trait MemoryAccessor {
    /// Read `length` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Fails if any byte of the span is unmapped. Partial reads are not
    /// returned; a candidate window is only useful complete.
    fn read(&self, address: u64, length: usize) -> Result<Vec<u8>>;

    /// Write bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Fails if the span is unmapped or lies in a read-only region.
    fn write(&self, address: u64, bytes: &[u8]) -> Result<()>;

    /// Whether `address` lies in a writable (RAM-like) region.
    ///
    /// Used for the read-only exclusion during New Search: unless the
    /// caller opts in, addresses in read-only regions never become
    /// candidates.
    fn is_writable(&self, address: u64) -> bool;
}

impl<A: MemoryAccessor + ?Sized> MemoryAccessor for &A {
    fn read(&self, address: u64, length: usize) -> Result<Vec<u8>> {
        (**self).read(address, length)
    }

    fn write(&self, address: u64, bytes: &[u8]) -> Result<()> {
        (**self).write(address, bytes)
    }

    fn is_writable(&self, address: u64) -> bool {
        (**self).is_writable(address)
    }
}
