//! Buffer-backed address space with mapped regions.
//!
//! `SharedMemory` is the crate's own [`MemoryAccessor`] implementation:
//! a cloneable handle over a set of mapped regions, each with a base
//! address, contents, and a writable flag. The CLI maps dump files into
//! it; tests build fixtures with [`SharedMemoryBuilder`]. Clones share the
//! same underlying regions, so one handle can play the mutating host while
//! another is being scanned.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Result};

use super::MemoryAccessor;

#[derive(Debug, Clone)]
struct Region {
    base: u64,
    data: Vec<u8>,
    writable: bool,
}

impl Region {
    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }

    fn contains_span(&self, address: u64, length: usize) -> bool {
        address >= self.base
            && address
                .checked_add(length as u64)
                .is_some_and(|end| end <= self.end())
    }
}

/// Cloneable handle over a set of mapped memory regions.
#[derive(Debug, Clone, Default)]
pub struct SharedMemory {
    regions: Arc<RwLock<Vec<Region>>>,
}

impl SharedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SharedMemoryBuilder {
        SharedMemoryBuilder::new()
    }

    /// Map a region at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is empty or overlaps one already
    /// mapped.
    pub fn map_region(&self, base: u64, data: Vec<u8>, writable: bool) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidRange(format!("empty region at {base:#x}")));
        }
        let end = base.checked_add(data.len() as u64).ok_or_else(|| {
            Error::InvalidRange(format!("region at {base:#x} overflows the address space"))
        })?;
        let mut regions = self.regions.write().unwrap_or_else(PoisonError::into_inner);
        if regions.iter().any(|r| base < r.end() && r.base < end) {
            return Err(Error::InvalidRange(format!(
                "region at {base:#x} overlaps an existing mapping"
            )));
        }
        regions.push(Region {
            base,
            data,
            writable,
        });
        regions.sort_by_key(|r| r.base);
        Ok(())
    }

    /// Replace the contents of the region mapped at exactly `base`.
    ///
    /// The replacement must have the region's original length; this models
    /// a new generation of the same address space (e.g. the next dump of a
    /// RAM bank) rather than a remap.
    pub fn replace_region(&self, base: u64, data: Vec<u8>) -> Result<()> {
        let mut regions = self.regions.write().unwrap_or_else(PoisonError::into_inner);
        let region = regions
            .iter_mut()
            .find(|r| r.base == base)
            .ok_or_else(|| Error::InvalidRange(format!("no region mapped at {base:#x}")))?;
        if region.data.len() != data.len() {
            return Err(Error::InvalidRange(format!(
                "replacement for region at {base:#x} has length {}, expected {}",
                data.len(),
                region.data.len()
            )));
        }
        region.data = data;
        Ok(())
    }

    /// Copy of the contents of the region mapped at exactly `base`.
    pub fn region_contents(&self, base: u64) -> Result<Vec<u8>> {
        let regions = self.regions.read().unwrap_or_else(PoisonError::into_inner);
        regions
            .iter()
            .find(|r| r.base == base)
            .map(|r| r.data.clone())
            .ok_or_else(|| Error::InvalidRange(format!("no region mapped at {base:#x}")))
    }

    pub fn is_mapped(&self, address: u64) -> bool {
        let regions = self.regions.read().unwrap_or_else(PoisonError::into_inner);
        regions.iter().any(|r| r.contains_span(address, 1))
    }

    pub fn region_count(&self) -> usize {
        self.regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl MemoryAccessor for SharedMemory {
    fn read(&self, address: u64, length: usize) -> Result<Vec<u8>> {
        let regions = self.regions.read().unwrap_or_else(PoisonError::into_inner);
        regions
            .iter()
            .find(|r| r.contains_span(address, length))
            .map(|r| {
                let offset = (address - r.base) as usize;
                r.data[offset..offset + length].to_vec()
            })
            .ok_or_else(|| Error::ReadFailed {
                address,
                message: format!("{length} byte span is not fully mapped"),
            })
    }

    fn write(&self, address: u64, bytes: &[u8]) -> Result<()> {
        let mut regions = self.regions.write().unwrap_or_else(PoisonError::into_inner);
        let region = regions
            .iter_mut()
            .find(|r| r.contains_span(address, bytes.len()))
            .ok_or_else(|| Error::WriteFailed {
                address,
                message: format!("{} byte span is not fully mapped", bytes.len()),
            })?;
        if !region.writable {
            return Err(Error::WriteFailed {
                address,
                message: "region is read-only".to_string(),
            });
        }
        let offset = (address - region.base) as usize;
        region.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn is_writable(&self, address: u64) -> bool {
        let regions = self.regions.read().unwrap_or_else(PoisonError::into_inner);
        regions
            .iter()
            .any(|r| r.contains_span(address, 1) && r.writable)
    }
}

/// Builder for memory layouts.
///
/// Writes target offsets within the most recently declared region and
/// auto-extend it as needed. A write before any `region` call targets an
/// implicit writable region at base 0.
#[derive(Debug, Default)]
pub struct SharedMemoryBuilder {
    regions: Vec<Region>,
}

impl SharedMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a zero-filled region of `size` bytes at `base`.
    pub fn region(mut self, base: u64, size: usize, writable: bool) -> Self {
        self.regions.push(Region {
            base,
            data: vec![0; size],
            writable,
        });
        self
    }

    /// Write raw bytes at `offset` within the current region.
    pub fn write_bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        let region = self.current_region();
        if region.data.len() < offset + bytes.len() {
            region.data.resize(offset + bytes.len(), 0);
        }
        region.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn write_u8(self, offset: usize, value: u8) -> Self {
        self.write_bytes(offset, &[value])
    }

    pub fn write_u16(self, offset: usize, value: u16) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_u32(self, offset: usize, value: u32) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn build(mut self) -> SharedMemory {
        self.regions.sort_by_key(|r| r.base);
        SharedMemory {
            regions: Arc::new(RwLock::new(self.regions)),
        }
    }

    fn current_region(&mut self) -> &mut Region {
        if self.regions.is_empty() {
            self.regions.push(Region {
                base: 0,
                data: Vec::new(),
                writable: true,
            });
        }
        let last = self.regions.len() - 1;
        &mut self.regions[last]
    }
}
