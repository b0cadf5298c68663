//! Address ranges submitted to a New Search.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A contiguous span of addressable memory to scan.
///
/// The optional segment tag disambiguates bank-switched address spaces
/// where the same numeric address is mapped more than once; ranges in
/// different segments never count as overlapping. Mirrored addresses are
/// deliberately kept distinct: the engine narrows each one on its own and
/// never collapses mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: u64,
    pub length: u64,
    pub segment: Option<u32>,
}

impl AddressRange {
    /// A range of `length` bytes starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty range or one whose end overflows the
    /// address space.
    pub fn new(start: u64, length: u64) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidRange(format!(
                "empty range at {start:#x}"
            )));
        }
        if start.checked_add(length).is_none() {
            return Err(Error::InvalidRange(format!(
                "range {start:#x}+{length:#x} overflows the address space"
            )));
        }
        Ok(Self {
            start,
            length,
            segment: None,
        })
    }

    pub fn with_segment(start: u64, length: u64, segment: u32) -> Result<Self> {
        let mut range = Self::new(start, length)?;
        range.segment = Some(segment);
        Ok(range)
    }

    /// One past the last address in the range.
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end()
    }

    /// Whether two ranges share any address within the same segment.
    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.segment == other.segment && self.start < other.end() && other.start < self.end()
    }
}

/// Validate the range list submitted to one New Search.
///
/// # Errors
///
/// Returns an error if the list is empty or any two ranges overlap.
pub fn validate_ranges(ranges: &[AddressRange]) -> Result<()> {
    if ranges.is_empty() {
        return Err(Error::InvalidRange("no ranges given".to_string()));
    }
    for (i, a) in ranges.iter().enumerate() {
        for b in &ranges[i + 1..] {
            if a.overlaps(b) {
                return Err(Error::InvalidRange(format!(
                    "ranges {:#x}+{:#x} and {:#x}+{:#x} overlap",
                    a.start, a.length, b.start, b.length
                )));
            }
        }
    }
    Ok(())
}
