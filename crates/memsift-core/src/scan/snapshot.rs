//! Immutable value snapshots of one scan generation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codec::{DecodedValue, TypeSpec};

/// The values observed across a set of addresses in one read pass.
///
/// A snapshot is tagged with the [`TypeSpec`] every value was decoded
/// under and the scan generation it was captured at. It never changes
/// after capture; later generations produce new snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    spec: TypeSpec,
    generation: u64,
    captured_at: DateTime<Utc>,
    values: BTreeMap<u64, DecodedValue>,
}

impl Snapshot {
    pub(crate) fn new(spec: TypeSpec, generation: u64, values: BTreeMap<u64, DecodedValue>) -> Self {
        Self {
            spec,
            generation,
            captured_at: Utc::now(),
            values,
        }
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, address: u64) -> Option<&DecodedValue> {
        self.values.get(&address)
    }

    /// Iterate entries in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &DecodedValue)> {
        self.values.iter().map(|(addr, value)| (*addr, value))
    }
}
