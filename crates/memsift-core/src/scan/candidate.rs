//! The working set of addresses still matching every applied predicate.

use serde::Serialize;

use crate::codec::{DecodedValue, TypeSpec};

use super::Snapshot;

/// An address still consistent with all narrowing predicates applied so
/// far in a search session.
///
/// `previous` is `None` until a Search Within or Refresh pass has shifted
/// a value into it, which is what makes delta operators meaningless on
/// the first pass after New Search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub address: u64,
    pub previous: Option<DecodedValue>,
    pub current: DecodedValue,
}

/// Address-ordered collection of [`Candidate`]s for one search session.
///
/// Owned exclusively by the session's engine; consumers get borrowed
/// iteration in ascending address order, never mutation. All values were
/// decoded under the set's single [`TypeSpec`].
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSet {
    spec: TypeSpec,
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub(crate) fn empty(spec: TypeSpec) -> Self {
        Self {
            spec,
            candidates: Vec::new(),
        }
    }

    /// Seed a fresh set from a New Search snapshot: every observed address
    /// becomes a candidate with no previous value.
    pub(crate) fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            spec: snapshot.spec().clone(),
            candidates: snapshot
                .iter()
                .map(|(address, value)| Candidate {
                    address,
                    previous: None,
                    current: value.clone(),
                })
                .collect(),
        }
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate candidates in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn get(&self, address: u64) -> Option<&Candidate> {
        self.candidates
            .binary_search_by_key(&address, |c| c.address)
            .ok()
            .map(|idx| &self.candidates[idx])
    }

    pub fn contains(&self, address: u64) -> bool {
        self.get(address).is_some()
    }

    pub(crate) fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub(crate) fn replace_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
    }
}
