//! Scan orchestration: New Search, Search Within, Refresh.
//!
//! The engine owns one search session's candidate set and samples memory
//! through a [`MemoryAccessor`]. The host system keeps running while a
//! pass is in flight, so every pass is a best-effort point-in-time sample,
//! not a transactionally consistent one; reads are bulked and coalesced to
//! keep the sampling window as tight as feasible.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::codec::{self, DecodedValue, TypeSpec};
use crate::error::{Error, Result};
use crate::memory::{
    AddressRange, ChunkedRangeReader, DEFAULT_CHUNK_SIZE, MemoryAccessor, validate_ranges,
};

use super::{Candidate, CandidateSet, ComparisonPredicate, Snapshot};

/// Candidates re-read between cancellation checks during a narrowing pass.
pub const NARROW_CHUNK: usize = 4096;

/// Cooperative cancellation flag checked at chunk boundaries.
///
/// Clones share the flag. Cancelling abandons the remainder of the pass
/// in flight; work completed up to the last chunk boundary is retained.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One search session's scan engine.
///
/// The [`TypeSpec`] is fixed for the engine's lifetime; changing the
/// interpretation means starting a new session. The candidate set is
/// exclusively owned here and handed out by reference only.
pub struct ScanEngine<A: MemoryAccessor> {
    accessor: A,
    spec: TypeSpec,
    candidates: CandidateSet,
    generation: u64,
    chunk_size: usize,
    cancel: Option<CancelToken>,
}

impl<A: MemoryAccessor> ScanEngine<A> {
    pub fn new(accessor: A, spec: TypeSpec) -> Self {
        let candidates = CandidateSet::empty(spec.clone());
        Self {
            accessor,
            spec,
            candidates,
            generation: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: None,
        }
    }

    /// Override the bulk-read chunk size (in candidate start addresses).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    /// Scan generation of the most recent pass (0 after New Search).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Iterate current candidates in ascending address order.
    pub fn list(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Build a fresh candidate set over `ranges`, replacing any prior one.
    ///
    /// Scanning is byte-granular regardless of the value width, so
    /// overlapping multi-byte windows at adjacent addresses all become
    /// candidates. Unless `include_readonly` is set, addresses in regions
    /// the accessor reports as read-only are skipped. Unmapped gaps inside
    /// a range are skipped silently; those addresses never become
    /// candidates.
    ///
    /// # Errors
    ///
    /// [`Error::RangeUnmapped`] if an entire range is unreadable, and
    /// [`Error::Cancelled`] if the cancel token fired mid-scan (candidates
    /// gathered up to that point are installed).
    pub fn new_search(&mut self, ranges: &[AddressRange], include_readonly: bool) -> Result<usize> {
        validate_ranges(ranges)?;
        let window = self.spec.window();
        let mut values = BTreeMap::new();
        let mut cancelled = false;

        'ranges: for range in ranges {
            let mut readable = false;
            for chunk in ChunkedRangeReader::new(&self.accessor, range, self.chunk_size, window - 1)
            {
                if self.is_cancelled() {
                    cancelled = true;
                    break 'ranges;
                }
                match chunk.data {
                    Some(buffer) => {
                        readable = true;
                        for offset in 0..chunk.len {
                            let address = chunk.base + offset as u64;
                            if !include_readonly && !self.accessor.is_writable(address) {
                                continue;
                            }
                            let window_bytes = buffer.get(offset..).unwrap_or(&[]);
                            if let Ok(value) = codec::decode(window_bytes, &self.spec) {
                                values.insert(address, value);
                            }
                        }
                    }
                    None => {
                        debug!(
                            "bulk read at {:#x} failed, probing {} address(es) individually",
                            chunk.base, chunk.len
                        );
                        for offset in 0..chunk.len {
                            let address = chunk.base + offset as u64;
                            if !include_readonly && !self.accessor.is_writable(address) {
                                continue;
                            }
                            let Ok(bytes) = self.accessor.read(address, window) else {
                                continue;
                            };
                            readable = true;
                            if let Ok(value) = codec::decode(&bytes, &self.spec) {
                                values.insert(address, value);
                            }
                        }
                    }
                }
            }
            if !cancelled && !readable {
                return Err(Error::RangeUnmapped {
                    start: range.start,
                    length: range.length,
                });
            }
        }

        self.generation = 0;
        let snapshot = Snapshot::new(self.spec.clone(), self.generation, values);
        self.candidates = CandidateSet::from_snapshot(&snapshot);
        info!(
            "new search: {} candidate(s) across {} range(s)",
            self.candidates.len(),
            ranges.len()
        );
        if cancelled {
            return Err(Error::Cancelled);
        }
        Ok(self.candidates.len())
    }

    /// Narrow the candidate set with a fresh read pass.
    ///
    /// Every candidate is re-read, its `current` shifted into `previous`,
    /// and the predicate evaluated; candidates that fail it or whose read
    /// fails are removed.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyCandidateSet`] if the pass removed every candidate.
    /// The set is left empty rather than reverted; an all-eliminated
    /// result is informative and the session stays usable.
    pub fn search_within(&mut self, predicate: &ComparisonPredicate) -> Result<usize> {
        predicate.check_spec(&self.spec)?;
        let survivors = self.pass(Some(predicate))?;
        if survivors == 0 {
            warn!(
                "search within '{}' eliminated every candidate",
                predicate.op()
            );
            return Err(Error::EmptyCandidateSet);
        }
        Ok(survivors)
    }

    /// Re-read every candidate without narrowing.
    ///
    /// Shifts `current` into `previous` exactly like Search Within but
    /// evaluates no predicate, so the pass establishes a fresh baseline
    /// (e.g. before waiting for an expected state change) and keeps
    /// displayed values live.
    pub fn refresh(&mut self) -> Result<usize> {
        self.pass(None)
    }

    /// Encode `value` under the session spec and write it at `address`.
    ///
    /// Routed through the accessor; the new value is not reflected into
    /// the candidate's previous/current window until the next pass.
    pub fn write_value(&self, address: u64, value: &DecodedValue) -> Result<()> {
        let bytes = codec::encode(value, &self.spec)?;
        if !self.candidates.contains(address) {
            debug!("write targets {address:#x}, which is not a tracked candidate");
        }
        self.accessor.write(address, &bytes)
    }

    /// Capture the current candidate values as an immutable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let values = self
            .candidates
            .iter()
            .map(|c| (c.address, c.current.clone()))
            .collect();
        Snapshot::new(self.spec.clone(), self.generation, values)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// One read pass over the candidate set, in ascending address order.
    ///
    /// Adjacent candidates whose windows overlap or abut are coalesced
    /// into single bulk reads. With `predicate = None` the pass is the
    /// always-true Refresh.
    fn pass(&mut self, predicate: Option<&ComparisonPredicate>) -> Result<usize> {
        self.generation += 1;
        let window = self.spec.window();
        let spec = self.spec.clone();
        let old = std::mem::replace(&mut self.candidates, CandidateSet::empty(spec.clone()));
        let input = old.candidates();
        let mut survivors: Vec<Candidate> = Vec::with_capacity(input.len());
        let mut dropped_reads = 0usize;
        let mut cancelled_at: Option<usize> = None;

        for (chunk_index, chunk) in input.chunks(NARROW_CHUNK).enumerate() {
            if self.is_cancelled() {
                cancelled_at = Some(chunk_index * NARROW_CHUNK);
                break;
            }
            let mut i = 0;
            while i < chunk.len() {
                let run_start = chunk[i].address;
                let mut run_end = run_start + window as u64;
                let mut j = i + 1;
                while j < chunk.len() && chunk[j].address <= run_end {
                    run_end = chunk[j].address + window as u64;
                    j += 1;
                }
                let bulk = self
                    .accessor
                    .read(run_start, (run_end - run_start) as usize)
                    .ok();
                for candidate in &chunk[i..j] {
                    let offset = (candidate.address - run_start) as usize;
                    let bytes = match bulk
                        .as_ref()
                        .and_then(|buffer| buffer.get(offset..offset + window))
                    {
                        Some(window_bytes) => Some(window_bytes.to_vec()),
                        None => self.accessor.read(candidate.address, window).ok(),
                    };
                    let Some(bytes) = bytes else {
                        dropped_reads += 1;
                        continue;
                    };
                    let Ok(value) = codec::decode(&bytes, &spec) else {
                        dropped_reads += 1;
                        continue;
                    };
                    let previous = Some(candidate.current.clone());
                    let keep = match predicate {
                        Some(p) => p.evaluate(previous.as_ref(), &value, &spec),
                        None => true,
                    };
                    if keep {
                        survivors.push(Candidate {
                            address: candidate.address,
                            previous,
                            current: value,
                        });
                    }
                }
                i = j;
            }
        }

        if let Some(done) = cancelled_at {
            // Unprocessed candidates keep their old previous/current window.
            survivors.extend(input[done..].iter().cloned());
            self.candidates.replace_candidates(survivors);
            return Err(Error::Cancelled);
        }

        if dropped_reads > 0 {
            warn!("{dropped_reads} candidate(s) dropped on failed reads");
        }
        let count = survivors.len();
        match predicate {
            Some(p) => debug!(
                "pass {} '{}': {} -> {} candidate(s)",
                self.generation,
                p.op(),
                input.len(),
                count
            ),
            None => debug!("refresh {}: {} candidate(s)", self.generation, count),
        }
        self.candidates.replace_candidates(survivors);
        Ok(count)
    }
}
