//! Session surface consumed by the presentation layer.
//!
//! Each New Search opens an independent session owning its own engine and
//! accessor handle. Concurrent sessions over the same memory are fine:
//! scan passes are read-only, and a write lands in a session's
//! previous/current window only at its next pass.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::codec::{DecodedValue, TypeSpec};
use crate::error::{Error, Result};
use crate::memory::{AddressRange, MemoryAccessor};

use super::{CancelToken, Candidate, ComparisonPredicate, ScanEngine, ScanOp};

/// Opaque identifier of one search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One scan generation in a session's history.
#[derive(Debug, Clone, Serialize)]
pub struct PassRecord {
    pub generation: u64,
    /// `None` for New Search and Refresh passes.
    pub op: Option<ScanOp>,
    pub survivors: usize,
    pub at: DateTime<Local>,
}

/// Serializable description of a session's state, for operator reports.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session: SessionId,
    pub spec: TypeSpec,
    pub ranges: Vec<AddressRange>,
    pub include_readonly: bool,
    pub started_at: DateTime<Local>,
    pub generation: u64,
    pub candidate_count: usize,
    pub passes: Vec<PassRecord>,
}

struct SearchSession<A: MemoryAccessor> {
    engine: ScanEngine<A>,
    ranges: Vec<AddressRange>,
    include_readonly: bool,
    started_at: DateTime<Local>,
    passes: Vec<PassRecord>,
}

impl<A: MemoryAccessor> SearchSession<A> {
    fn record_pass(&mut self, op: Option<ScanOp>) {
        self.passes.push(PassRecord {
            generation: self.engine.generation(),
            op,
            survivors: self.engine.candidates().len(),
            at: Local::now(),
        });
    }
}

/// Owner of all live search sessions over one memory accessor.
pub struct SessionManager<A: MemoryAccessor + Clone> {
    accessor: A,
    sessions: HashMap<u64, SearchSession<A>>,
    next_id: u64,
    cancel: Option<CancelToken>,
}

impl<A: MemoryAccessor + Clone> SessionManager<A> {
    pub fn new(accessor: A) -> Self {
        Self {
            accessor,
            sessions: HashMap::new(),
            next_id: 1,
            cancel: None,
        }
    }

    /// Attach a cancellation token honored by every session's passes.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        for session in self.sessions.values_mut() {
            session.engine.set_cancel_token(token.clone());
        }
        self.cancel = Some(token);
    }

    /// Open a new search session and run its initial scan.
    ///
    /// # Errors
    ///
    /// Propagates range validation and [`Error::RangeUnmapped`] failures;
    /// no session is created on error.
    pub fn new_search(
        &mut self,
        ranges: Vec<AddressRange>,
        spec: TypeSpec,
        include_readonly: bool,
    ) -> Result<SessionId> {
        let mut engine = ScanEngine::new(self.accessor.clone(), spec);
        if let Some(token) = &self.cancel {
            engine.set_cancel_token(token.clone());
        }
        engine.new_search(&ranges, include_readonly)?;

        let id = self.next_id;
        self.next_id += 1;
        let mut session = SearchSession {
            engine,
            ranges,
            include_readonly,
            started_at: Local::now(),
            passes: Vec::new(),
        };
        session.record_pass(None);
        self.sessions.insert(id, session);
        info!("opened search session #{id}");
        Ok(SessionId(id))
    }

    /// Narrow a session's candidate set with `predicate`.
    ///
    /// An all-eliminated pass is recorded in the session history and
    /// reported as [`Error::EmptyCandidateSet`]; the session stays valid.
    pub fn search_within(
        &mut self,
        session: SessionId,
        predicate: &ComparisonPredicate,
    ) -> Result<usize> {
        let entry = self.session_mut(session)?;
        let result = entry.engine.search_within(predicate);
        match &result {
            Ok(_) | Err(Error::EmptyCandidateSet) => entry.record_pass(Some(predicate.op())),
            Err(_) => {}
        }
        result
    }

    /// Re-read a session's candidates without narrowing.
    pub fn refresh(&mut self, session: SessionId) -> Result<usize> {
        let entry = self.session_mut(session)?;
        let count = entry.engine.refresh()?;
        entry.record_pass(None);
        Ok(count)
    }

    /// Iterate a session's candidates in ascending address order.
    ///
    /// The iterator borrows the session; each call restarts from the
    /// lowest address.
    pub fn list(&self, session: SessionId) -> Result<impl Iterator<Item = &Candidate>> {
        Ok(self.session(session)?.engine.list())
    }

    pub fn candidate_count(&self, session: SessionId) -> Result<usize> {
        Ok(self.session(session)?.engine.candidates().len())
    }

    /// Borrow a session's engine, e.g. for snapshot or report rendering.
    pub fn engine(&self, session: SessionId) -> Result<&ScanEngine<A>> {
        Ok(&self.session(session)?.engine)
    }

    /// Encode `value` under the session's spec and write it at `address`.
    pub fn write_candidate(
        &mut self,
        session: SessionId,
        address: u64,
        value: &DecodedValue,
    ) -> Result<()> {
        self.session(session)?.engine.write_value(address, value)
    }

    pub fn summary(&self, session: SessionId) -> Result<SessionSummary> {
        let entry = self.session(session)?;
        Ok(SessionSummary {
            session,
            spec: entry.engine.spec().clone(),
            ranges: entry.ranges.clone(),
            include_readonly: entry.include_readonly,
            started_at: entry.started_at,
            generation: entry.engine.generation(),
            candidate_count: entry.engine.candidates().len(),
            passes: entry.passes.clone(),
        })
    }

    /// Drop a session and its candidate set.
    pub fn end_session(&mut self, session: SessionId) -> Result<()> {
        self.sessions
            .remove(&session.0)
            .map(|_| info!("closed search session {session}"))
            .ok_or(Error::SessionNotFound(session.0))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, id: SessionId) -> Result<&SearchSession<A>> {
        self.sessions
            .get(&id.0)
            .ok_or(Error::SessionNotFound(id.0))
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut SearchSession<A>> {
        self.sessions
            .get_mut(&id.0)
            .ok_or(Error::SessionNotFound(id.0))
    }
}
