//! # memsift-core
//!
//! Live memory search engine for emulator debugging: locate the addresses
//! holding a piece of game state by repeatedly sampling memory and
//! narrowing a candidate set with comparison predicates across scan
//! generations.
//!
//! This crate provides:
//! - Typed decoding of raw memory bytes (`codec`)
//! - The memory accessor boundary and buffer-backed address spaces (`memory`)
//! - Candidate sets, snapshots, predicates, and the scan engine (`scan`)
//! - Console and JSON output of candidate listings (`export`)
//!
//! The host system owns memory and keeps running while scans are in
//! flight; every pass is a best-effort point-in-time sample.

pub mod codec;
pub mod error;
pub mod export;
pub mod memory;
pub mod scan;

pub use codec::{DecodedValue, NumeralBase, Signedness, TypeSpec, Width};
pub use error::{Error, Result};
pub use export::{CandidateRow, ScanReport, render_console};
pub use memory::{
    AddressRange, ChunkedRangeReader, MemoryAccessor, SharedMemory, SharedMemoryBuilder,
};
pub use scan::{
    CancelToken, Candidate, CandidateSet, ComparisonPredicate, PassRecord, ScanEngine, ScanOp,
    SessionId, SessionManager, SessionSummary, Snapshot,
};
