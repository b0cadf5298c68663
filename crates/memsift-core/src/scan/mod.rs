mod candidate;
mod engine;
mod predicate;
mod session;
mod snapshot;

pub use candidate::{Candidate, CandidateSet};
pub use engine::{CancelToken, NARROW_CHUNK, ScanEngine};
pub use predicate::{ComparisonPredicate, ScanOp};
pub use session::{PassRecord, SessionId, SessionManager, SessionSummary};
pub use snapshot::Snapshot;
