use thiserror::Error;

use crate::scan::ScanOp;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not enough bytes to decode: needed {needed}, got {available}")]
    InsufficientBytes { needed: usize, available: usize },

    #[error("No readable address in range {start:#x}+{length:#x}")]
    RangeUnmapped { start: u64, length: u64 },

    #[error("Failed to read memory at address {address:#x}: {message}")]
    ReadFailed { address: u64, message: String },

    #[error("Failed to write memory at address {address:#x}: {message}")]
    WriteFailed { address: u64, message: String },

    #[error("Operator '{op}' is not supported for {kind} values")]
    UnsupportedPredicateForKind { op: ScanOp, kind: &'static str },

    #[error("Operator '{0}' requires a literal operand")]
    MissingOperand(ScanOp),

    #[error("Operator '{0}' does not take a literal operand")]
    UnexpectedOperand(ScanOp),

    #[error("Literal operand does not match the search type: {0}")]
    OperandMismatch(String),

    #[error("Value {value} does not fit in {width} byte(s)")]
    ValueOutOfRange { value: String, width: usize },

    #[error("Failed to parse literal {text:?}: {message}")]
    LiteralParse { text: String, message: String },

    #[error("Invalid type spec: {0}")]
    InvalidSpec(String),

    #[error("Invalid address range: {0}")]
    InvalidRange(String),

    #[error("All candidates eliminated")]
    EmptyCandidateSet,

    #[error("Unknown search session: {0}")]
    SessionNotFound(u64),

    #[error("Scan pass cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
