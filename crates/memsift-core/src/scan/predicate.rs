//! Comparison predicates driving successive narrowing.
//!
//! A predicate is pure and stateless: given a candidate's previous and
//! current values it answers whether the candidate survives the pass.
//! Everything that can be rejected up front (a missing literal, an
//! operand of the wrong kind, an ordering operator on text) is rejected
//! at construction, before any memory is touched.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::codec::{self, DecodedValue, TypeSpec};
use crate::error::{Error, Result};

/// Comparison operator applied when narrowing a candidate set.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum ScanOp {
    /// `current == literal`.
    #[strum(serialize = "equal")]
    Equal,
    /// `current > literal`, ordered per the spec's signedness.
    #[strum(serialize = "greater")]
    Greater,
    /// `current < literal`.
    #[strum(serialize = "less")]
    Less,
    /// `current != previous` ("unknown value" narrowing).
    #[strum(serialize = "changed")]
    Changed,
    /// `current - previous == literal`, width-modulo subtraction.
    #[strum(serialize = "changed-by")]
    ChangedBy,
    /// `current == previous`.
    #[strum(serialize = "unchanged")]
    Unchanged,
    /// `current > previous`.
    #[strum(serialize = "increased")]
    Increased,
    /// `current < previous`.
    #[strum(serialize = "decreased")]
    Decreased,
}

impl ScanOp {
    /// Whether this operator compares against an operator-supplied literal.
    pub fn requires_operand(self) -> bool {
        matches!(
            self,
            ScanOp::Equal | ScanOp::Greater | ScanOp::Less | ScanOp::ChangedBy
        )
    }

    /// Whether this operator needs a previous value to compare against.
    ///
    /// New Search seeds every candidate with `previous = None`, so these
    /// operators drop everything until a pass has established a baseline.
    pub fn requires_previous(self) -> bool {
        matches!(
            self,
            ScanOp::Changed
                | ScanOp::ChangedBy
                | ScanOp::Unchanged
                | ScanOp::Increased
                | ScanOp::Decreased
        )
    }

    /// Text runs support byte equality and change detection only.
    pub fn supported_for(self, spec: &TypeSpec) -> bool {
        !spec.is_text() || matches!(self, ScanOp::Equal | ScanOp::Changed)
    }
}

/// A narrowing rule: an operator plus its literal operand when required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPredicate {
    op: ScanOp,
    operand: Option<DecodedValue>,
}

impl ComparisonPredicate {
    /// Build a predicate for searches over `spec`-typed candidates.
    ///
    /// # Errors
    ///
    /// Rejects operators the spec's kind does not support, a missing or
    /// superfluous literal, and literals not representable under `spec`.
    pub fn new(op: ScanOp, operand: Option<DecodedValue>, spec: &TypeSpec) -> Result<Self> {
        if !op.supported_for(spec) {
            return Err(Error::UnsupportedPredicateForKind {
                op,
                kind: spec.kind_name(),
            });
        }
        match (&operand, op.requires_operand()) {
            (None, true) => return Err(Error::MissingOperand(op)),
            (Some(_), false) => return Err(Error::UnexpectedOperand(op)),
            (Some(value), true) => {
                // The encode range check doubles as kind/width validation.
                codec::encode(value, spec)?;
            }
            (None, false) => {}
        }
        Ok(Self { op, operand })
    }

    pub fn op(&self) -> ScanOp {
        self.op
    }

    pub fn operand(&self) -> Option<&DecodedValue> {
        self.operand.as_ref()
    }

    /// Re-check this predicate against a session's spec.
    ///
    /// Guards the session surface: a predicate built for one session may
    /// be submitted to another with a different spec.
    pub fn check_spec(&self, spec: &TypeSpec) -> Result<()> {
        if !self.op.supported_for(spec) {
            return Err(Error::UnsupportedPredicateForKind {
                op: self.op,
                kind: spec.kind_name(),
            });
        }
        if let Some(value) = &self.operand {
            codec::encode(value, spec)?;
        }
        Ok(())
    }

    /// Evaluate one candidate's value window.
    ///
    /// Operators that need a previous value are false while `previous` is
    /// `None`; the candidate is dropped rather than given the benefit of
    /// the doubt.
    pub fn evaluate(
        &self,
        previous: Option<&DecodedValue>,
        current: &DecodedValue,
        spec: &TypeSpec,
    ) -> bool {
        match self.op {
            ScanOp::Equal => self.operand.as_ref() == Some(current),
            ScanOp::Greater => self
                .operand
                .as_ref()
                .and_then(|literal| codec::compare(current, literal))
                == Some(Ordering::Greater),
            ScanOp::Less => self
                .operand
                .as_ref()
                .and_then(|literal| codec::compare(current, literal))
                == Some(Ordering::Less),
            ScanOp::Changed => previous.is_some_and(|p| p != current),
            ScanOp::Unchanged => previous.is_some_and(|p| p == current),
            ScanOp::Increased => previous
                .and_then(|p| codec::compare(current, p))
                == Some(Ordering::Greater),
            ScanOp::Decreased => previous
                .and_then(|p| codec::compare(current, p))
                == Some(Ordering::Less),
            ScanOp::ChangedBy => {
                let (TypeSpec::Numeric { width, .. }, Some(previous), Some(literal)) =
                    (spec, previous, self.operand.as_ref())
                else {
                    return false;
                };
                codec::width_delta(current, previous, *width)
                    == literal.raw_bits() & width.mask()
            }
        }
    }
}
