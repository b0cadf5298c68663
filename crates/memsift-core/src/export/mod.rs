//! Candidate listing output: colored console tables and JSON reports.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::codec::{TypeSpec, format_value};
use crate::error::Result;
use crate::scan::CandidateSet;

/// Row in a serialized candidate listing.
///
/// Values are pre-rendered under the session spec's numeral base so the
/// report reads the way the operator configured the search.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRow {
    pub address: String,
    pub previous: Option<String>,
    pub current: String,
    pub changed: bool,
}

/// Serializable result of a scan pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Local>,
    pub spec: TypeSpec,
    pub generation: u64,
    pub candidate_count: usize,
    /// True when `candidates` was capped below the full set size.
    pub truncated: bool,
    pub candidates: Vec<CandidateRow>,
}

impl ScanReport {
    /// Build a report from the current candidate set.
    ///
    /// `limit` caps the number of serialized rows; the full count is
    /// always reported in `candidate_count`.
    pub fn from_candidates(set: &CandidateSet, generation: u64, limit: Option<usize>) -> Self {
        let cap = limit.unwrap_or(usize::MAX);
        let candidates: Vec<CandidateRow> = set
            .iter()
            .take(cap)
            .map(|c| CandidateRow {
                address: format!("{:#x}", c.address),
                previous: c.previous.as_ref().map(|v| format_value(v, set.spec())),
                current: format_value(&c.current, set.spec()),
                changed: c
                    .previous
                    .as_ref()
                    .is_some_and(|previous| previous != &c.current),
            })
            .collect();

        ScanReport {
            generated_at: Local::now(),
            spec: set.spec().clone(),
            generation,
            candidate_count: set.len(),
            truncated: candidates.len() < set.len(),
            candidates,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Render a candidate listing for the console.
///
/// Shows at most `limit` rows with an overflow line, addresses in cyan,
/// and values whose previous/current window moved highlighted in yellow.
pub fn render_console(set: &CandidateSet, limit: usize) -> String {
    let mut output = String::new();

    let header = format!(
        "{:<12} {:>14} {:>14}",
        "ADDRESS", "PREVIOUS", "CURRENT"
    );
    let _ = writeln!(output, "{}", header.dimmed());

    for candidate in set.iter().take(limit) {
        let address = format!("{:#010x}", candidate.address);
        let previous = candidate
            .previous
            .as_ref()
            .map(|v| format_value(v, set.spec()))
            .unwrap_or_else(|| "-".to_string());
        let current = format_value(&candidate.current, set.spec());
        let changed = candidate
            .previous
            .as_ref()
            .is_some_and(|previous| previous != &candidate.current);

        if changed {
            let _ = writeln!(
                output,
                "{:<12} {:>14} {:>14}",
                address.cyan(),
                previous,
                current.yellow()
            );
        } else {
            let _ = writeln!(
                output,
                "{:<12} {:>14} {:>14}",
                address.cyan(),
                previous,
                current
            );
        }
    }

    if set.len() > limit {
        let overflow = format!("... and {} more", set.len() - limit);
        let _ = writeln!(output, "{}", overflow.dimmed());
    }

    output
}
