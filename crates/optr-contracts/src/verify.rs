//! Verification report types.
//!
//! A `VerificationReport` is the result of replaying a ledger. Violations are
//! ordinary data: finding them is the verifier's job, not a failure of it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What went wrong at a given record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The record's `previous_hash` does not match the preceding record's
    /// stored `current_hash`.
    LinkBroken,

    /// The record's stored `current_hash` does not match the hash recomputed
    /// from its own fields.
    HashMismatch,

    /// The record is not a well-formed event (bad JSON, missing or extra
    /// fields, or a torn trailing write).
    Malformed,
}

/// A single integrity violation, pinned to a record index (0-based, in file
/// order, blank lines not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub index: usize,
    pub kind: ViolationKind,
    pub detail: String,
}

impl Violation {
    pub fn link_broken(index: usize, expected: &str, found: &str) -> Self {
        Self {
            index,
            kind: ViolationKind::LinkBroken,
            detail: format!(
                "previous hash mismatch (expected {}…, found {}…)",
                short_hash(expected),
                short_hash(found)
            ),
        }
    }

    pub fn hash_mismatch(index: usize, stored: &str, recomputed: &str) -> Self {
        Self {
            index,
            kind: ViolationKind::HashMismatch,
            detail: format!(
                "hash tampering detected (stored {}…, recomputed {}…)",
                short_hash(stored),
                short_hash(recomputed)
            ),
        }
    }

    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            kind: ViolationKind::Malformed,
            detail: format!("malformed record: {}", reason.into()),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event {}: {}", self.index, self.detail)
    }
}

/// The outcome of verifying a whole ledger.
///
/// Callers must treat `valid == false` as a hard trust failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True iff `violations` is empty.
    pub valid: bool,
    /// Number of records examined, malformed ones included.
    pub total_events: usize,
    /// Every violation found, in record order.
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    /// The report for a ledger that does not exist: vacuously intact.
    pub fn empty() -> Self {
        Self::from_violations(0, Vec::new())
    }

    pub fn from_violations(total_events: usize, violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            total_events,
            violations,
        }
    }

    /// Violations recorded against the record at `index`.
    pub fn violations_at(&self, index: usize) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.index == index)
    }
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(16).collect()
}
