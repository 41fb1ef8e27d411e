//! Core trait definitions for OPTR.
//!
//! - `EventLedger`: the trusted, append-only record (hash-chained)
//! - `DecisionSource`: untrusted decision logic (heuristic or model-backed)
//!
//! The `Enforcer` wires them together: a decision is only ever reported to
//! the caller after it has been appended to the ledger.

use optr_contracts::{
    error::OptrResult,
    event::{EventDraft, LedgerEvent},
    verify::VerificationReport,
};

/// An append-only, tamper-evident event ledger.
///
/// Implementations support a single writer. Running two writers against the
/// same store can fork the chain; deployments that need more than one writer
/// must hold an external lock across each `append`.
pub trait EventLedger: Send + Sync {
    /// Link `draft` to the current chain head, hash it, and persist it.
    ///
    /// Returns the fully populated event. Fails with `Storage` on I/O errors
    /// and `MalformedRecord` if the current head cannot be parsed.
    fn append(&self, draft: EventDraft) -> OptrResult<LedgerEvent>;

    /// Return events in append order; with `Some(k)`, only the last `k`.
    fn read(&self, limit: Option<usize>) -> OptrResult<Vec<LedgerEvent>>;

    /// Replay the whole ledger and report every integrity violation.
    ///
    /// Never aborts on a bad record. Only storage failures are errors.
    fn verify(&self) -> OptrResult<VerificationReport>;
}

/// Produces decision text for a prompt under a set of constitutional rules.
///
/// The ledger treats the returned string as opaque. How it was produced
/// (keyword heuristic, remote model, human reviewer) is invisible to it.
pub trait DecisionSource: Send + Sync {
    /// The actor name recorded on every event this source decides.
    fn actor(&self) -> &str;

    /// True when decisions are simulated rather than produced by a model.
    fn is_simulated(&self) -> bool;

    /// Evaluate `prompt` against `rules`.
    ///
    /// By convention the text starts with `COMPLIANT:` or `NON-COMPLIANT:`.
    fn decide(&self, prompt: &str, rules: &[String]) -> OptrResult<String>;
}
