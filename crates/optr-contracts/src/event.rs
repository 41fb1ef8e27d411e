//! Ledger event types.
//!
//! `EventDraft` is what a caller hands to the ledger. `LedgerEvent` is what
//! the ledger stores: the draft plus a timestamp, an identifier, and the two
//! hashes that link it into the chain.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OptrError, OptrResult};

/// Free-form event metadata: string keys mapped to arbitrary JSON values.
pub type Metadata = Map<String, Value>;

/// A single record in the hash-chained ledger.
///
/// Once appended a record is never modified. Editing any field on disk
/// invalidates `current_hash`, which the verifier detects.
///
/// Unknown fields are rejected on read: they would not be covered by the
/// hash and could be injected without detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerEvent {
    /// Creation time, UTC, RFC 3339 with millisecond precision
    /// (e.g. `2026-10-19T08:15:02.117Z`). Hashed exactly as stored.
    pub timestamp: String,

    /// `evt_<epoch millis>`, derived from the same instant as `timestamp`.
    pub event_id: String,

    pub event_type: String,
    pub actor: String,
    pub action: String,

    /// The input that was evaluated, if any.
    pub input: Option<String>,

    /// The decision text produced for `input`, if any.
    pub decision: Option<String>,

    pub metadata: Option<Metadata>,

    /// `current_hash` of the preceding record, or `GENESIS_HASH`.
    pub previous_hash: String,

    /// SHA-256 (lowercase hex) over `previous_hash` followed by the canonical
    /// JSON of every other field.
    pub current_hash: String,
}

impl LedgerEvent {
    /// The `previous_hash` of the first event in a ledger: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// True if this event claims to be the first in its ledger.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == Self::GENESIS_HASH
    }

    /// Look up a boolean flag in `metadata`, e.g. `is_compliant`.
    pub fn metadata_flag(&self, key: &str) -> Option<bool> {
        self.metadata.as_ref()?.get(key)?.as_bool()
    }
}

/// The caller-supplied part of an event.
///
/// ```rust,ignore
/// let draft = EventDraft::new("constitutional_ai_check", "simulated_enforcer", "enforce")
///     .with_input("Explain photosynthesis")
///     .with_decision("COMPLIANT: educational request");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub event_type: String,
    pub actor: String,
    pub action: String,
    pub input: Option<String>,
    pub decision: Option<String>,
    pub metadata: Option<Metadata>,
}

impl EventDraft {
    pub fn new(
        event_type: impl Into<String>,
        actor: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            actor: actor.into(),
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_decision(mut self, decision: impl Into<String>) -> Self {
        self.decision = Some(decision.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check the append preconditions.
    ///
    /// `event_type`, `actor` and `action` must be non-empty after trimming.
    /// Returns `OptrError::InvalidEvent` naming the first empty field.
    pub fn validate(&self) -> OptrResult<()> {
        let required = [
            ("event_type", &self.event_type),
            ("actor", &self.actor),
            ("action", &self.action),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(OptrError::InvalidEvent {
                    reason: format!("'{}' must not be empty", field),
                });
            }
        }
        Ok(())
    }
}
