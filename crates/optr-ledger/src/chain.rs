//! Hash-chain primitives: sealing, hashing, and chain verification.
//!
//! Hash input layout (bytes, in order):
//!   1. previous_hash as UTF-8 bytes (64 ASCII hex chars)
//!   2. canonical JSON of every field except current_hash
//!
//! Canonical JSON is compact (no insignificant whitespace) with object keys
//! sorted at every depth, so the same field values always hash the same no
//! matter how `metadata` was built.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use optr_contracts::{
    error::{OptrError, OptrResult},
    event::{EventDraft, LedgerEvent, Metadata},
    verify::Violation,
};

/// Every hashed field of a `LedgerEvent`: all of them except `current_hash`.
#[derive(Serialize)]
struct HashedFields<'a> {
    timestamp: &'a str,
    event_id: &'a str,
    event_type: &'a str,
    actor: &'a str,
    action: &'a str,
    input: &'a Option<String>,
    decision: &'a Option<String>,
    metadata: &'a Option<Metadata>,
    previous_hash: &'a str,
}

impl<'a> From<&'a LedgerEvent> for HashedFields<'a> {
    fn from(event: &'a LedgerEvent) -> Self {
        Self {
            timestamp: &event.timestamp,
            event_id: &event.event_id,
            event_type: &event.event_type,
            actor: &event.actor,
            action: &event.action,
            input: &event.input,
            decision: &event.decision,
            metadata: &event.metadata,
            previous_hash: &event.previous_hash,
        }
    }
}

/// Canonical JSON of `event` with `current_hash` excluded.
pub fn canonical_json(event: &LedgerEvent) -> OptrResult<String> {
    let value =
        serde_json::to_value(HashedFields::from(event)).map_err(|e| OptrError::Serialization {
            reason: format!("failed to convert event '{}': {}", event.event_id, e),
        })?;

    serde_json::to_string(&sort_keys(value)).map_err(|e| OptrError::Serialization {
        reason: format!("failed to encode event '{}': {}", event.event_id, e),
    })
}

// Rebuild objects in key order. Holds whether or not serde_json's map keeps
// insertion order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Compute the SHA-256 hash for `event` from its stored fields.
///
/// `event.current_hash` is ignored. Returns a lowercase 64-character hex
/// string.
pub fn hash_event(event: &LedgerEvent) -> OptrResult<String> {
    let canonical = canonical_json(event)?;

    let mut hasher = Sha256::new();
    hasher.update(event.previous_hash.as_bytes());
    hasher.update(canonical.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

/// Turn a draft into a fully linked, hashed event stamped at `at`.
///
/// `timestamp` and `event_id` both derive from `at`. Absent metadata is
/// stored as an empty object.
pub fn seal(draft: EventDraft, previous_hash: String, at: DateTime<Utc>) -> OptrResult<LedgerEvent> {
    draft.validate()?;

    let mut event = LedgerEvent {
        timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        event_id: format!("evt_{}", at.timestamp_millis()),
        event_type: draft.event_type,
        actor: draft.actor,
        action: draft.action,
        input: draft.input,
        decision: draft.decision,
        metadata: Some(draft.metadata.unwrap_or_default()),
        previous_hash,
        current_hash: String::new(),
    };
    event.current_hash = hash_event(&event)?;

    Ok(event)
}

/// True for a 64-character lowercase hex string.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Check one event against the chain.
///
/// The link check runs only when `expected_previous` is known; after a
/// malformed record there is no trustworthy hash to compare against.
pub(crate) fn check_event(
    index: usize,
    event: &LedgerEvent,
    expected_previous: Option<&str>,
    violations: &mut Vec<Violation>,
) {
    if let Some(expected) = expected_previous {
        if event.previous_hash != expected {
            violations.push(Violation::link_broken(index, expected, &event.previous_hash));
        }
    }

    match hash_event(event) {
        Ok(recomputed) if recomputed != event.current_hash => {
            violations.push(Violation::hash_mismatch(index, &event.current_hash, &recomputed));
        }
        Ok(_) => {}
        Err(e) => violations.push(Violation::malformed(index, e.to_string())),
    }
}

/// Verify an in-memory sequence of events.
///
/// Applies both rules to every event and collects all violations:
///
/// 1. **Linkage**: `previous_hash` equals the preceding event's stored
///    `current_hash` (or `GENESIS_HASH` for event 0).
/// 2. **Content**: `current_hash` equals the hash recomputed from the event.
///
/// The chain advances on the *stored* hash, so one edited event yields one
/// violation instead of failing every link after it. An empty slice has no
/// violations.
pub fn verify_events(events: &[LedgerEvent]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut expected: &str = LedgerEvent::GENESIS_HASH;

    for (index, event) in events.iter().enumerate() {
        check_event(index, event, Some(expected), &mut violations);
        expected = event.current_hash.as_str();
    }

    violations
}
