//! The constitutional enforcer: the ledger's primary writer.
//!
//! Per check:
//!
//!   DecisionSource::decide → classify → EventLedger::append → outcome
//!
//! The outcome carries the appended event's id and hash, so a caller can
//! only act on a decision that is already on record.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use optr_contracts::{
    error::OptrResult,
    event::{EventDraft, Metadata},
};

use crate::traits::{DecisionSource, EventLedger};

/// `event_type` recorded for every enforcement check.
pub const CHECK_EVENT_TYPE: &str = "constitutional_ai_check";

/// `action` recorded for every enforcement check.
pub const ENFORCE_ACTION: &str = "enforce_constitutional_constraint";

/// What the caller learns from one enforcement check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementOutcome {
    pub compliant: bool,
    pub decision: String,
    /// `event_id` of the ledger record for this check.
    pub event_id: String,
    /// `current_hash` of the ledger record for this check.
    pub hash: String,
}

/// Runs prompts through a `DecisionSource` and records every decision.
pub struct Enforcer {
    source: Box<dyn DecisionSource>,
    ledger: Box<dyn EventLedger>,
    rules: Vec<String>,
    session_id: Uuid,
}

impl Enforcer {
    /// Create an enforcer with a fresh random session id.
    pub fn new(
        source: Box<dyn DecisionSource>,
        ledger: Box<dyn EventLedger>,
        rules: Vec<String>,
    ) -> Self {
        Self {
            source,
            ledger,
            rules,
            session_id: Uuid::new_v4(),
        }
    }

    /// Stamped into the metadata of every event this enforcer writes.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn ledger(&self) -> &dyn EventLedger {
        self.ledger.as_ref()
    }

    /// Evaluate `prompt` and append the decision to the ledger.
    ///
    /// `context` is stored under `metadata.context` (an empty object when
    /// absent). Errors from the decision source or the ledger propagate; in
    /// either case no outcome is returned.
    pub fn check(&self, prompt: &str, context: Option<Metadata>) -> OptrResult<EnforcementOutcome> {
        debug!(
            session_id = %self.session_id,
            actor = %self.source.actor(),
            rule_count = self.rules.len(),
            "evaluating prompt"
        );

        let decision = self.source.decide(prompt, &self.rules)?;
        let compliant = is_compliant(&decision);

        let mut metadata = Metadata::new();
        metadata.insert("constitutional_rules".to_string(), json!(self.rules));
        metadata.insert("is_compliant".to_string(), Value::Bool(compliant));
        metadata.insert(
            "context".to_string(),
            Value::Object(context.unwrap_or_default()),
        );
        metadata.insert(
            "simulated".to_string(),
            Value::Bool(self.source.is_simulated()),
        );
        metadata.insert(
            "session_id".to_string(),
            Value::String(self.session_id.to_string()),
        );

        let draft = EventDraft::new(CHECK_EVENT_TYPE, self.source.actor(), ENFORCE_ACTION)
            .with_input(prompt)
            .with_decision(decision.clone())
            .with_metadata(metadata);

        let event = self.ledger.append(draft)?;

        if compliant {
            info!(event_id = %event.event_id, "prompt compliant");
        } else {
            warn!(event_id = %event.event_id, "prompt blocked as non-compliant");
        }

        Ok(EnforcementOutcome {
            compliant,
            decision,
            event_id: event.event_id,
            hash: event.current_hash,
        })
    }
}

/// Classify decision text.
///
/// Compliant when it starts with `COMPLIANT` or mentions `APPROVED`.
/// `NON-COMPLIANT: …` therefore classifies as non-compliant.
pub fn is_compliant(decision: &str) -> bool {
    decision.starts_with("COMPLIANT") || decision.contains("APPROVED")
}
