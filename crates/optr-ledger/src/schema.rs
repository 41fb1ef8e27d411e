//! Structural validation of raw ledger records.
//!
//! Before a record takes part in chain checks, its JSON must match the
//! record schema: all ten fields present, both hashes 64 lowercase hex chars,
//! nothing extra. Structural failures become `Malformed` violations.

use serde_json::{json, Value};

use optr_contracts::error::{OptrError, OptrResult};

/// The JSON Schema every stored record must satisfy.
pub fn record_schema() -> Value {
    let hash = json!({ "type": "string", "pattern": "^[0-9a-f]{64}$" });
    let label = json!({ "type": "string", "minLength": 1 });
    let nullable_text = json!({ "type": ["string", "null"] });

    json!({
        "type": "object",
        "required": [
            "timestamp", "event_id", "event_type", "actor", "action",
            "input", "decision", "metadata", "previous_hash", "current_hash"
        ],
        "additionalProperties": false,
        "properties": {
            "timestamp": label,
            "event_id": label,
            "event_type": label,
            "actor": label,
            "action": label,
            "input": nullable_text,
            "decision": nullable_text,
            "metadata": { "type": ["object", "null"] },
            "previous_hash": hash,
            "current_hash": hash
        }
    })
}

/// A compiled `record_schema()`.
pub struct RecordSchema {
    validator: jsonschema::Validator,
}

impl RecordSchema {
    pub fn new() -> OptrResult<Self> {
        let validator =
            jsonschema::validator_for(&record_schema()).map_err(|e| OptrError::SchemaValidation {
                reason: format!("record schema failed to compile: {}", e),
            })?;
        Ok(Self { validator })
    }

    /// Every schema violation in `record`, as readable messages. Empty when
    /// the record is structurally sound.
    pub fn check(&self, record: &Value) -> Vec<String> {
        self.validator
            .iter_errors(record)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{} at {}", error, path)
                }
            })
            .collect()
    }
}
