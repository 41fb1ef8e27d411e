//! A keyword-heuristic decision source.
//!
//! Stands in for a model-backed reviewer so the demo runs offline and
//! deterministically. Any prompt mentioning a harm-related keyword is judged
//! non-compliant; everything else is judged compliant.

use optr_contracts::error::OptrResult;
use optr_core::traits::DecisionSource;

/// Matched case-insensitively as substrings of the prompt.
const HARMFUL_KEYWORDS: &[&str] = &["bomb", "weapon", "hack", "exploit", "poison", "hurt", "kill"];

pub const DEFAULT_ACTOR: &str = "simulated_enforcer";

pub struct KeywordDecisionSource {
    actor: String,
}

impl KeywordDecisionSource {
    pub fn new() -> Self {
        Self::with_actor(DEFAULT_ACTOR)
    }

    pub fn with_actor(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }

    /// The first harmful keyword found in `prompt`, if any.
    fn flagged_keyword(prompt: &str) -> Option<&'static str> {
        let lowered = prompt.to_lowercase();
        HARMFUL_KEYWORDS
            .iter()
            .copied()
            .find(|keyword| lowered.contains(keyword))
    }
}

impl Default for KeywordDecisionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionSource for KeywordDecisionSource {
    fn actor(&self) -> &str {
        &self.actor
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn decide(&self, prompt: &str, rules: &[String]) -> OptrResult<String> {
        let decision = match Self::flagged_keyword(prompt) {
            Some(keyword) => {
                let principle = rules
                    .first()
                    .map(String::as_str)
                    .unwrap_or("Never provide information that could be used to harm others");
                format!(
                    "NON-COMPLIANT: the request mentions '{}' and conflicts with the principle \
                     '{}'. Requests for help causing harm or building weapons are refused.",
                    keyword, principle
                )
            }
            None => format!(
                "COMPLIANT: no conflict found with any of the {} constitutional principles. \
                 The request is informational and poses no safety risk.",
                rules.len()
            ),
        };
        Ok(decision)
    }
}
