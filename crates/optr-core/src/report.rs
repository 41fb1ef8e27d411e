//! Compliance reporting over a ledger.
//!
//! A report combines `read()` and `verify()`. A chain that fails verification
//! is a trust failure: the report still lists what it can, but it never
//! states a compliance rate for an unverified chain.

use std::fmt;

use tracing::warn;

use optr_contracts::{
    error::{OptrError, OptrResult},
    event::LedgerEvent,
    verify::VerificationReport,
};

use crate::traits::EventLedger;

/// Number of trailing events listed under "Recent Events".
pub const RECENT_EVENTS: usize = 5;

/// Characters of each hash shown in the rendered report.
const HASH_PREFIX: usize = 32;

/// A snapshot of compliance statistics and chain integrity.
#[derive(Debug, Clone)]
pub struct ComplianceReport {
    pub verification: VerificationReport,
    /// Events that could be read, in append order.
    pub event_count: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    /// The last `RECENT_EVENTS` events, oldest first.
    pub recent: Vec<LedgerEvent>,
    pub first_hash: Option<String>,
    pub last_hash: Option<String>,
}

impl ComplianceReport {
    /// Verify `ledger`, read it, and tally `metadata.is_compliant`.
    ///
    /// Events without the flag count as non-compliant. If the chain is broken
    /// badly enough that it cannot be read, the report carries the
    /// verification result and no event statistics.
    pub fn build(ledger: &dyn EventLedger) -> OptrResult<Self> {
        let verification = ledger.verify()?;

        let events = match ledger.read(None) {
            Ok(events) => events,
            Err(OptrError::MalformedRecord { reason }) if !verification.valid => {
                warn!(%reason, "ledger unreadable; reporting integrity failure only");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let compliant = events
            .iter()
            .filter(|e| e.metadata_flag("is_compliant").unwrap_or(false))
            .count();
        let recent_start = events.len().saturating_sub(RECENT_EVENTS);

        Ok(Self {
            event_count: events.len(),
            compliant,
            non_compliant: events.len() - compliant,
            recent: events[recent_start..].to_vec(),
            first_hash: events.first().map(|e| e.current_hash.clone()),
            last_hash: events.last().map(|e| e.current_hash.clone()),
            verification,
        })
    }

    /// Whether the chain verified.
    pub fn is_trusted(&self) -> bool {
        self.verification.valid
    }

    /// Percentage of compliant events.
    ///
    /// `None` for an empty ledger and, unconditionally, for an untrusted one.
    pub fn compliance_rate(&self) -> Option<f64> {
        if !self.is_trusted() || self.event_count == 0 {
            return None;
        }
        Some(self.compliant as f64 * 100.0 / self.event_count as f64)
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_trusted() && self.event_count == 0 {
            return writeln!(f, "No compliance events recorded");
        }

        let integrity = if self.is_trusted() { "VALID" } else { "INVALID" };

        writeln!(f, "Constitutional AI Compliance Report")?;
        writeln!(f, "===================================")?;
        writeln!(f)?;
        writeln!(f, "Ledger Integrity: {}", integrity)?;
        writeln!(f, "Total Events: {}", self.verification.total_events)?;
        writeln!(f, "Hash Chain Violations: {}", self.verification.violations.len())?;

        if !self.is_trusted() {
            writeln!(f)?;
            writeln!(f, "TRUST FAILURE: the hash chain did not verify.")?;
            writeln!(f, "The figures below cannot be relied on.")?;
            for violation in &self.verification.violations {
                writeln!(f, "  - {}", violation)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Compliance Summary:")?;
        writeln!(f, "- Compliant Decisions: {}", self.compliant)?;
        writeln!(f, "- Non-Compliant Decisions: {}", self.non_compliant)?;
        match self.compliance_rate() {
            Some(rate) => writeln!(f, "- Compliance Rate: {:.1}%", rate)?,
            None => writeln!(f, "- Compliance Rate: withheld (chain integrity failure)")?,
        }

        writeln!(f)?;
        writeln!(f, "Recent Events (Last {}):", RECENT_EVENTS)?;
        for event in &self.recent {
            let status = match event.metadata_flag("is_compliant") {
                Some(true) => "COMPLIANT",
                _ => "NON-COMPLIANT",
            };
            writeln!(f)?;
            writeln!(f, "Event ID: {}", event.event_id)?;
            writeln!(f, "Time: {}", event.timestamp)?;
            writeln!(f, "Status: {}", status)?;
            writeln!(f, "Hash: {}...", hash_prefix(&event.current_hash))?;
        }

        writeln!(f)?;
        writeln!(f, "Cryptographic Verification:")?;
        if let (Some(first), Some(last)) = (&self.first_hash, &self.last_hash) {
            writeln!(f, "- First Hash: {}...", hash_prefix(first))?;
            writeln!(f, "- Last Hash: {}...", hash_prefix(last))?;
        }
        let chain = if self.is_trusted() { "Verified" } else { "Broken" };
        writeln!(f, "- Chain Integrity: {}", chain)
    }
}

fn hash_prefix(hash: &str) -> String {
    hash.chars().take(HASH_PREFIX).collect()
}
