//! # optr-core
//!
//! The seams of the OPTR system and the callers built on them.
//!
//! This crate provides:
//! - The `EventLedger` and `DecisionSource` traits
//! - The `Enforcer`, which records every decision before reporting it
//! - `ComplianceReport`, which summarizes a ledger and refuses to state a
//!   compliance rate for a chain that fails verification
//!
//! ## Usage
//!
//! ```rust,ignore
//! use optr_core::{Enforcer, ComplianceReport};
//!
//! let enforcer = Enforcer::new(Box::new(source), Box::new(ledger), rules);
//! let outcome = enforcer.check("Explain photosynthesis", None)?;
//! println!("{}", ComplianceReport::build(enforcer.ledger())?);
//! ```

pub mod enforcer;
pub mod report;
pub mod traits;

pub use enforcer::{is_compliant, EnforcementOutcome, Enforcer};
pub use report::ComplianceReport;

// ── Tests ─────────────────────────────────────────────────────────────────────
