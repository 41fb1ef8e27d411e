//! # optr-ledger
//!
//! Append-only, SHA-256 hash-chained event ledger stored as JSON Lines.
//!
//! ## Overview
//!
//! Each appended event records the `current_hash` of the event before it in
//! `previous_hash`, and its own `current_hash` commits to that link plus every
//! other field. Editing, deleting, or reordering records breaks the chain, and
//! `verify` reports where.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use optr_contracts::event::EventDraft;
//! use optr_core::traits::EventLedger;
//! use optr_ledger::{JsonlLedger, LedgerConfig};
//!
//! let ledger = JsonlLedger::new(LedgerConfig::new("outputs/ledger.jsonl"));
//! ledger.init()?;
//! let event = ledger.append(EventDraft::new("check", "enforcer", "enforce"))?;
//! assert!(ledger.verify()?.valid);
//! ```

pub mod chain;
pub mod config;
pub mod jsonl;
pub mod schema;

pub use chain::{canonical_json, hash_event, seal, verify_events};
pub use config::LedgerConfig;
pub use jsonl::JsonlLedger;

// ── Tests ─────────────────────────────────────────────────────────────────────
