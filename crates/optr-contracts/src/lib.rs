//! # optr-contracts
//!
//! Shared types for the OPTR hash-chained ledger.
//!
//! All crates in the workspace import from here. No I/O or hashing lives in
//! this crate, only data definitions and error types.

pub mod error;
pub mod event;
pub mod verify;
