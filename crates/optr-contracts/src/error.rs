//! Error types for the OPTR ledger.
//!
//! Every fallible operation returns `OptrResult<T>`. Chain violations found
//! during verification are not errors; they are reported as data in
//! `VerificationReport`.

use thiserror::Error;

/// The unified error type for the OPTR crates.
#[derive(Debug, Error)]
pub enum OptrError {
    /// The ledger file could not be read or written.
    ///
    /// Never retried internally. The caller decides on retry or backoff.
    #[error("ledger storage error: {reason}")]
    Storage { reason: String },

    /// An existing record could not be parsed as a well-formed event.
    ///
    /// Raised when deriving the previous hash for an append, or when reading
    /// events. Appending on top of a malformed record would silently start a
    /// disconnected chain, so it is refused.
    #[error("malformed ledger record: {reason}")]
    MalformedRecord { reason: String },

    /// An event draft failed its preconditions (e.g. an empty `actor`).
    #[error("invalid event: {reason}")]
    InvalidEvent { reason: String },

    /// The canonical form of an event could not be produced.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A configuration file is missing, unreadable, or does not match the schema.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The built-in record schema could not be compiled.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },

    /// A decision source failed to produce a decision.
    #[error("decision failed: {reason}")]
    DecisionFailed { reason: String },
}

/// Convenience alias used throughout the OPTR crates.
pub type OptrResult<T> = Result<T, OptrError>;
