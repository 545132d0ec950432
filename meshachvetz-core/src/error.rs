//! Error taxonomy for the Meshachvetz core.
//!
//! A small, `thiserror`-derived enum that distinguishes fatal conditions
//! (validation, configuration, internal invariant breaches) from the
//! data-shaped conditions the rest of the crate reports through
//! `OptimizationResult` instead of raising (constraint violations, CP
//! infeasibility, budget exhaustion — see `optimizer::OptimizationResult`).

use thiserror::Error;

/// Errors that can surface from loading, configuring, or optimizing a roster.
///
/// Reference errors (a dangling `preferred_friends`/`disliked_peers` ID) and
/// constraint violations are deliberately absent from this enum: the former
/// is downgraded to a `log::warn!` at load time, the latter is surfaced as
/// data in `OptimizationResult.violations`. Neither is ever raised here.
#[derive(Error, Debug)]
pub enum MeshachvetzError {
    /// Malformed input data: bad CSV shape, an out-of-range field, a
    /// duplicate ID. Fatal at load time; the core never sees invalid data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A configuration value is out of range or a weight set does not sum
    /// to 1 (within floating-point epsilon).
    #[error("configuration error: {0}")]
    Config(String),

    /// An internal invariant was violated during optimization, e.g. a move
    /// produced a `class_id` absent from the class set. Identifies the
    /// offending student ID and operation so the failure can be located.
    #[error("internal invariant breach: {0}")]
    Invariant(String),

    /// Failure to read, write, or parse a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure to parse or serialize a CSV roster.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failure to parse or serialize a configuration or result as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MeshachvetzError>;
