//! FILENAME: pivot-engine/src/error.rs

use thiserror::Error;

/// Configuration and assembly failures surfaced to the host.
///
/// No variant is retried internally; a failed refresh leaves the
/// previously rendered plan in place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivotError {
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("unknown aggregator: {0}")]
    UnknownAggregator(String),

    #[error("malformed result row: {0}")]
    MalformedRow(String),
}
