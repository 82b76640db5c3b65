//! Error taxonomy for the analytics core.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid period: {0} (expected week, month, quarter, year or all)")]
    InvalidPeriod(String),

    #[error("Malformed transaction {id}: {reason}")]
    MalformedTransaction { id: String, reason: String },

    #[error("Invalid budget for {category}: {reason}")]
    InvalidBudget { category: String, reason: String },

    #[error("Unknown {kind} category: {category}")]
    UnknownCategory { kind: String, category: String },

    #[error("No exchange rate from {from} to {to}")]
    MissingRate { from: String, to: String },
}

pub type Result<T, E = AnalyticsError> = std::result::Result<T, E>;
