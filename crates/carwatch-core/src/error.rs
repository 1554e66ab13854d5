//! # Error Types
//!
//! Validation failures of the foundational types. Domain crates define
//! their own `thiserror` enums and wrap this one with `#[from]` where a
//! value fails validation.

use thiserror::Error;

/// A domain primitive was constructed from an invalid value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is empty or not of the form `local@domain`.
    #[error("invalid email address: \"{0}\"")]
    InvalidEmail(String),

    /// Identifier is not a UUID.
    #[error("invalid identifier: \"{0}\" (expected a UUID)")]
    InvalidId(String),

    /// Timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
