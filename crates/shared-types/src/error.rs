// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Validation errors for shared primitives

use thiserror::Error;

/// Errors raised when constructing a shared primitive from untrusted input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SharedTypeError {
    /// String was empty or contained only whitespace
    #[error("{field} cannot be empty or whitespace-only")]
    EmptyString {
        /// Name of the offending field
        field: &'static str,
    },

    /// Value fell outside the closed unit interval
    #[error("{field} must be between 0.0 and 1.0, got {value}")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Label text did not name a known label
    #[error("unknown label '{value}', expected one of: {expected}")]
    UnknownLabel {
        /// Rejected input
        value: String,
        /// Accepted spellings
        expected: &'static str,
    },
}
