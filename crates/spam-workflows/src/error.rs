// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for workflow operations
//!
//! Every workflow fails with [`WorkflowError`]. Local validation failures are
//! raised before any request is issued; backend failures carry the
//! [`ApiError`] unchanged so the operator sees the backend's own diagnostic.

use api_client::ApiError;
use shared_types::SharedTypeError;
use thiserror::Error;

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Error types for workflow operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// Input rejected locally; no request was issued
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Backend call failed
    #[error(transparent)]
    Request(#[from] ApiError),

    /// A newer request from the same workflow was issued before this one completed
    #[error("{workflow} response discarded: a newer request was issued")]
    Superseded { workflow: &'static str },

    /// Settings could not be resolved or are invalid
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// I/O error (artifact or settings files)
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl WorkflowError {
    /// Create a validation error
    pub fn validation<T: ToString>(message: T) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    /// Create a settings error
    pub fn settings<T: ToString>(message: T) -> Self {
        Self::Settings {
            message: message.to_string(),
        }
    }

    /// Create an I/O error
    pub fn io<T: ToString>(message: T) -> Self {
        Self::Io {
            message: message.to_string(),
        }
    }

    /// Check if the input was rejected before reaching the backend
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation { .. })
    }

    /// Check if the response was dropped in favor of a newer request
    pub fn is_superseded(&self) -> bool {
        matches!(self, WorkflowError::Superseded { .. })
    }

    /// Backend error, if this failure came from a request
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            WorkflowError::Request(err) => Some(err),
            _ => None,
        }
    }
}

/// Convert from shared primitive validation errors
impl From<SharedTypeError> for WorkflowError {
    fn from(err: SharedTypeError) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}

/// Convert from configuration errors
impl From<config::ConfigError> for WorkflowError {
    fn from(err: config::ConfigError) -> Self {
        Self::Settings {
            message: err.to_string(),
        }
    }
}

/// Convert from JSON errors
impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Settings {
            message: err.to_string(),
        }
    }
}
