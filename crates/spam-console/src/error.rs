// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling for console commands

use api_client::ReviewId;
use shared_types::{Probability, ReviewLabel, SpamLabel, Threshold};
use spam_workflows::{LabelConflict, WorkflowError};
use thiserror::Error;

/// Result type alias for console commands
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Error types for console commands
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Workflow or backend failure
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Operator label contradicts the queued score and was not overridden
    #[error(
        "labeling {id} as {label} conflicts with its score {score} (suggests {suggested} at threshold {threshold}); pass --override to submit anyway"
    )]
    Conflict {
        /// Item being labeled
        id: ReviewId,
        /// Label the operator chose
        label: ReviewLabel,
        /// Label implied by the score
        suggested: SpamLabel,
        /// Queued spam probability
        score: Probability,
        /// Cutoff used
        threshold: Threshold,
    },

    /// Writing command output failed
    #[error("Output error: {message}")]
    Output {
        /// Error message
        message: String,
    },
}

impl ConsoleError {
    /// Create an output error
    pub fn output<T: ToString>(message: T) -> Self {
        Self::Output {
            message: message.to_string(),
        }
    }
}

impl From<LabelConflict> for ConsoleError {
    fn from(conflict: LabelConflict) -> Self {
        Self::Conflict {
            id: conflict.id,
            label: conflict.label,
            suggested: conflict.suggested,
            score: conflict.score,
            threshold: conflict.threshold,
        }
    }
}

impl From<api_client::ApiError> for ConsoleError {
    fn from(err: api_client::ApiError) -> Self {
        Self::Workflow(err.into())
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        Self::output(err)
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        Self::output(err)
    }
}

impl From<serde_yaml::Error> for ConsoleError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::output(err)
    }
}
