// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Typed contract layer for the spam-classification backend
//!
//! This crate is the single choke point through which every workflow talks to the
//! backend. It translates typed operations into HTTP calls and backend responses
//! into the canonical data model, uniformly across success and failure.
//!
//! # Core Abstractions
//!
//! - **`SpamBackend` Trait**: async interface covering prediction, model
//!   management, the review queue, metrics and retraining
//! - **`HttpBackend`**: reqwest implementation of the trait
//! - **`ApiError`**: the single request error every operation fails with, carrying
//!   the best diagnostic text the backend or transport offered
//! - **Data Types**: wire shapes normalized at the boundary, so array-or-object
//!   and number-or-object variants never reach the workflows
//!
//! Every operation is single-attempt: there is no retry, backoff or timeout.

use std::num::NonZeroU32;

use shared_types::NonEmptyString;
use thiserror::Error;

pub mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::*;

/// Default number of review items requested when the caller does not choose
pub const DEFAULT_REVIEW_LIMIT: NonZeroU32 = match NonZeroU32::new(25) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// Interface to the hosted spam-classification service
///
/// Implementations must not retry: a failed call is terminal for that attempt.
pub trait SpamBackend: Send + Sync {
    /// Score a message, optionally overriding the decision threshold
    ///
    /// A success response with an empty body yields an unlabeled result rather
    /// than an error.
    fn predict(
        &self,
        request: PredictRequest,
    ) -> impl Future<Output = Result<PredictionResult, ApiError>> + Send;

    /// List every known model version
    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelVersion>, ApiError>> + Send;

    /// Upload a model artifact bound to a version and optional threshold
    fn upload_model(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    /// Make `version` the serving model
    ///
    /// Re-activating the version that is already serving is accepted.
    fn activate_model(
        &self,
        version: NonEmptyString,
    ) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    /// Fetch up to `limit` low-confidence items awaiting review
    fn list_review_queue(
        &self,
        limit: NonZeroU32,
    ) -> impl Future<Output = Result<Vec<ReviewItem>, ApiError>> + Send;

    /// Submit a terminal label for a review item
    fn submit_review(
        &self,
        submission: ReviewSubmission,
    ) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    /// Fetch the server-side operational snapshot
    fn get_metrics(&self) -> impl Future<Output = Result<MetricsSnapshot, ApiError>> + Send;

    /// Schedule a retraining job on the backend worker
    fn retrain(
        &self,
        request: RetrainRequest,
    ) -> impl Future<Output = Result<RetrainAck, ApiError>> + Send;

    /// Get the name/identifier of this backend
    fn name(&self) -> &'static str;
}

/// Uniform request error for every backend operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Backend answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code
        status: u16,
        /// Diagnostic extracted from the response body
        message: String,
    },

    /// Request never produced a response (unreachable host, broken connection)
    #[error("request failed: {message}")]
    Transport {
        /// Transport failure description
        message: String,
    },

    /// Success response whose payload does not fit the expected shape
    #[error("invalid response from {operation}: {message}")]
    InvalidResponse {
        /// Operation whose payload was rejected
        operation: &'static str,
        /// Decoding failure description
        message: String,
    },

    /// Client could not be configured (bad base URL, HTTP client setup)
    #[error("configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },
}

impl ApiError {
    /// Create a configuration error
    pub fn configuration<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create an invalid response error for `operation`
    pub fn invalid_response<T: ToString>(operation: &'static str, message: T) -> Self {
        Self::InvalidResponse {
            operation,
            message: message.to_string(),
        }
    }

    /// Best-available diagnostic text, without status decoration
    pub fn message(&self) -> &str {
        match self {
            ApiError::Status { message, .. }
            | ApiError::Transport { message }
            | ApiError::InvalidResponse { message, .. }
            | ApiError::Configuration { message } => message,
        }
    }

    /// HTTP status, when the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
