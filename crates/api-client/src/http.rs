// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP implementation of the backend contract
//!
//! [`HttpBackend`] maps each [`SpamBackend`] operation onto one HTTP request
//! against a configurable base URL. Every response goes through the same path:
//! the body is read as text, non-success statuses become [`ApiError::Status`]
//! with the best diagnostic found in the body, and success bodies that are empty
//! or not JSON are treated as `{}`.

use std::{error::Error as _, num::NonZeroU32};

use reqwest::{
    Client, RequestBuilder, StatusCode,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared_types::NonEmptyString;
use tracing::{Span, debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    ApiError, SpamBackend,
    types::{
        Ack, MetricsSnapshot, ModelListing, ModelVersion, PredictRequest, PredictionResult,
        RetrainAck, RetrainRequest, ReviewItem, ReviewQueue, ReviewSubmission, UploadRequest,
    },
};

const USER_AGENT: &str = concat!("spam-console/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`SpamBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot serve as a base or the HTTP client
    /// cannot be built
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::configuration(format!("failed to create HTTP client: {e}")))?;

        Self::with_client(base_url, client)
    }

    /// Create a backend that sends requests through an existing client
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot serve as a base
    pub fn with_client(mut base_url: Url, client: Client) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::configuration(format!(
                "backend URL cannot be used as a base: {base_url}"
            )));
        }

        // Ensure base URL ends with slash for proper joining
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        debug!(base_url = %base_url, "created HTTP backend");
        Ok(Self { client, base_url })
    }

    /// Base URL every request is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::configuration(format!("invalid endpoint '{path}': {e}")))
    }

    /// Send a request and reduce the response to a JSON value
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Value, ApiError> {
        let request_id = Uuid::new_v4();
        Span::current().record("request_id", request_id.to_string());
        debug!(%request_id, operation, "sending backend request");

        let response = request.send().await.map_err(|e| {
            let message = transport_message(&e);
            warn!(%request_id, operation, error = %message, "backend request failed");
            ApiError::Transport { message }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            message: transport_message(&e),
        })?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(
                %request_id,
                operation,
                status = status.as_u16(),
                error = %message,
                "backend rejected request"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(%request_id, operation, status = status.as_u16(), "backend request completed");
        Ok(success_body(operation, &body))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let value = self.execute(operation, request).await?;
        decode(operation, value)
    }
}

impl SpamBackend for HttpBackend {
    #[instrument(skip_all, fields(threshold = ?request.threshold, request_id))]
    async fn predict(&self, request: PredictRequest) -> Result<PredictionResult, ApiError> {
        let url = self.endpoint("predict/")?;
        self.fetch("predict", self.client.post(url).json(&request))
            .await
    }

    #[instrument(skip_all, fields(request_id))]
    async fn list_models(&self) -> Result<Vec<ModelVersion>, ApiError> {
        let url = self.endpoint("admin/models")?;
        let listing: ModelListing = self.fetch("list_models", self.client.get(url)).await?;
        Ok(listing.into_models())
    }

    #[instrument(skip_all, fields(version = %request.version, size = request.artifact.len(), request_id))]
    async fn upload_model(&self, request: UploadRequest) -> Result<Ack, ApiError> {
        let url = self.endpoint("admin/upload")?;

        let UploadRequest {
            artifact,
            version,
            threshold,
        } = request;
        let part = Part::bytes(artifact.bytes).file_name(artifact.file_name);
        let mut form = Form::new()
            .part("file", part)
            .text("version", version.as_str().to_string());
        if let Some(threshold) = threshold {
            form = form.text("threshold", threshold.as_f64().to_string());
        }

        self.fetch("upload_model", self.client.post(url).multipart(form))
            .await
    }

    #[instrument(skip_all, fields(version = %version, request_id))]
    async fn activate_model(&self, version: NonEmptyString) -> Result<Ack, ApiError> {
        let mut url = self.endpoint("admin/activate/")?;
        url.path_segments_mut()
            .map_err(|()| ApiError::configuration("backend URL cannot be used as a base"))?
            .pop_if_empty()
            .push(version.as_str());

        self.fetch("activate_model", self.client.post(url)).await
    }

    #[instrument(skip_all, fields(limit = limit.get(), request_id))]
    async fn list_review_queue(&self, limit: NonZeroU32) -> Result<Vec<ReviewItem>, ApiError> {
        let mut url = self.endpoint("review/queue")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.get().to_string());

        let queue: ReviewQueue = self.fetch("list_review_queue", self.client.get(url)).await?;
        Ok(queue.into_items())
    }

    #[instrument(skip_all, fields(item_id = %submission.id, label = %submission.label, request_id))]
    async fn submit_review(&self, submission: ReviewSubmission) -> Result<Ack, ApiError> {
        let url = self.endpoint("review/submit")?;
        self.fetch("submit_review", self.client.post(url).json(&submission))
            .await
    }

    #[instrument(skip_all, fields(request_id))]
    async fn get_metrics(&self) -> Result<MetricsSnapshot, ApiError> {
        let url = self.endpoint("admin/metrics")?;
        self.fetch("get_metrics", self.client.get(url)).await
    }

    #[instrument(skip_all, fields(request_id))]
    async fn retrain(&self, request: RetrainRequest) -> Result<RetrainAck, ApiError> {
        let url = self.endpoint("admin/retrain")?;
        self.fetch("retrain", self.client.post(url).json(&request))
            .await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Interpret a success body, treating empty or non-JSON payloads as `{}`
fn success_body(operation: &'static str, body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Object(Map::new());
    }

    serde_json::from_str(body).unwrap_or_else(|e| {
        debug!(operation, error = %e, "success body is not JSON, treating as empty");
        Value::Object(Map::new())
    })
}

fn decode<T: DeserializeOwned>(operation: &'static str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::invalid_response(operation, e))
}

/// Extract the most useful diagnostic from a failed response body
///
/// Preference order: JSON `detail`, JSON `error`, the JSON body itself, the raw
/// text, and finally the status line.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let field = json
            .get("detail")
            .filter(|v| !v.is_null())
            .or_else(|| json.get("error").filter(|v| !v.is_null()));

        return match field {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => json.to_string(),
        };
    }

    let text = body.trim();
    if text.is_empty() {
        format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        )
    } else {
        text.to_string()
    }
}

/// Flatten a reqwest error and its sources into one line
fn transport_message(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
