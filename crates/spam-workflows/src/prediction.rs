// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prediction workflow
//!
//! Submits a single message for scoring and keeps the most recent result. The
//! plain and explained entry points issue the same request; the explanation is
//! whatever the backend chose to attach.

use std::sync::Arc;

use api_client::{Explanation, PredictRequest, PredictionResult, SpamBackend};
use shared_types::{NonEmptyString, Threshold};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::{error::WorkflowResult, sequence::RequestSequence};

/// Prediction result with the explanation split out as a secondary result
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainedPrediction {
    /// Label, probability and model version
    pub prediction: PredictionResult,
    /// Feature contributions, when the backend computed them
    pub explanation: Option<Explanation>,
}

/// Scores messages and holds the latest accepted result
#[derive(Debug)]
pub struct PredictionWorkflow<B> {
    backend: Arc<B>,
    sequence: RequestSequence,
    current: RwLock<Option<PredictionResult>>,
}

impl<B: SpamBackend> PredictionWorkflow<B> {
    /// Create a workflow over `backend`
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            sequence: RequestSequence::new("prediction"),
            current: RwLock::new(None),
        }
    }

    /// Score `text`, optionally overriding the decision threshold
    ///
    /// Empty or whitespace-only text and thresholds outside `[0, 1]` are
    /// rejected without a request. On failure the previous result is kept.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn predict(
        &self,
        text: &str,
        threshold: Option<f64>,
    ) -> WorkflowResult<PredictionResult> {
        let request = build_request(text, threshold)?;
        let ticket = self.sequence.issue();

        let outcome = self.backend.predict(request).await;
        self.sequence.ensure_latest(ticket)?;
        let result = outcome?;

        info!(
            label = ?result.label,
            model_version = ?result.model_version,
            "prediction completed"
        );

        let mut current = self.current.write().await;
        // a newer request may have been issued while waiting for the lock
        self.sequence.ensure_latest(ticket)?;
        *current = Some(result.clone());

        Ok(result)
    }

    /// Score `text` and return the explanation alongside the prediction
    pub async fn predict_with_explanation(
        &self,
        text: &str,
        threshold: Option<f64>,
    ) -> WorkflowResult<ExplainedPrediction> {
        let mut prediction = self.predict(text, threshold).await?;
        let explanation = prediction.explanation.take().filter(|e| !e.is_empty());
        if explanation.is_none() {
            debug!("backend returned no explanation");
        }

        Ok(ExplainedPrediction {
            prediction,
            explanation,
        })
    }

    /// Latest accepted result, explanation included
    pub async fn current(&self) -> Option<PredictionResult> {
        self.current.read().await.clone()
    }
}

fn build_request(text: &str, threshold: Option<f64>) -> WorkflowResult<PredictRequest> {
    let text = NonEmptyString::named("message text", text)?;
    let request = PredictRequest::new(text);
    Ok(match threshold {
        Some(value) => request.with_threshold(Threshold::new(value)?),
        None => request,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation() {
        assert!(build_request("", None).unwrap_err().is_validation());
        assert!(build_request(" \n\t", None).unwrap_err().is_validation());
        assert!(build_request("hi", Some(1.5)).unwrap_err().is_validation());
        assert!(build_request("hi", Some(f64::NAN)).unwrap_err().is_validation());

        let request = build_request("hi", Some(0.3)).unwrap();
        assert_eq!(request.text.as_str(), "hi");
        assert_eq!(request.threshold, Some(Threshold::new(0.3).unwrap()));

        let request = build_request("hi", None).unwrap();
        assert_eq!(request.threshold, None);
    }
}
