// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Model lifecycle workflow
//!
//! A version moves from uploaded to serving only through activation, and
//! activating one version implicitly retires the previous one on the backend.
//! This workflow never asserts that locally: it remembers the last version it
//! successfully activated and reflects the backend's list around it.

use std::{path::Path, sync::Arc};

use api_client::{
    Ack, ModelArtifact, ModelVersion, RetrainAck, RetrainRequest, SpamBackend, UploadRequest,
};
use shared_types::{NonEmptyString, Threshold};
use tokio::{fs, sync::RwLock};
use tracing::{info, instrument, warn};

use crate::{
    error::{WorkflowError, WorkflowResult},
    events::{EventBus, Invalidation, WorkflowEvent},
    sequence::RequestSequence,
};

/// Read a model artifact from disk, keeping its file name for the upload
pub async fn load_artifact(path: impl AsRef<Path>) -> WorkflowResult<ModelArtifact> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            WorkflowError::validation(format!("artifact path has no file name: {}", path.display()))
        })?
        .to_string();

    let bytes = fs::read(path)
        .await
        .map_err(|e| WorkflowError::io(format!("Failed to read {}: {e}", path.display())))?;

    Ok(ModelArtifact::new(file_name, bytes))
}

#[derive(Debug, Default)]
struct ModelState {
    versions: Vec<ModelVersion>,
    /// Last version this session activated successfully
    activated: Option<String>,
}

impl ModelState {
    fn reflected(&self) -> Vec<ModelVersion> {
        let Some(activated) = &self.activated else {
            return self.versions.clone();
        };
        self.versions
            .iter()
            .cloned()
            .map(|mut version| {
                version.active = Some(&version.version == activated);
                version
            })
            .collect()
    }
}

/// Lists, uploads, activates and retrains model versions
#[derive(Debug)]
pub struct ModelLifecycle<B> {
    backend: Arc<B>,
    events: EventBus,
    invalidation: Invalidation,
    sequence: RequestSequence,
    state: RwLock<ModelState>,
}

impl<B: SpamBackend> ModelLifecycle<B> {
    /// Create a workflow over `backend`, publishing changes on `events`
    pub fn new(backend: Arc<B>, events: EventBus) -> Self {
        let invalidation = events.invalidation(WorkflowEvent::affects_models);
        Self {
            backend,
            events,
            invalidation,
            sequence: RequestSequence::new("model list"),
            state: RwLock::new(ModelState::default()),
        }
    }

    /// Re-fetch the model list
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> WorkflowResult<Vec<ModelVersion>> {
        let ticket = self.sequence.issue();
        self.invalidation.mark_fresh().await;
        let outcome = self.backend.list_models().await;
        self.sequence.ensure_latest(ticket)?;
        let fetched = outcome.inspect_err(|_| self.invalidation.mark_stale())?;

        let mut state = self.state.write().await;
        self.sequence.ensure_latest(ticket)?;
        info!(count = fetched.len(), "model list refreshed");
        state.versions = fetched;

        Ok(state.reflected())
    }

    /// Known versions with the serving flag reflected
    pub async fn versions(&self) -> Vec<ModelVersion> {
        self.state.read().await.reflected()
    }

    /// Version currently reflected as serving
    ///
    /// The last successful activation wins; otherwise the backend's own flag.
    pub async fn active_version(&self) -> Option<String> {
        let state = self.state.read().await;
        state.activated.clone().or_else(|| {
            state
                .versions
                .iter()
                .find(|v| v.active == Some(true))
                .map(|v| v.version.clone())
        })
    }

    /// Check if a model change was published since the last refresh
    pub async fn is_stale(&self) -> bool {
        self.invalidation.is_stale().await
    }

    /// Upload `artifact` as `version`
    ///
    /// Duplicate versions are left for the backend to reject. On success the
    /// list is re-fetched in the background.
    #[instrument(skip(self, artifact), fields(size = artifact.len()))]
    pub async fn upload(
        &self,
        artifact: ModelArtifact,
        version: &str,
        threshold: Option<f64>,
    ) -> WorkflowResult<Ack> {
        let version = NonEmptyString::named("model version", version)?;
        if artifact.is_empty() {
            return Err(WorkflowError::validation("model artifact is empty"));
        }
        let threshold = threshold.map(Threshold::new).transpose()?;

        let ack = self
            .backend
            .upload_model(UploadRequest {
                artifact,
                version: version.clone(),
                threshold,
            })
            .await?;
        info!(%version, "model uploaded");

        self.events.publish(WorkflowEvent::ModelUploaded {
            version: version.to_string(),
        });
        self.refresh_in_background().await;
        Ok(ack)
    }

    /// Make `version` the serving model
    ///
    /// Re-activating the serving version is accepted. On failure the reflected
    /// serving version is unchanged.
    #[instrument(skip(self))]
    pub async fn activate(&self, version: &str) -> WorkflowResult<Ack> {
        let version = NonEmptyString::named("model version", version)?;

        let ack = self.backend.activate_model(version.clone()).await?;
        info!(%version, "model activated");

        self.state.write().await.activated = Some(version.to_string());
        self.events.publish(WorkflowEvent::ModelActivated {
            version: version.to_string(),
        });
        self.refresh_in_background().await;
        Ok(ack)
    }

    /// Schedule a retraining job on the backend
    #[instrument(skip(self))]
    pub async fn retrain(
        &self,
        dataset_path: Option<String>,
        augment: Option<bool>,
    ) -> WorkflowResult<RetrainAck> {
        if dataset_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(WorkflowError::validation(
                "dataset path cannot be empty or whitespace-only",
            ));
        }

        let ack = self
            .backend
            .retrain(RetrainRequest {
                dataset_path,
                augment,
            })
            .await?;
        info!(job_id = ?ack.job_id, "retraining scheduled");
        Ok(ack)
    }

    /// Refresh after a change; failures keep the prior list visible
    async fn refresh_in_background(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "model list refresh failed, keeping previous list");
        }
    }
}
