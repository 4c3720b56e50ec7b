// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Operator session
//!
//! A [`Session`] is the explicit bundle that replaces process-wide state: the
//! resolved settings, one backend, one event bus, and one instance of each
//! workflow wired to both. Changing the backend address means building a new
//! session.

use std::sync::Arc;

use api_client::{HttpBackend, SpamBackend};
use tracing::info;

use crate::{
    error::WorkflowResult,
    events::EventBus,
    metrics::MetricsView,
    models::ModelLifecycle,
    prediction::PredictionWorkflow,
    review::ReviewWorkflow,
    settings::ClientSettings,
};

/// Settings, backend and workflows for one operator session
#[derive(Debug)]
pub struct Session<B> {
    settings: ClientSettings,
    backend: Arc<B>,
    events: EventBus,
    prediction: PredictionWorkflow<B>,
    review: ReviewWorkflow<B>,
    models: ModelLifecycle<B>,
    metrics: MetricsView<B>,
}

impl Session<HttpBackend> {
    /// Open a session against the HTTP backend named in `settings`
    pub fn connect(settings: ClientSettings) -> WorkflowResult<Self> {
        let backend = HttpBackend::new(settings.backend_url.clone())?;
        Ok(Self::new(settings, backend))
    }
}

impl<B: SpamBackend> Session<B> {
    /// Wire every workflow to `backend`
    pub fn new(settings: ClientSettings, backend: B) -> Self {
        let backend = Arc::new(backend);
        let events = EventBus::default();

        info!(
            backend = backend.name(),
            backend_url = %settings.backend_url,
            "session opened"
        );

        Self {
            prediction: PredictionWorkflow::new(Arc::clone(&backend)),
            review: ReviewWorkflow::new(Arc::clone(&backend), events.clone()),
            models: ModelLifecycle::new(Arc::clone(&backend), events.clone()),
            metrics: MetricsView::new(Arc::clone(&backend), &events),
            settings,
            backend,
            events,
        }
    }

    /// Settings the session was opened with
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Shared backend handle
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Event bus the workflows publish on
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Prediction workflow
    pub fn prediction(&self) -> &PredictionWorkflow<B> {
        &self.prediction
    }

    /// Review workflow
    pub fn review(&self) -> &ReviewWorkflow<B> {
        &self.review
    }

    /// Model lifecycle workflow
    pub fn models(&self) -> &ModelLifecycle<B> {
        &self.models
    }

    /// Metrics view
    pub fn metrics(&self) -> &MetricsView<B> {
        &self.metrics
    }
}
