// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only metrics view
//!
//! The snapshot is recomputed server-side on every fetch and replaced wholesale
//! here. The model list is fetched alongside it for context; losing it is not
//! worth interrupting the operator over.

use std::sync::Arc;

use api_client::{HistogramBucket, MetricsSnapshot, ModelVersion, SpamBackend};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::{
    error::WorkflowResult,
    events::{EventBus, Invalidation},
    sequence::RequestSequence,
};

/// Confidence distribution with proportional bar math
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    buckets: Vec<HistogramBucket>,
}

impl Histogram {
    /// Wrap an ordered bucket list
    pub fn new(buckets: Vec<HistogramBucket>) -> Self {
        Self { buckets }
    }

    /// Buckets in backend order
    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    /// Sum of all bucket counts
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Each bucket's share of the total; all zeros when the total is zero
    #[allow(clippy::cast_precision_loss)]
    pub fn fractions(&self) -> Vec<f64> {
        let total = self.total();
        self.buckets
            .iter()
            .map(|b| {
                if total == 0 {
                    0.0
                } else {
                    b.count as f64 / total as f64
                }
            })
            .collect()
    }

    /// Each bucket's share as a whole percentage, rounded half up
    pub fn percent_heights(&self) -> Vec<u64> {
        let total = self.total().max(1);
        self.buckets
            .iter()
            .map(|b| (b.count * 200 + total) / (total * 2))
            .collect()
    }
}

#[derive(Debug, Default)]
struct MetricsState {
    snapshot: Option<MetricsSnapshot>,
    models: Vec<ModelVersion>,
}

/// Operational snapshot plus the model list it is read against
#[derive(Debug)]
pub struct MetricsView<B> {
    backend: Arc<B>,
    invalidation: Invalidation,
    sequence: RequestSequence,
    state: RwLock<MetricsState>,
}

impl<B: SpamBackend> MetricsView<B> {
    /// Create a view over `backend`, going stale on any workflow event
    pub fn new(backend: Arc<B>, events: &EventBus) -> Self {
        Self {
            backend,
            invalidation: events.invalidation(|_| true),
            sequence: RequestSequence::new("metrics"),
            state: RwLock::new(MetricsState::default()),
        }
    }

    /// Fetch the snapshot and the model list concurrently
    ///
    /// A snapshot failure is returned and leaves the previous snapshot in
    /// place. A model list failure is logged and the previous list is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> WorkflowResult<MetricsSnapshot> {
        let ticket = self.sequence.issue();
        self.invalidation.mark_fresh().await;

        let (metrics, models) = tokio::join!(self.backend.get_metrics(), self.backend.list_models());
        self.sequence.ensure_latest(ticket)?;
        let snapshot = metrics.inspect_err(|_| self.invalidation.mark_stale())?;

        let mut state = self.state.write().await;
        self.sequence.ensure_latest(ticket)?;
        match models {
            Ok(models) => state.models = models,
            Err(e) => warn!(error = %e, "model list unavailable, keeping previous list"),
        }
        info!(
            buckets = snapshot.confidence_histogram.len(),
            "metrics refreshed"
        );
        state.snapshot = Some(snapshot.clone());

        Ok(snapshot)
    }

    /// Latest snapshot, if one was fetched
    pub async fn snapshot(&self) -> Option<MetricsSnapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// Model list fetched with the latest snapshot
    pub async fn models(&self) -> Vec<ModelVersion> {
        self.state.read().await.models.clone()
    }

    /// Histogram of the latest snapshot
    pub async fn histogram(&self) -> Option<Histogram> {
        self.state
            .read()
            .await
            .snapshot
            .as_ref()
            .map(|s| Histogram::new(s.confidence_histogram.clone()))
    }

    /// Check if any workflow changed backend state since the last refresh
    pub async fn is_stale(&self) -> bool {
        self.invalidation.is_stale().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(counts: &[u64]) -> Histogram {
        Histogram::new(
            counts
                .iter()
                .enumerate()
                .map(|(i, &count)| HistogramBucket {
                    low: f64::from(u32::try_from(i).unwrap()) / 10.0,
                    high: None,
                    count,
                })
                .collect(),
        )
    }

    #[test]
    fn fractions_are_share_of_total() {
        let h = histogram(&[1, 3, 0, 4]);
        assert_eq!(h.total(), 8);
        assert_eq!(h.fractions(), vec![0.125, 0.375, 0.0, 0.5]);
    }

    #[test]
    fn zero_total_renders_empty() {
        let h = histogram(&[0, 0, 0]);
        assert_eq!(h.fractions(), vec![0.0, 0.0, 0.0]);
        assert_eq!(h.percent_heights(), vec![0, 0, 0]);
        assert!(histogram(&[]).fractions().is_empty());
    }

    #[test]
    fn percent_heights_round_half_up() {
        // 1/8 = 12.5% rounds to 13, 3/8 = 37.5% to 38
        assert_eq!(histogram(&[1, 3, 0, 4]).percent_heights(), vec![13, 38, 0, 50]);
        // 1/3 = 33.3%, 2/3 = 66.7%
        assert_eq!(histogram(&[1, 2]).percent_heights(), vec![33, 67]);
    }
}
