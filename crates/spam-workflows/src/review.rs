// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Review workflow
//!
//! Holds the operator's working set of low-confidence items. The set is
//! replaced wholesale on refresh and shrinks only after the backend
//! acknowledges a label; there is no optimistic removal.

use std::{num::NonZeroU32, sync::Arc};

use api_client::{Ack, DEFAULT_REVIEW_LIMIT, ReviewId, ReviewItem, ReviewSubmission, SpamBackend};
use shared_types::{Probability, ReviewLabel, SpamLabel, Threshold};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::{
    error::{WorkflowError, WorkflowResult},
    events::{EventBus, WorkflowEvent},
    sequence::RequestSequence,
};

/// Operator label that disagrees with the model's own call on an item
#[derive(Debug, Clone, PartialEq)]
pub struct LabelConflict {
    /// Item being labeled
    pub id: ReviewId,
    /// Label the operator chose
    pub label: ReviewLabel,
    /// Label the queued score implies at the threshold
    pub suggested: SpamLabel,
    /// Queued spam probability
    pub score: Probability,
    /// Cutoff the score was compared against
    pub threshold: Threshold,
}

/// Detect whether labeling `item` with `label` contradicts its queued score
///
/// Skip never conflicts, and neither does an item without a score.
pub fn detect_conflict(
    item: &ReviewItem,
    label: ReviewLabel,
    threshold: Threshold,
) -> Option<LabelConflict> {
    let chosen = label.as_spam_label()?;
    let score = item.score?;
    let suggested = threshold.label_for(score);

    (chosen != suggested).then(|| LabelConflict {
        id: item.id.clone(),
        label,
        suggested,
        score,
        threshold,
    })
}

/// Drives the human-in-the-loop review queue
#[derive(Debug)]
pub struct ReviewWorkflow<B> {
    backend: Arc<B>,
    events: EventBus,
    sequence: RequestSequence,
    items: RwLock<Vec<ReviewItem>>,
}

impl<B: SpamBackend> ReviewWorkflow<B> {
    /// Create a workflow over `backend`, publishing resolutions on `events`
    pub fn new(backend: Arc<B>, events: EventBus) -> Self {
        Self {
            backend,
            events,
            sequence: RequestSequence::new("review"),
            items: RwLock::new(Vec::new()),
        }
    }

    /// Replace the working set with up to `limit` items (25 when omitted)
    ///
    /// An empty queue is a valid result.
    #[instrument(skip(self))]
    pub async fn refresh(&self, limit: Option<u32>) -> WorkflowResult<Vec<ReviewItem>> {
        let limit = match limit {
            Some(limit) => NonZeroU32::new(limit)
                .ok_or_else(|| WorkflowError::validation("review limit must be greater than 0"))?,
            None => DEFAULT_REVIEW_LIMIT,
        };

        let ticket = self.sequence.issue();
        let outcome = self.backend.list_review_queue(limit).await;
        self.sequence.ensure_latest(ticket)?;
        let fetched = outcome?;

        let mut items = self.items.write().await;
        self.sequence.ensure_latest(ticket)?;
        info!(count = fetched.len(), "review queue refreshed");
        items.clone_from(&fetched);

        Ok(fetched)
    }

    /// Current working set, in backend order
    pub async fn items(&self) -> Vec<ReviewItem> {
        self.items.read().await.clone()
    }

    /// Check if the working set is empty
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Item in the working set with identifier `id`
    pub async fn find(&self, id: &ReviewId) -> Option<ReviewItem> {
        self.items.read().await.iter().find(|item| &item.id == id).cloned()
    }

    /// Check `label` for `id` against the item's queued score
    ///
    /// Returns `None` when the item is not in the working set.
    pub async fn check_conflict(
        &self,
        id: &ReviewId,
        label: ReviewLabel,
        threshold: Threshold,
    ) -> Option<LabelConflict> {
        let items = self.items.read().await;
        let item = items.iter().find(|item| &item.id == id)?;
        detect_conflict(item, label, threshold)
    }

    /// Submit a terminal label and drop the item from the working set
    ///
    /// The set changes only after the backend acknowledges the label; on
    /// failure it is left exactly as it was. An id that is not in the working
    /// set is still submitted.
    #[instrument(skip(self, id), fields(item_id = %id))]
    pub async fn resolve(&self, id: ReviewId, label: ReviewLabel) -> WorkflowResult<Ack> {
        let ack = self
            .backend
            .submit_review(ReviewSubmission {
                id: id.clone(),
                label,
            })
            .await?;

        let removed = {
            let mut items = self.items.write().await;
            let before = items.len();
            items.retain(|item| item.id != id);
            before - items.len()
        };
        info!(%label, removed, "review item resolved");

        self.events
            .publish(WorkflowEvent::ReviewResolved { id, label });
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, score: Option<f64>) -> ReviewItem {
        ReviewItem {
            id: ReviewId::from(id),
            text: format!("message {id}"),
            score: score.map(|s| Probability::new(s).unwrap()),
        }
    }

    #[test]
    fn ham_label_on_high_score_conflicts() {
        let conflict =
            detect_conflict(&item("a", Some(0.81)), ReviewLabel::Ham, Threshold::DEFAULT).unwrap();
        assert_eq!(conflict.suggested, SpamLabel::Spam);
        assert_eq!(conflict.label, ReviewLabel::Ham);
    }

    #[test]
    fn agreeing_label_does_not_conflict() {
        assert!(detect_conflict(&item("a", Some(0.12)), ReviewLabel::Ham, Threshold::DEFAULT).is_none());
        assert!(
            detect_conflict(&item("a", Some(0.5)), ReviewLabel::Spam, Threshold::DEFAULT).is_none()
        );
    }

    #[test]
    fn threshold_moves_the_cut() {
        let strict = Threshold::new(0.9).unwrap();
        assert!(detect_conflict(&item("a", Some(0.8)), ReviewLabel::Ham, strict).is_none());
        assert!(detect_conflict(&item("a", Some(0.8)), ReviewLabel::Spam, strict).is_some());
    }

    #[test]
    fn skip_and_unscored_never_conflict() {
        assert!(detect_conflict(&item("a", Some(0.99)), ReviewLabel::Skip, Threshold::DEFAULT).is_none());
        assert!(detect_conflict(&item("a", None), ReviewLabel::Ham, Threshold::DEFAULT).is_none());
    }
}
