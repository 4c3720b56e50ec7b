// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Review queue commands

use std::io::Write;

use api_client::{ReviewId, ReviewItem, SpamBackend};
use clap::Subcommand;
use serde::Serialize;
use shared_types::{ReviewLabel, Threshold};
use spam_workflows::Session;
use tabled::Tabled;
use tracing::warn;

use crate::{
    error::{ConsoleError, ConsoleResult},
    render::{self, OutputFormat},
};

/// Review queue subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ReviewCommands {
    /// List low-confidence items awaiting a label
    List {
        /// Maximum number of items to fetch
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Label one item and remove it from the queue
    Resolve {
        /// Item identifier
        id: String,

        /// Terminal label (spam, ham, skip)
        label: ReviewLabel,

        /// Maximum number of items to fetch when checking the item
        #[arg(short, long)]
        limit: Option<u32>,

        /// Threshold the queued score is compared against
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Submit even when the label contradicts the queued score
        #[arg(long = "override")]
        force: bool,
    },
}

/// Table row for review items
#[derive(Debug, Serialize, Tabled)]
struct ReviewRow {
    id: String,
    score: String,
    text: String,
}

impl From<&ReviewItem> for ReviewRow {
    fn from(item: &ReviewItem) -> Self {
        Self {
            id: item.id.to_string(),
            score: item
                .score
                .map_or_else(|| "-".to_string(), |score| format!("{:.3}", score.as_f64())),
            text: render::truncate(&item.text, 60),
        }
    }
}

/// Operator-typed id in the wire form the fetched queue uses
fn wire_id(id: String, queue: &[ReviewItem]) -> ReviewId {
    match id.parse::<u64>() {
        Ok(number) if queue.iter().any(|item| item.id.is_numeric()) => ReviewId::from(number),
        _ => ReviewId::from(id),
    }
}

/// Execute a review command
pub async fn execute<B: SpamBackend>(
    command: ReviewCommands,
    session: &Session<B>,
    out: &mut dyn Write,
    format: OutputFormat,
) -> ConsoleResult<()> {
    let review = session.review();

    match command {
        ReviewCommands::List { limit } => {
            let items = review.refresh(limit).await?;
            if format == OutputFormat::Table {
                let rows = items.iter().map(ReviewRow::from).collect();
                render::write_rows(out, rows, format, "Review queue is empty")
            } else {
                render::write_structured(out, &items, format)
            }
        }

        ReviewCommands::Resolve {
            id,
            label,
            limit,
            threshold,
            force,
        } => {
            let threshold = threshold
                .map(Threshold::new)
                .transpose()
                .map_err(spam_workflows::WorkflowError::from)?
                .unwrap_or_default();

            let note = match review.refresh(limit).await {
                Ok(_) => None,
                Err(e) if e.is_validation() => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "review queue unavailable, submitting without a conflict check");
                    Some(format!(
                        "Review queue unavailable ({e}); submitted without a conflict check"
                    ))
                }
            };

            // submit in the id's wire form when the item is known
            let known = review.find(&ReviewId::from(id.as_str())).await;
            let queued = known.is_some();
            let id = match known {
                Some(item) => item.id,
                None => wire_id(id, &review.items().await),
            };
            let note = note.or_else(|| {
                (!queued).then(|| {
                    format!(
                        "{id} is not in the fetched queue; submitted without a conflict check (raise --limit to include it)"
                    )
                })
            });

            if let Some(conflict) = review.check_conflict(&id, label, threshold).await {
                if !force {
                    return Err(ConsoleError::from(conflict));
                }
                render::print_warning(&format!(
                    "Submitting {label} despite score {} at threshold {threshold}",
                    conflict.score
                ));
            }

            let ack = review.resolve(id.clone(), label).await?;
            let remaining = review.items().await.len();

            if format == OutputFormat::Table {
                render::success(out, &format!("Labeled {id} as {label}"))?;
                if let Some(message) = ack.message {
                    render::info(out, &message)?;
                }
                if let Some(note) = &note {
                    render::info(out, note)?;
                }
                if remaining == 0 {
                    render::info(out, "Review queue is empty")?;
                } else {
                    render::info(out, &format!("{remaining} items remaining"))?;
                }
                Ok(())
            } else {
                render::write_structured(
                    out,
                    &serde_json::json!({
                        "id": id,
                        "label": label,
                        "message": ack.message,
                        "queued": queued,
                        "note": note,
                        "remaining": remaining,
                    }),
                    format,
                )
            }
        }
    }
}
