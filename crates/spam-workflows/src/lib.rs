// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Operator workflows over the spam-classification backend
//!
//! Each workflow owns its own state and reaches the backend only through the
//! [`api_client::SpamBackend`] contract. Workflows never mutate each other's
//! state; they publish [`WorkflowEvent`]s so dependent views know to re-fetch.
//!
//! # Architecture
//!
//! - [`prediction`]: score a message, with the explanation as a secondary result
//! - [`review`]: the human-in-the-loop review queue and label conflict checks
//! - [`models`]: list, upload, activate and retrain model versions
//! - [`metrics`]: operational snapshot and histogram math
//! - [`sequence`]: discards responses overtaken by a newer request
//! - [`events`]: invalidation channel between workflows
//! - [`settings`]: backend address resolution and persistence
//! - [`session`]: the explicit bundle of all of the above
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use spam_workflows::{ClientSettings, Session};
//!
//! # async fn example() -> Result<(), spam_workflows::WorkflowError> {
//! let session = Session::connect(ClientSettings::default())?;
//!
//! let result = session
//!     .prediction()
//!     .predict("Free entry! Claim prize now", None)
//!     .await?;
//! println!("{:?} via {:?}", result.label, result.model_version);
//!
//! session.review().refresh(None).await?;
//! if session.review().is_empty().await {
//!     println!("Nothing to review");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod events;
pub mod metrics;
pub mod models;
pub mod prediction;
pub mod review;
pub mod sequence;
pub mod session;
pub mod settings;

pub use error::{WorkflowError, WorkflowResult};
pub use events::{EventBus, Invalidation, WorkflowEvent};
pub use metrics::{Histogram, MetricsView};
pub use models::{ModelLifecycle, load_artifact};
pub use prediction::{ExplainedPrediction, PredictionWorkflow};
pub use review::{LabelConflict, ReviewWorkflow, detect_conflict};
pub use sequence::{RequestSequence, Ticket};
pub use session::Session;
pub use settings::{ClientSettings, SettingsStore};
