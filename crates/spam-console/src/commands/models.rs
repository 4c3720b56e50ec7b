// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Model lifecycle commands

use std::{io::Write, path::PathBuf};

use api_client::{ModelVersion, SpamBackend};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use spam_workflows::{Session, load_artifact};
use tabled::Tabled;

use crate::{
    error::ConsoleResult,
    render::{self, OutputFormat},
};

/// Model subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ModelsCommands {
    /// List known model versions
    List,

    /// Upload a model artifact as a new version
    Upload {
        /// Version identifier for the new model
        #[arg(long)]
        version: String,

        /// Path to the model artifact
        #[arg(short, long)]
        file: PathBuf,

        /// Serving threshold; the backend default applies when omitted
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Make a version the serving model
    Activate {
        /// Version to activate
        version: String,
    },

    /// Schedule a retraining job on the backend
    Retrain {
        /// Dataset path on the backend
        #[arg(short, long)]
        dataset: Option<String>,

        /// Train without dataset augmentation
        #[arg(long)]
        no_augment: bool,
    },
}

/// Table row for model display
#[derive(Debug, Serialize, Tabled)]
struct ModelRow {
    active: String,
    version: String,
    threshold: String,
    created: String,
}

impl From<&ModelVersion> for ModelRow {
    fn from(model: &ModelVersion) -> Self {
        Self {
            active: if model.active == Some(true) {
                "●".green().to_string()
            } else {
                String::new()
            },
            version: model.version.clone(),
            threshold: model.threshold.to_string(),
            created: model.created_at.map_or_else(
                || "-".to_string(),
                |at| at.format("%Y-%m-%d %H:%M").to_string(),
            ),
        }
    }
}

fn write_models(
    out: &mut dyn Write,
    models: &[ModelVersion],
    format: OutputFormat,
) -> ConsoleResult<()> {
    if format == OutputFormat::Table {
        let rows = models.iter().map(ModelRow::from).collect();
        render::write_rows(out, rows, format, "No models uploaded")
    } else {
        render::write_structured(out, models, format)
    }
}

/// Execute a models command
pub async fn execute<B: SpamBackend>(
    command: ModelsCommands,
    session: &Session<B>,
    out: &mut dyn Write,
    format: OutputFormat,
) -> ConsoleResult<()> {
    let models = session.models();

    match command {
        ModelsCommands::List => {
            let versions = models.refresh().await?;
            write_models(out, &versions, format)
        }

        ModelsCommands::Upload {
            version,
            file,
            threshold,
        } => {
            let artifact = load_artifact(&file).await?;
            let ack = models.upload(artifact, &version, threshold).await?;

            if format == OutputFormat::Table {
                render::success(
                    out,
                    ack.message.as_deref().unwrap_or(&format!("Uploaded {version}")),
                )?;
            }
            write_models(out, &models.versions().await, format)
        }

        ModelsCommands::Activate { version } => {
            let ack = models.activate(&version).await?;

            if format == OutputFormat::Table {
                render::success(
                    out,
                    ack.message
                        .as_deref()
                        .unwrap_or(&format!("Activated {version}")),
                )?;
            }
            write_models(out, &models.versions().await, format)
        }

        ModelsCommands::Retrain {
            dataset,
            no_augment,
        } => {
            let ack = models.retrain(dataset, Some(!no_augment)).await?;

            if format == OutputFormat::Table {
                render::success(
                    out,
                    ack.message.as_deref().unwrap_or("Retraining scheduled"),
                )?;
                if let Some(job_id) = &ack.job_id {
                    render::info(out, &format!("Job {job_id}"))?;
                }
                Ok(())
            } else {
                render::write_structured(out, &ack, format)
            }
        }
    }
}
