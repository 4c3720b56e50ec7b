// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Predict command

use std::io::Write;

use api_client::{PredictionResult, SpamBackend};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use shared_types::SpamLabel;
use spam_workflows::Session;
use tabled::Tabled;

use crate::{
    error::ConsoleResult,
    render::{self, OutputFormat},
};

/// Features shown by default with `--explain`
pub const DEFAULT_TOP_FEATURES: usize = 12;

/// Arguments of `predict`
#[derive(Debug, Clone, Args)]
pub struct PredictArgs {
    /// Message to classify
    pub text: String,

    /// Decision threshold overriding the serving model's
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Show the features that drove the prediction
    #[arg(short, long)]
    pub explain: bool,

    /// Number of features to show with --explain
    #[arg(long, default_value_t = DEFAULT_TOP_FEATURES)]
    pub top: usize,
}

#[derive(Debug, Serialize, Tabled)]
struct FeatureRow {
    #[tabled(rename = "#")]
    rank: usize,
    feature: String,
    contribution: String,
    toward: String,
}

fn label_text(result: &PredictionResult) -> String {
    match result.label {
        Some(SpamLabel::Spam) => "SPAM".red().bold().to_string(),
        Some(SpamLabel::Ham) => "HAM".green().bold().to_string(),
        None => "unlabeled".dimmed().to_string(),
    }
}

/// Execute the predict command
pub async fn execute<B: SpamBackend>(
    args: PredictArgs,
    session: &Session<B>,
    out: &mut dyn Write,
    format: OutputFormat,
) -> ConsoleResult<()> {
    let workflow = session.prediction();

    let (result, explanation) = if args.explain {
        let explained = workflow
            .predict_with_explanation(&args.text, args.threshold)
            .await?;
        (explained.prediction, explained.explanation)
    } else {
        (workflow.predict(&args.text, args.threshold).await?, None)
    };

    if format != OutputFormat::Table {
        let mut full = result;
        full.explanation = explanation;
        return render::write_structured(out, &full, format);
    }

    let probability = result
        .spam_probability
        .map_or_else(|| "n/a".to_string(), |p| p.to_string());
    let model = result.model_version.as_deref().unwrap_or("unknown");
    writeln!(
        out,
        "{}  probability {probability}  model {model}",
        label_text(&result)
    )?;

    if args.explain {
        match explanation {
            Some(explanation) => {
                let rows: Vec<FeatureRow> = render::rank_features(&explanation, args.top)
                    .into_iter()
                    .enumerate()
                    .map(|(i, feature)| FeatureRow {
                        rank: i + 1,
                        contribution: format!("{:+.4}", feature.value),
                        toward: feature
                            .pushes_toward()
                            .map_or_else(|| "-".to_string(), |label| label.to_string()),
                        feature: feature.name,
                    })
                    .collect();
                render::write_rows(out, rows, format, "No feature contributions")?;
            }
            None => render::info(out, "The backend returned no explanation for this message")?,
        }
    }

    Ok(())
}
