// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Metrics command

use std::io::Write;

use api_client::{MetricsSnapshot, SpamBackend};
use serde::Serialize;
use spam_workflows::{Histogram, Session};
use tabled::Tabled;

use crate::{
    error::ConsoleResult,
    render::{self, OutputFormat},
};

#[derive(Debug, Serialize, Tabled)]
struct CounterRow {
    metric: &'static str,
    value: String,
}

fn counter(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn counter_rows(snapshot: &MetricsSnapshot) -> Vec<CounterRow> {
    vec![
        CounterRow {
            metric: "messages/day",
            value: counter(snapshot.messages_per_day, 0),
        },
        CounterRow {
            metric: "spam rate",
            value: snapshot
                .spam_rate
                .map_or_else(|| "-".to_string(), |rate| format!("{:.1}%", rate * 100.0)),
        },
        CounterRow {
            metric: "false positives",
            value: counter(snapshot.false_positives, 0),
        },
        CounterRow {
            metric: "avg latency (ms)",
            value: counter(snapshot.avg_latency_ms, 1),
        },
    ]
}

fn histogram_lines(histogram: &Histogram) -> Vec<String> {
    histogram
        .buckets()
        .iter()
        .zip(histogram.percent_heights())
        .map(|(bucket, percent)| {
            let range = match bucket.high {
                Some(high) => format!("{:.1}-{high:.1}", bucket.low),
                None => format!("{:.1}", bucket.low),
            };
            format!(
                "{range:>8} │{:<40} {percent:>3}% ({})",
                render::bar(percent),
                bucket.count
            )
        })
        .collect()
}

/// Execute the metrics command
pub async fn execute<B: SpamBackend>(
    session: &Session<B>,
    out: &mut dyn Write,
    format: OutputFormat,
) -> ConsoleResult<()> {
    let view = session.metrics();
    let snapshot = view.refresh().await?;

    if format != OutputFormat::Table {
        return render::write_structured(out, &snapshot, format);
    }

    render::write_rows(out, counter_rows(&snapshot), format, "No metrics")?;

    let active = view
        .models()
        .await
        .into_iter()
        .find(|m| m.active == Some(true))
        .map(|m| m.version);
    if let Some(version) = active {
        render::info(out, &format!("Serving model {version}"))?;
    }

    let histogram = Histogram::new(snapshot.confidence_histogram);
    writeln!(out, "Confidence distribution ({} predictions)", histogram.total())?;
    if histogram.buckets().is_empty() {
        writeln!(out, "  no data")?;
    }
    for line in histogram_lines(&histogram) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
