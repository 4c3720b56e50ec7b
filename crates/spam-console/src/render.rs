// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Output formatting utilities

use std::io::Write;

use api_client::{Explanation, FeatureImportance};
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::error::ConsoleResult;

/// Widest histogram bar, in characters
const BAR_WIDTH: u64 = 40;

/// Output format for console commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Write rows as a table, or the same rows serialized
pub fn write_rows<T: Serialize + Tabled>(
    out: &mut dyn Write,
    rows: Vec<T>,
    format: OutputFormat,
    empty: &str,
) -> ConsoleResult<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                writeln!(out, "{}", empty.dimmed())?;
            } else {
                writeln!(out, "{}", Table::new(rows))?;
            }
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => write_structured(out, &rows, format),
    }
}

/// Write a value as JSON or YAML; tables fall back to JSON
pub fn write_structured<T: Serialize + ?Sized>(
    out: &mut dyn Write,
    data: &T,
    format: OutputFormat,
) -> ConsoleResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(data)?)?;
        }
        OutputFormat::Yaml => {
            write!(out, "{}", serde_yaml::to_string(data)?)?;
        }
    }
    Ok(())
}

/// Write a success message
pub fn success(out: &mut dyn Write, message: &str) -> ConsoleResult<()> {
    writeln!(out, "{} {message}", "✓".green())?;
    Ok(())
}

/// Write an info message
pub fn info(out: &mut dyn Write, message: &str) -> ConsoleResult<()> {
    writeln!(out, "{} {message}", "ℹ".blue())?;
    Ok(())
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {message}", "✗".red());
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {message}", "⚠".yellow());
}

/// Strongest `top` features, by magnitude, ties kept in backend order
pub fn rank_features(explanation: &Explanation, top: usize) -> Vec<FeatureImportance> {
    let mut features = explanation.features.clone();
    features.sort_by(|a, b| b.magnitude().total_cmp(&a.magnitude()));
    features.truncate(top);
    features
}

/// Bar for a whole-number percentage
pub fn bar(percent: u64) -> String {
    let cells = (percent.min(100) * BAR_WIDTH + 50) / 100;
    "█".repeat(usize::try_from(cells).unwrap_or(0))
}

/// Shorten `text` to at most `width` characters on one line
pub fn truncate(text: &str, width: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= width {
        return flat;
    }
    let kept: String = flat.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}
