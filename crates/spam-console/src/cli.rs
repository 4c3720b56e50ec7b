// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line definition

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use crate::{
    commands::{
        config::ConfigCommands, models::ModelsCommands, predict::PredictArgs,
        review::ReviewCommands,
    },
    render::OutputFormat,
};

/// Operator console for the spam-classification service
#[derive(Debug, Parser)]
#[command(name = "spam-console")]
#[command(about = "Score messages, work the review queue and manage model versions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL for this invocation (overrides saved settings and environment)
    #[arg(short, long, global = true)]
    pub backend: Option<Url>,

    /// Settings file path
    #[arg(long, env = "SPAM_CONSOLE_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Score a message
    Predict(PredictArgs),

    /// Work the human review queue
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },

    /// Manage model versions
    #[command(alias = "model")]
    Models {
        #[command(subcommand)]
        command: ModelsCommands,
    },

    /// Show the operational snapshot
    Metrics,

    /// Show or change client settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}
