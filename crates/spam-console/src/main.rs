// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Spam Console
//!
//! Operator command line for the spam-classification service.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use spam_console::Cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // logs go to stderr so structured output on stdout stays parseable
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialize logging")?;

    let mut stdout = std::io::stdout().lock();
    Ok(spam_console::run_and_report(cli, &mut stdout).await)
}
