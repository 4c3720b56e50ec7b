// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Operator console for the spam-classification service
//!
//! The console is a thin layer over [`spam_workflows`]: it resolves settings,
//! opens a [`Session`] against the configured backend and renders each
//! workflow's outcome as a table, JSON or YAML.
//!
//! # Module Structure
//!
//! - [`cli`]: argument parsing
//! - [`commands`]: one module per command group
//! - [`render`]: tables, bars and status lines
//! - [`error`]: console error type
//!
//! Commands write to any [`Write`] so they run the same against stdout and
//! against a buffer in tests.

use std::{io::Write, process::ExitCode};

use api_client::HttpBackend;
use spam_workflows::{ClientSettings, Session, SettingsStore, WorkflowResult};
use tracing::{debug, warn};

pub mod cli;
pub mod commands;
pub mod error;
pub mod render;

pub use cli::{Cli, Commands};
pub use error::{ConsoleError, ConsoleResult};
pub use render::OutputFormat;

/// Run one parsed invocation, writing its output to `out`
///
/// Settings commands run even when the saved settings cannot be resolved, so
/// a broken settings file can be inspected and replaced.
pub async fn run(cli: Cli, out: &mut dyn Write) -> ConsoleResult<()> {
    let store = SettingsStore::locate(cli.settings)?;
    let resolved = store.load(cli.backend.as_ref());
    let overridden = cli.backend.is_some();
    let format = cli.output;

    match cli.command {
        Commands::Config { command } => {
            commands::config::execute(command, &store, resolved, out, format).await
        }
        Commands::Predict(args) => {
            let session = open_session(&store, resolved, overridden).await?;
            commands::predict::execute(args, &session, out, format).await
        }
        Commands::Review { command } => {
            let session = open_session(&store, resolved, overridden).await?;
            commands::review::execute(command, &session, out, format).await
        }
        Commands::Models { command } => {
            let session = open_session(&store, resolved, overridden).await?;
            commands::models::execute(command, &session, out, format).await
        }
        Commands::Metrics => {
            let session = open_session(&store, resolved, overridden).await?;
            commands::metrics::execute(&session, out, format).await
        }
    }
}

/// Run `cli`, flush `out` and report a failure on stderr
///
/// Output written before a failure is flushed before the exit code is
/// returned.
pub async fn run_and_report(cli: Cli, out: &mut dyn Write) -> ExitCode {
    let outcome = run(cli, out).await;
    let flushed = out.flush();

    match (outcome, flushed) {
        (Ok(()), Ok(())) => ExitCode::SUCCESS,
        (Err(e), _) => {
            render::print_error(&e.to_string());
            ExitCode::FAILURE
        }
        (Ok(()), Err(e)) => {
            render::print_error(&format!("Failed to flush output: {e}"));
            ExitCode::FAILURE
        }
    }
}

async fn open_session(
    store: &SettingsStore,
    resolved: WorkflowResult<ClientSettings>,
    overridden: bool,
) -> ConsoleResult<Session<HttpBackend>> {
    let settings = resolved?;
    debug!(
        path = %store.path().display(),
        backend_url = %settings.backend_url,
        "settings resolved"
    );

    if !overridden
        && let Ok(Some(saved)) = store.saved().await
        && saved != settings
    {
        warn!(
            saved = %saved.backend_url,
            resolved = %settings.backend_url,
            "saved backend is overridden by the environment"
        );
    }

    Ok(Session::connect(settings)?)
}
