// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Settings commands

use std::io::Write;

use clap::Subcommand;
use spam_workflows::{ClientSettings, SettingsStore, WorkflowResult};

use crate::{
    error::ConsoleResult,
    render::{self, OutputFormat},
};

/// Settings subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved settings and where they came from
    Show,

    /// Persist a backend address for future sessions
    SetBackend {
        /// Backend base URL (http or https)
        url: String,
    },
}

/// Execute a settings command
///
/// `resolved` is the outcome of resolving settings for this session. A
/// failure is reported by `show` and ignored by `set-backend`, which replaces
/// the saved value.
pub async fn execute(
    command: ConfigCommands,
    store: &SettingsStore,
    resolved: WorkflowResult<ClientSettings>,
    out: &mut dyn Write,
    format: OutputFormat,
) -> ConsoleResult<()> {
    match command {
        ConfigCommands::Show => {
            let saved = store.saved().await;
            if format == OutputFormat::Table {
                show_table(out, store, &resolved, &saved)
            } else {
                render::write_structured(
                    out,
                    &serde_json::json!({
                        "backend_url": resolved.as_ref().ok().map(|s| &s.backend_url),
                        "error": resolved.as_ref().err().map(ToString::to_string),
                        "settings_path": store.path(),
                        "saved": saved.ok().flatten(),
                    }),
                    format,
                )
            }
        }

        ConfigCommands::SetBackend { url } => {
            let settings = ClientSettings::parse(&url)?;
            store.save(&settings).await?;
            render::success(
                out,
                &format!(
                    "Backend set to {} (saved to {})",
                    settings.backend_url,
                    store.path().display()
                ),
            )
        }
    }
}

fn show_table(
    out: &mut dyn Write,
    store: &SettingsStore,
    resolved: &WorkflowResult<ClientSettings>,
    saved: &WorkflowResult<Option<ClientSettings>>,
) -> ConsoleResult<()> {
    match resolved {
        Ok(settings) => writeln!(out, "Backend:  {}", settings.backend_url)?,
        Err(e) => writeln!(out, "Backend:  unresolved ({e})")?,
    }
    writeln!(out, "Settings: {}", store.path().display())?;

    match (saved, resolved) {
        (Ok(Some(saved)), Ok(settings)) if saved != settings => writeln!(
            out,
            "Saved:    {} (overridden for this session)",
            saved.backend_url
        )?,
        (Ok(Some(_)), _) => {}
        (Ok(None), _) => writeln!(out, "Saved:    none")?,
        (Err(e), _) => writeln!(out, "Saved:    unreadable ({e})")?,
    }

    if resolved.is_err() {
        render::info(
            out,
            "Run `spam-console config set-backend <URL>` to replace the saved backend",
        )?;
    }
    Ok(())
}
