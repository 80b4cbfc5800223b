//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the file argument and loads configuration
//! 2. Opens the backend for the file's working copy
//! 3. Runs the async operation on a tokio runtime
//! 4. Formats and displays output (text or `--json`)

mod diff_cmd;
mod log_cmd;
mod show;
mod track;
mod verify;

// Re-export command functions for testing and direct invocation
pub use diff_cmd::diff;
pub use log_cmd::log;
pub use show::show;
pub use track::track;
pub use verify::verify;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::args::Command;
use super::Context;
use crate::backend::{detect_working_copy, open_backend, VcsBackend};
use crate::core::config::Config;
use crate::core::types::RevisionId;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Track {
            file,
            start,
            end,
            window,
            pages,
        } => track::track(ctx, &file, start, end, window, pages),
        Command::Log { file, count } => log_cmd::log(ctx, &file, count),
        Command::Diff { file, revision } => diff_cmd::diff(ctx, &file, &revision),
        Command::Show { file, revision } => show::show(ctx, &file, &revision),
        Command::Verify {
            url,
            username,
            password_stdin,
        } => verify::verify(ctx, &url, &username, password_stdin),
    }
}

/// A file opened for history queries.
pub(crate) struct Opened {
    pub path: PathBuf,
    pub config: Config,
    pub backend: Arc<dyn VcsBackend>,
}

/// Resolve `file`, load configuration for its working copy, and open the
/// matching backend.
pub(crate) fn open_file(ctx: &Context, file: &Path) -> Result<Opened> {
    let path = ctx.resolve(file);
    if !path.exists() {
        anyhow::bail!("no such file: {}", path.display());
    }

    let root = detect_working_copy(&path).ok().map(|wc| wc.root);
    let loaded = Config::load(root.as_deref()).context("Failed to load configuration")?;
    if !ctx.quiet {
        for warning in &loaded.warnings {
            eprintln!("warning: {} ({})", warning.message, warning.path.display());
        }
    }
    let config = loaded.config;

    let backend = open_backend(&path, &config)
        .with_context(|| format!("Cannot open history for {}", path.display()))?;

    Ok(Opened {
        path,
        config,
        backend: Arc::new(backend),
    })
}

/// Parse a revision argument.
pub(crate) fn parse_revision(raw: &str) -> Result<RevisionId> {
    RevisionId::new(raw).with_context(|| format!("Invalid revision '{}'", raw))
}

/// Build the runtime for one command.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Print `value` as pretty JSON.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
