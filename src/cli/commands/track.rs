//! track command - Revisions that changed a range of lines
//!
//! Starts a tracking session for the range and walks up to `pages`
//! windows, then prints each changing revision with the range the code
//! occupied right after it.

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{open_file, print_json, runtime};
use crate::cli::Context;
use crate::core::types::{RevisionId, RevisionKey, SourceRange};
use crate::track::RangeTracker;

/// One reported revision.
#[derive(Debug, Serialize)]
struct RangeChange {
    revision: RevisionId,
    author: String,
    timestamp: DateTime<Utc>,
    summary: String,
    /// Range right after the revision
    range: Option<SourceRange>,
    /// Range right before the revision, null if the revision introduced it
    previous: Option<SourceRange>,
}

#[derive(Debug, Serialize)]
struct TrackReport {
    file: String,
    requested: SourceRange,
    changes: Vec<RangeChange>,
    /// True when the walk reached the revision that introduced the range
    complete: bool,
}

/// Run the track command.
pub fn track(
    ctx: &Context,
    file: &Path,
    start: i64,
    end: i64,
    window: Option<usize>,
    pages: usize,
) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(track_async(ctx, file, start, end, window, pages))
}

async fn track_async(
    ctx: &Context,
    file: &Path,
    start: i64,
    end: i64,
    window: Option<usize>,
    pages: usize,
) -> Result<()> {
    let range = SourceRange::new(start, end).context("Invalid line range")?;
    let opened = open_file(ctx, file)?;
    let window = window.unwrap_or_else(|| opened.config.window_size());

    let mut tracker = RangeTracker::new(opened.backend);
    if let Some(limit) = opened.config.fetch_concurrency() {
        tracker = tracker.with_fetch_concurrency(limit);
    }

    let mut revisions = tracker
        .start_tracking(&opened.path, range, window)
        .await
        .context("Failed to track range")?;
    for _ in 1..pages.max(1) {
        if tracker.session().is_some_and(|s| s.is_exhausted()) {
            break;
        }
        let more = tracker
            .continue_tracking(window)
            .await
            .context("Failed to continue tracking")?;
        revisions.extend(more);
    }

    let mut changes = Vec::with_capacity(revisions.len());
    for revision in revisions {
        let info = tracker
            .fetch_revision_info(&opened.path, &revision)
            .await
            .with_context(|| format!("Failed to read revision {}", revision))?;
        let key = RevisionKey::Revision(revision.clone());
        let session = tracker.session();
        changes.push(RangeChange {
            range: session.and_then(|s| s.range_after(&key)),
            previous: session.and_then(|s| s.range_at(&key)),
            summary: info.summary().to_string(),
            author: info.author,
            timestamp: info.timestamp,
            revision,
        });
    }

    let report = TrackReport {
        file: opened.path.display().to_string(),
        requested: range,
        complete: tracker.session().is_some_and(|s| s.is_exhausted()),
        changes,
    };

    if ctx.json {
        return print_json(&report);
    }
    print_report(ctx, &report);
    Ok(())
}

fn print_report(ctx: &Context, report: &TrackReport) {
    if report.changes.is_empty() {
        if !ctx.quiet {
            println!(
                "No revisions changed lines {} of {}.",
                report.requested, report.file
            );
        }
        return;
    }

    for change in &report.changes {
        let range = change
            .range
            .map(|r| r.to_string())
            .unwrap_or_else(|| "?".to_string());
        if ctx.quiet {
            println!("{}", change.revision);
            continue;
        }
        println!(
            "{:<10} {} {:<16} lines {:<9} {}",
            change.revision.short(10),
            change.timestamp.format("%Y-%m-%d"),
            truncate(&change.author, 16),
            range,
            change.summary
        );
    }

    if report.complete && !ctx.quiet {
        println!();
        println!("(reached the revision that introduced these lines)");
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
