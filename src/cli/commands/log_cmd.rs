//! log command - Revisions that touched a file
//!
//! Direct pass-through to the backend listing, newest first.

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_file, print_json, runtime};
use crate::cli::Context;
use crate::track::RangeTracker;

/// Run the log command.
pub fn log(ctx: &Context, file: &Path, count: usize) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let opened = open_file(ctx, file)?;
        let tracker = RangeTracker::new(opened.backend);
        let revisions = tracker
            .fetch_log(&opened.path, count)
            .await
            .context("Failed to list revisions")?;

        if ctx.json {
            return print_json(&revisions);
        }
        if revisions.is_empty() && !ctx.quiet {
            println!("No revisions touch {}.", opened.path.display());
        }
        for revision in &revisions {
            println!("{}", revision);
        }
        Ok(())
    })
}
