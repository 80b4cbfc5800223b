//! show command - Metadata for one revision

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_file, parse_revision, print_json, runtime};
use crate::cli::Context;
use crate::track::RangeTracker;

/// Run the show command.
pub fn show(ctx: &Context, file: &Path, revision: &str) -> Result<()> {
    let revision = parse_revision(revision)?;
    let rt = runtime()?;
    rt.block_on(async {
        let opened = open_file(ctx, file)?;
        let tracker = RangeTracker::new(opened.backend);
        let info = tracker
            .fetch_revision_info(&opened.path, &revision)
            .await
            .with_context(|| format!("Failed to read revision {}", revision))?;

        if ctx.json {
            return print_json(&info);
        }

        println!("revision {}", info.revision);
        println!("Author: {}", info.author);
        println!("Date:   {}", info.timestamp.format("%Y-%m-%d %H:%M:%S %Z"));
        println!();
        for line in info.message.trim_end().lines() {
            println!("    {}", line);
        }
        if !ctx.quiet && !info.diff.is_empty() {
            println!();
            print!("{}", info.diff);
        }
        Ok(())
    })
}
