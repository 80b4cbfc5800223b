//! diff command - The change a revision made to a file

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_file, parse_revision, print_json, runtime};
use crate::cli::Context;
use crate::track::RangeTracker;

/// Run the diff command.
pub fn diff(ctx: &Context, file: &Path, revision: &str) -> Result<()> {
    let revision = parse_revision(revision)?;
    let rt = runtime()?;
    rt.block_on(async {
        let opened = open_file(ctx, file)?;
        let tracker = RangeTracker::new(opened.backend);
        let text = tracker
            .fetch_revision_diff(&opened.path, &revision)
            .await
            .with_context(|| format!("Failed to read diff of {}", revision))?;

        if ctx.json {
            return print_json(&serde_json::json!({
                "revision": revision,
                "diff": text,
            }));
        }
        print!("{}", text);
        Ok(())
    })
}
