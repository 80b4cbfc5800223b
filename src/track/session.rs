//! track::session
//!
//! Per-request tracking state.
//!
//! # Mapping
//!
//! The session keeps an ordered list of `(key, range)` entries, newest
//! first. The range stored for a key is where the tracked code sat just
//! before that key's change was applied, i.e. in the coordinates of the
//! next older state. The range a revision itself left behind is the range
//! stored for the entry above it (or the requested range for the newest).
//!
//! Sessions live in memory only and are owned by one [`RangeTracker`].
//!
//! [`RangeTracker`]: super::RangeTracker

use std::path::{Path, PathBuf};

use crate::core::types::{RevisionId, RevisionKey, SourceRange};

/// Mutable state for one tracking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSession {
    path: PathBuf,
    requested: SourceRange,
    /// Most recently processed point in history
    cursor: RevisionKey,
    /// Oldest revision listed so far, used to page the next window
    list_anchor: Option<RevisionId>,
    ranges: Vec<(RevisionKey, SourceRange)>,
    exhausted: bool,
}

/// Session changes produced by one collection cycle, applied only when the
/// cycle succeeds.
#[derive(Debug, Default)]
pub(crate) struct CycleUpdate {
    pub entries: Vec<(RevisionKey, SourceRange)>,
    pub list_anchor: Option<RevisionId>,
    pub exhausted: bool,
}

impl TrackingSession {
    pub(crate) fn new(path: &Path, requested: SourceRange) -> Self {
        Self {
            path: path.to_path_buf(),
            requested,
            cursor: RevisionKey::WorkingCopy,
            list_anchor: None,
            ranges: Vec::new(),
            exhausted: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The range the caller asked about, in working-copy coordinates.
    pub fn requested(&self) -> SourceRange {
        self.requested
    }

    pub fn cursor(&self) -> &RevisionKey {
        &self.cursor
    }

    pub(crate) fn list_anchor(&self) -> Option<&RevisionId> {
        self.list_anchor.as_ref()
    }

    /// Whether the walk hit a boundary; no further cycle can make progress.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Range recorded for `key`: where the code sat just before `key`.
    pub fn range_at(&self, key: &RevisionKey) -> Option<SourceRange> {
        self.ranges
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, range)| *range)
    }

    /// Range the code occupied right after `key` was applied.
    pub fn range_after(&self, key: &RevisionKey) -> Option<SourceRange> {
        let pos = self.ranges.iter().position(|(k, _)| k == key)?;
        Some(match pos {
            0 => self.requested,
            n => self.ranges[n - 1].1,
        })
    }

    /// Range at the cursor, or the requested range before the first step.
    pub fn current_range(&self) -> SourceRange {
        self.range_at(&self.cursor).unwrap_or(self.requested)
    }

    /// All recorded entries, newest first.
    pub fn history(&self) -> &[(RevisionKey, SourceRange)] {
        &self.ranges
    }

    pub(crate) fn contains(&self, revision: &RevisionId) -> bool {
        self.ranges
            .iter()
            .any(|(k, _)| k.revision() == Some(revision))
    }

    pub(crate) fn apply(&mut self, update: CycleUpdate) {
        if let Some((last, _)) = update.entries.last() {
            self.cursor = last.clone();
        }
        self.ranges.extend(update.entries);
        if update.list_anchor.is_some() {
            self.list_anchor = update.list_anchor;
        }
        self.exhausted |= update.exhausted;
    }
}
