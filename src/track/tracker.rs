//! track::tracker
//!
//! The range history tracker: collection cycles over revision windows.
//!
//! # Cycle
//!
//! One cycle is three stages, in order:
//!
//! 1. list up to `window` revisions older than anything seen so far;
//! 2. fetch every listed revision's diff concurrently and key the results
//!    by revision;
//! 3. walk the window newest first, translating the tracked range backward
//!    one diff at a time.
//!
//! Only stage 3 touches the session, and its changes are staged and applied
//! once the whole cycle has succeeded. A failed cycle leaves the session
//! exactly as it was, so the caller can retry it.
//!
//! # Failure policy
//!
//! A diff fetch failing with `DiffUnavailable` and no payload drops that
//! revision from the window. The same failure with a payload, or any other
//! backend error, aborts the cycle.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use std::sync::Arc;
//! use rangelog::backend::mock::MockBackend;
//! use rangelog::core::types::SourceRange;
//! use rangelog::track::RangeTracker;
//!
//! # tokio_test::block_on(async {
//! let backend = MockBackend::new().with_revision(
//!     "r1",
//!     "--- a/f\n+++ b/f\n@@ -8,5 +8,7 @@\n l8\n l9\n+n10\n+n11\n l10\n l11\n l12\n",
//! );
//! let mut tracker = RangeTracker::new(Arc::new(backend));
//!
//! let range = SourceRange::new(10, 12).unwrap();
//! let changed = tracker.start_tracking(Path::new("f"), range, 10).await.unwrap();
//! assert_eq!(changed[0].as_str(), "r1");
//! # });
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::session::{CycleUpdate, TrackingSession};
use super::translate::translate;
use crate::backend::{BackendError, VcsBackend};
use crate::core::types::{RevisionId, RevisionInfo, RevisionKey, SourceRange};
use crate::diff::{Diff, DiffParseError};

/// Errors from tracking operations.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("no active tracking session; start tracking first")]
    NoActiveSession,

    #[error("window size must be at least 1")]
    InvalidWindowSize,

    #[error("malformed diff for {revision}: {source}")]
    MalformedDiff {
        revision: RevisionKey,
        source: DiffParseError,
    },

    #[error("diff fetch task failed: {0}")]
    FetchTask(String),
}

/// Tracks one line range backward through a file's history.
///
/// Holds at most one session. Every operation that touches the session
/// takes `&mut self`, so two cycles can never run on it at once.
pub struct RangeTracker {
    backend: Arc<dyn VcsBackend>,
    fetch_concurrency: Option<usize>,
    session: Option<TrackingSession>,
}

impl std::fmt::Debug for RangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeTracker")
            .field("backend", &self.backend.kind())
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("session", &self.session)
            .finish()
    }
}

/// Diff text for one step of the walk, after the skip policy.
type WalkStep = (RevisionKey, String);

impl RangeTracker {
    pub fn new(backend: Arc<dyn VcsBackend>) -> Self {
        Self {
            backend,
            fetch_concurrency: None,
            session: None,
        }
    }

    /// Cap concurrent diff fetches. Defaults to the window size.
    pub fn with_fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = Some(limit.max(1));
        self
    }

    pub fn backend(&self) -> &Arc<dyn VcsBackend> {
        &self.backend
    }

    /// The active session, if tracking has started.
    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    /// Discard the active session.
    pub fn end_tracking(&mut self) {
        self.session = None;
    }

    /// Start a new session for `range` in `path` and run its first cycle.
    ///
    /// Any previous session is discarded. The new session is kept only if
    /// the first cycle succeeds.
    ///
    /// Returns the revisions in the window that changed the tracked range,
    /// newest first.
    ///
    /// # Errors
    ///
    /// - `InvalidWindowSize` if `window` is zero
    /// - `Backend` if the working-copy diff, the listing, or a non-skippable
    ///   diff fetch fails
    /// - `MalformedDiff` if a fetched diff cannot be parsed
    pub async fn start_tracking(
        &mut self,
        path: &Path,
        range: SourceRange,
        window: usize,
    ) -> Result<Vec<RevisionId>, TrackError> {
        self.session = None;
        if window == 0 {
            return Err(TrackError::InvalidWindowSize);
        }
        tracing::info!(path = %path.display(), %range, window, "start tracking");

        let working = self.backend.working_copy_diff(path).await?;
        let mut session = TrackingSession::new(path, range);
        let changed = self.run_cycle(&mut session, window, Some(working)).await?;

        self.session = Some(session);
        Ok(changed)
    }

    /// Run one more cycle on the active session, continuing from where the
    /// last one stopped.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if tracking has not started
    /// - otherwise as for [`start_tracking`](Self::start_tracking); the
    ///   session is unchanged on error
    pub async fn continue_tracking(
        &mut self,
        window: usize,
    ) -> Result<Vec<RevisionId>, TrackError> {
        if window == 0 {
            return Err(TrackError::InvalidWindowSize);
        }
        let mut session = self.session.clone().ok_or(TrackError::NoActiveSession)?;
        if session.is_exhausted() {
            tracing::debug!("session exhausted, nothing further to trace");
            return Ok(Vec::new());
        }

        let changed = self.run_cycle(&mut session, window, None).await?;
        self.session = Some(session);
        Ok(changed)
    }

    /// List up to `length` revisions of `path`, newest first.
    pub async fn fetch_log(
        &self,
        path: &Path,
        length: usize,
    ) -> Result<Vec<RevisionId>, TrackError> {
        Ok(self.backend.list_revisions(path, length, None).await?)
    }

    /// Diff text introduced by `revision`.
    pub async fn fetch_revision_diff(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<String, TrackError> {
        Ok(self.backend.diff_of_revision(path, revision).await?)
    }

    /// Metadata for `revision`.
    pub async fn fetch_revision_info(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<RevisionInfo, TrackError> {
        Ok(self.backend.revision_metadata(path, revision).await?)
    }

    /// One collection cycle against `session`. `session` is only modified
    /// when `Ok` is returned.
    async fn run_cycle(
        &self,
        session: &mut TrackingSession,
        window: usize,
        working_diff: Option<String>,
    ) -> Result<Vec<RevisionId>, TrackError> {
        let path = session.path().to_path_buf();

        let listed = self
            .backend
            .list_revisions(&path, window, session.list_anchor())
            .await?;
        let list_anchor = listed.last().cloned();
        let revisions: Vec<RevisionId> = listed
            .into_iter()
            .filter(|rev| !session.contains(rev))
            .collect();
        tracing::debug!(count = revisions.len(), "listed revisions");

        let mut diffs = self.fetch_diffs(&path, &revisions, window).await?;

        let mut steps: Vec<WalkStep> = Vec::with_capacity(revisions.len() + 1);
        if let Some(diff) = working_diff.filter(|d| !d.is_empty()) {
            steps.push((RevisionKey::WorkingCopy, diff));
        }
        for rev in revisions {
            match diffs.remove(&rev) {
                Some(Ok(diff)) => steps.push((RevisionKey::Revision(rev), diff)),
                Some(Err(err)) if err.is_skippable() => {
                    tracing::debug!(revision = %rev, error = %err, "skipping revision");
                }
                Some(Err(err)) => {
                    tracing::warn!(revision = %rev, error = %err, "diff fetch failed");
                    return Err(err.into());
                }
                None => {
                    return Err(TrackError::FetchTask(format!(
                        "no diff result for revision {}",
                        rev
                    )))
                }
            }
        }

        let (mut update, changed) = walk(session.current_range(), steps)?;
        update.list_anchor = list_anchor;
        session.apply(update);
        tracing::debug!(changed = changed.len(), "cycle complete");
        Ok(changed)
    }

    /// Fetch all diffs concurrently, keyed by revision.
    async fn fetch_diffs(
        &self,
        path: &Path,
        revisions: &[RevisionId],
        window: usize,
    ) -> Result<HashMap<RevisionId, Result<String, BackendError>>, TrackError> {
        let limit = self.fetch_concurrency.unwrap_or(window).max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();

        for rev in revisions {
            let backend = Arc::clone(&self.backend);
            let semaphore = Arc::clone(&semaphore);
            let path = path.to_path_buf();
            let rev = rev.clone();
            tasks.spawn(async move {
                // Never closed.
                let _permit = semaphore.acquire_owned().await;
                let result = backend.diff_of_revision(&path, &rev).await;
                (rev, result)
            });
        }

        let mut results = HashMap::with_capacity(revisions.len());
        while let Some(joined) = tasks.join_next().await {
            let (rev, result) = joined.map_err(|e| TrackError::FetchTask(e.to_string()))?;
            results.insert(rev, result);
        }
        Ok(results)
    }
}

/// Translate `current` backward through `steps`, newest first.
///
/// Returns the staged session entries and the committed revisions that
/// changed the range. Working-copy changes are recorded but never reported.
fn walk(
    mut current: SourceRange,
    steps: Vec<WalkStep>,
) -> Result<(CycleUpdate, Vec<RevisionId>), TrackError> {
    let mut update = CycleUpdate::default();
    let mut changed = Vec::new();

    if current.is_null() {
        update.exhausted = true;
        return Ok((update, changed));
    }

    for (key, text) in steps {
        if text.is_empty() {
            update.entries.push((key, current));
            continue;
        }

        let diff = Diff::parse(&text).map_err(|source| TrackError::MalformedDiff {
            revision: key.clone(),
            source,
        })?;
        let translation = translate(current, diff.first_file_hunks());
        if translation.is_boundary() {
            tracing::debug!(revision = %key, "range has no earlier counterpart");
            update.exhausted = true;
            break;
        }

        if translation.changed {
            if let RevisionKey::Revision(rev) = &key {
                changed.push(rev.clone());
            }
        }
        current = translation.range;
        update.entries.push((key, current));
    }

    Ok((update, changed))
}
