//! backend::mock
//!
//! Mock backend implementation for deterministic testing.
//!
//! # Design
//!
//! The mock backend stores a linear history in memory (newest first), one
//! diff per revision, an optional working-copy diff, and lets tests inject
//! failures per operation or per revision. Every call is recorded so tests
//! can assert exactly what the tracker asked for.
//!
//! # Example
//!
//! ```
//! use rangelog::backend::mock::MockBackend;
//! use rangelog::backend::VcsBackend;
//! use std::path::Path;
//!
//! # tokio_test::block_on(async {
//! let backend = MockBackend::new()
//!     .with_revision("3", "")
//!     .with_revision("2", "")
//!     .with_revision("1", "");
//!
//! let revs = backend.list_revisions(Path::new("f.rs"), 2, None).await.unwrap();
//! let ids: Vec<_> = revs.iter().map(|r| r.as_str()).collect();
//! assert_eq!(ids, vec!["3", "2"]);
//! # });
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::factory::VcsKind;
use super::traits::{BackendError, VcsBackend};
use crate::core::types::{RevisionId, RevisionInfo};

/// Mock backend for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockBackendInner>>,
}

#[derive(Debug, Default)]
struct MockBackendInner {
    /// Revisions, newest first.
    revisions: Vec<RevisionId>,
    /// Diff text per revision.
    diffs: HashMap<RevisionId, String>,
    /// Injected per-revision diff failures: payload returned with the error.
    diff_failures: HashMap<RevisionId, String>,
    /// Artificial latency per revision diff.
    diff_delays: HashMap<RevisionId, Duration>,
    /// Revisions whose diff fetch finished, in completion order.
    completed_diffs: Vec<RevisionId>,
    /// Working-copy diff text.
    working_copy_diff: String,
    /// Operation to fail on.
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail list_revisions with the given error.
    ListRevisions(BackendError),
    /// Fail working_copy_diff with the given error.
    WorkingCopyDiff(BackendError),
    /// Fail diff_of_revision for every revision with the given error.
    DiffOfRevision(BackendError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListRevisions {
        path: PathBuf,
        max_count: usize,
        older_than: Option<RevisionId>,
    },
    DiffOfRevision {
        path: PathBuf,
        revision: RevisionId,
    },
    WorkingCopyDiff {
        path: PathBuf,
    },
    RevisionMetadata {
        path: PathBuf,
        revision: RevisionId,
    },
}

fn rev(id: &str) -> RevisionId {
    RevisionId::new(id).unwrap_or_else(|e| panic!("mock revision id: {}", e))
}

impl MockBackend {
    /// Create an empty mock backend (no history, clean working copy).
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockBackendInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an older revision with its diff text.
    pub fn with_revision(self, id: &str, diff: &str) -> Self {
        {
            let mut inner = self.lock();
            let id = rev(id);
            inner.revisions.push(id.clone());
            inner.diffs.insert(id, diff.to_string());
        }
        self
    }

    /// Set the working-copy diff.
    pub fn with_working_copy_diff(self, diff: &str) -> Self {
        self.lock().working_copy_diff = diff.to_string();
        self
    }

    /// Make the diff fetch for `id` fail, returning `payload` with the error.
    pub fn with_diff_failure(self, id: &str, payload: &str) -> Self {
        self.lock().diff_failures.insert(rev(id), payload.to_string());
        self
    }

    /// Delay the diff fetch for `id` by `delay` before answering.
    pub fn with_diff_delay(self, id: &str, delay: Duration) -> Self {
        self.lock().diff_delays.insert(rev(id), delay);
        self
    }

    /// Configure an operation to fail.
    pub fn fail_on(&self, fail: FailOn) {
        self.lock().fail_on = Some(fail);
    }

    /// Clear any configured failure.
    pub fn clear_failure(&self) {
        let mut inner = self.lock();
        inner.fail_on = None;
        inner.diff_failures.clear();
    }

    /// All operations recorded so far.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Revisions whose diffs were requested, in call order.
    pub fn diff_requests(&self) -> Vec<RevisionId> {
        self.lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                MockOperation::DiffOfRevision { revision, .. } => Some(revision.clone()),
                _ => None,
            })
            .collect()
    }

    /// Revisions whose diff fetch has returned, in completion order.
    pub fn completed_diffs(&self) -> Vec<RevisionId> {
        self.lock().completed_diffs.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }
}

#[async_trait]
impl VcsBackend for MockBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    async fn list_revisions(
        &self,
        path: &Path,
        max_count: usize,
        older_than: Option<&RevisionId>,
    ) -> Result<Vec<RevisionId>, BackendError> {
        self.record(MockOperation::ListRevisions {
            path: path.to_path_buf(),
            max_count,
            older_than: older_than.cloned(),
        });

        let inner = self.lock();
        if let Some(FailOn::ListRevisions(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        let skip = match older_than {
            Some(anchor) => match inner.revisions.iter().position(|r| r == anchor) {
                Some(pos) => pos + 1,
                None => return Ok(Vec::new()),
            },
            None => 0,
        };
        Ok(inner
            .revisions
            .iter()
            .skip(skip)
            .take(max_count)
            .cloned()
            .collect())
    }

    async fn diff_of_revision(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<String, BackendError> {
        self.record(MockOperation::DiffOfRevision {
            path: path.to_path_buf(),
            revision: revision.clone(),
        });

        let delay = self.lock().diff_delays.get(revision).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        inner.completed_diffs.push(revision.clone());
        if let Some(FailOn::DiffOfRevision(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        if let Some(payload) = inner.diff_failures.get(revision) {
            return Err(BackendError::DiffUnavailable {
                revision: revision.clone(),
                message: "injected failure".into(),
                payload: payload.clone(),
            });
        }
        inner
            .diffs
            .get(revision)
            .cloned()
            .ok_or_else(|| BackendError::DiffUnavailable {
                revision: revision.clone(),
                message: "unknown revision".into(),
                payload: String::new(),
            })
    }

    async fn working_copy_diff(&self, path: &Path) -> Result<String, BackendError> {
        self.record(MockOperation::WorkingCopyDiff {
            path: path.to_path_buf(),
        });

        let inner = self.lock();
        if let Some(FailOn::WorkingCopyDiff(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        Ok(inner.working_copy_diff.clone())
    }

    async fn revision_metadata(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<RevisionInfo, BackendError> {
        self.record(MockOperation::RevisionMetadata {
            path: path.to_path_buf(),
            revision: revision.clone(),
        });

        let inner = self.lock();
        let position = inner
            .revisions
            .iter()
            .position(|r| r == revision)
            .ok_or_else(|| BackendError::RevisionNotFound {
                revision: revision.to_string(),
            })?;
        // Older revisions get older timestamps.
        let age = i64::try_from(position).unwrap_or(i64::MAX / 2);
        let timestamp = DateTime::<Utc>::from_timestamp(1_700_000_000 - age * 3600, 0)
            .unwrap_or(DateTime::UNIX_EPOCH);

        Ok(RevisionInfo {
            revision: revision.clone(),
            author: "mock".into(),
            message: format!("revision {}", revision),
            timestamp,
            diff: inner.diffs.get(revision).cloned().unwrap_or_default(),
        })
    }
}
