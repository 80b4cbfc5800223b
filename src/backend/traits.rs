//! backend::traits
//!
//! Capability trait shared by all version-control backends.
//!
//! # Design
//!
//! The `VcsBackend` trait is async because every operation shells out to a
//! client or touches repository storage. Implementations are stateless with
//! respect to range tracking: they may cache derived lookups (repository
//! root, repository URL) keyed by path, but never see tracker sessions.
//!
//! # Example
//!
//! ```ignore
//! use rangelog::backend::{VcsBackend, BackendError};
//! use std::path::Path;
//!
//! async fn newest(backend: &dyn VcsBackend) -> Result<(), BackendError> {
//!     let path = Path::new("src/lib.rs");
//!     for rev in backend.list_revisions(path, 5, None).await? {
//!         let info = backend.revision_metadata(path, &rev).await?;
//!         println!("{} {}", rev.short(8), info.summary());
//!     }
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::VcsKind;
use crate::core::types::{RevisionId, RevisionInfo};

/// Errors from backend operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The path is not under version control or the client cannot be reached.
    #[error("backend unavailable for {path}: {message}")]
    Unavailable {
        /// The path that was being resolved
        path: PathBuf,
        /// Description of the failure
        message: String,
    },

    /// The diff for a revision could not be produced.
    ///
    /// `payload` carries whatever diff text the client emitted despite the
    /// failure. An empty payload makes the failure skippable for the tracker.
    #[error("diff unavailable for revision {revision}: {message}")]
    DiffUnavailable {
        /// Revision whose diff was requested
        revision: RevisionId,
        /// Description of the failure
        message: String,
        /// Diff text produced alongside the failure
        payload: String,
    },

    /// The requested revision does not exist.
    #[error("revision not found: {revision}")]
    RevisionNotFound {
        /// The revision as requested
        revision: String,
    },

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}

impl BackendError {
    pub(crate) fn unavailable(path: &Path, message: impl Into<String>) -> Self {
        BackendError::Unavailable {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Diff text that came back with a failed diff fetch, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            BackendError::DiffUnavailable { payload, .. } if !payload.is_empty() => {
                Some(payload)
            }
            _ => None,
        }
    }

    /// Whether the tracker may drop the revision and continue the cycle.
    pub fn is_skippable(&self) -> bool {
        matches!(self, BackendError::DiffUnavailable { payload, .. } if payload.is_empty())
    }
}

/// Uniform capability surface over a version-control client.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the tracker fans diff fetches out
/// across tasks that share one backend.
///
/// # Ordering
///
/// Revision lists are always newest first.
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Which version-control system this backend talks to.
    fn kind(&self) -> VcsKind;

    /// List up to `max_count` revisions that touched `path`, newest first.
    ///
    /// With `older_than`, listing starts strictly before that revision.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the path is not versioned or the client fails
    async fn list_revisions(
        &self,
        path: &Path,
        max_count: usize,
        older_than: Option<&RevisionId>,
    ) -> Result<Vec<RevisionId>, BackendError>;

    /// Unified diff of the change `revision` introduced to `path`, relative
    /// to its immediate predecessor.
    ///
    /// # Errors
    ///
    /// - `DiffUnavailable` if the diff cannot be produced (possibly with a
    ///   partial payload)
    async fn diff_of_revision(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<String, BackendError>;

    /// Unified diff from the latest known revision to the on-disk content
    /// of `path`. Empty when there are no local modifications.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the path cannot be resolved
    async fn working_copy_diff(&self, path: &Path) -> Result<String, BackendError>;

    /// Author, message, timestamp and diff for `revision`.
    ///
    /// # Errors
    ///
    /// - `RevisionNotFound` if the revision does not exist
    async fn revision_metadata(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<RevisionInfo, BackendError>;
}
