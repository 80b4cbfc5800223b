//! backend::factory
//!
//! Backend selection and creation.
//!
//! # Design
//!
//! The backend is chosen once, when a tracker is built, by detecting which
//! kind of working copy a file lives in. Afterwards the choice is fixed:
//! [`Backend`] is a closed set of variants behind the [`VcsBackend`]
//! capability trait and is never re-dispatched.
//!
//! # Detection
//!
//! Starting at the file's directory and walking up, the nearest ancestor
//! holding a `.git` entry selects Git and the nearest holding `.svn`
//! selects Subversion. A configured `backend` key overrides detection.
//!
//! # Example
//!
//! ```no_run
//! use rangelog::backend::{open_backend, VcsBackend, VcsKind};
//! use rangelog::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::default();
//! let backend = open_backend(Path::new("src/lib.rs"), &config).unwrap();
//! assert_eq!(backend.kind(), VcsKind::Git);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;

use super::git::GitBackend;
use super::svn::SvnBackend;
use super::traits::{BackendError, VcsBackend};
use crate::core::config::Config;
use crate::core::types::{RevisionId, RevisionInfo};

/// Supported version-control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsKind {
    Git,
    Svn,
}

impl VcsKind {
    pub fn all() -> &'static [VcsKind] {
        &[VcsKind::Git, VcsKind::Svn]
    }

    pub fn name(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Svn => "svn",
        }
    }

    /// Administrative directory marking a working copy of this kind.
    fn marker(&self) -> &'static str {
        match self {
            VcsKind::Git => ".git",
            VcsKind::Svn => ".svn",
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VcsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VcsKind::all()
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown backend '{}', must be one of: {}",
                    s,
                    valid_backend_names().join(", ")
                )
            })
    }
}

/// Names accepted for the `backend` config key.
pub fn valid_backend_names() -> Vec<&'static str> {
    VcsKind::all().iter().map(|k| k.name()).collect()
}

/// Working copy found for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    pub kind: VcsKind,
    /// Directory that holds the administrative directory
    pub root: PathBuf,
}

/// Directory a path's lookup starts from.
pub(crate) fn search_start(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Find the nearest working copy containing `path`.
///
/// # Errors
///
/// Returns `BackendError::Unavailable` if no ancestor is a working copy.
pub fn detect_working_copy(path: &Path) -> Result<WorkingCopy, BackendError> {
    let start = search_start(path);
    let start = start.canonicalize().unwrap_or(start);

    for dir in start.ancestors() {
        for kind in VcsKind::all() {
            if dir.join(kind.marker()).exists() {
                return Ok(WorkingCopy {
                    kind: *kind,
                    root: dir.to_path_buf(),
                });
            }
        }
    }

    Err(BackendError::unavailable(
        path,
        "not inside a git or svn working copy",
    ))
}

/// Detect which kind of working copy contains `path`.
pub fn detect_kind(path: &Path) -> Result<VcsKind, BackendError> {
    detect_working_copy(path).map(|wc| wc.kind)
}

/// A backend chosen at construction time.
#[derive(Debug)]
pub enum Backend {
    Git(GitBackend),
    Svn(SvnBackend),
}

/// Create the backend for the working copy containing `path`.
///
/// # Errors
///
/// Returns `BackendError::Unavailable` if detection fails and no backend is
/// configured.
pub fn open_backend(path: &Path, config: &Config) -> Result<Backend, BackendError> {
    let kind = match config.backend() {
        Some(kind) => kind,
        None => detect_kind(path)?,
    };
    tracing::debug!(%kind, path = %path.display(), "selected backend");

    Ok(match kind {
        VcsKind::Git => Backend::Git(GitBackend::new()),
        VcsKind::Svn => Backend::Svn(SvnBackend::new(config.svn())),
    })
}

#[async_trait]
impl VcsBackend for Backend {
    fn kind(&self) -> VcsKind {
        match self {
            Backend::Git(_) => VcsKind::Git,
            Backend::Svn(_) => VcsKind::Svn,
        }
    }

    async fn list_revisions(
        &self,
        path: &Path,
        max_count: usize,
        older_than: Option<&RevisionId>,
    ) -> Result<Vec<RevisionId>, BackendError> {
        match self {
            Backend::Git(b) => b.list_revisions(path, max_count, older_than).await,
            Backend::Svn(b) => b.list_revisions(path, max_count, older_than).await,
        }
    }

    async fn diff_of_revision(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<String, BackendError> {
        match self {
            Backend::Git(b) => b.diff_of_revision(path, revision).await,
            Backend::Svn(b) => b.diff_of_revision(path, revision).await,
        }
    }

    async fn working_copy_diff(&self, path: &Path) -> Result<String, BackendError> {
        match self {
            Backend::Git(b) => b.working_copy_diff(path).await,
            Backend::Svn(b) => b.working_copy_diff(path).await,
        }
    }

    async fn revision_metadata(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<RevisionInfo, BackendError> {
        match self {
            Backend::Git(b) => b.revision_metadata(path, revision).await,
            Backend::Svn(b) => b.revision_metadata(path, revision).await,
        }
    }
}
