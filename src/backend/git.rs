//! backend::git
//!
//! Git backend implemented on `git2`.
//!
//! # Architecture
//!
//! This is the only module that imports `git2`. Every operation opens the
//! repository inside `spawn_blocking` (libgit2 handles are not `Sync`) and
//! normalizes errors into [`BackendError`] categories.
//!
//! # History model
//!
//! History is walked along first parents only. A commit "touches" a file
//! when the file's blob differs from the one in its first parent (including
//! appearing or disappearing). Diffs are rendered as unified patch text
//! limited to the file, with libgit2's default three lines of context.
//!
//! # Caching
//!
//! The working-directory root of each path is resolved once and cached for
//! the lifetime of the backend. Entries are never replaced, so concurrent
//! readers always see the same answer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use git2::{Commit, DiffFormat, DiffOptions, Repository};

use super::factory::{search_start, VcsKind};
use super::traits::{BackendError, VcsBackend};
use crate::core::types::{RevisionId, RevisionInfo};

/// Git implementation of [`VcsBackend`].
#[derive(Debug, Default, Clone)]
pub struct GitBackend {
    /// Absolute file path -> working-directory root.
    roots: Arc<RwLock<HashMap<PathBuf, PathBuf>>>,
}

/// A repository opened for one file.
struct Located {
    repo: Repository,
    /// File path relative to the working directory
    relative: PathBuf,
}

impl GitBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached working-directory root for `path`, if already resolved.
    pub fn cached_root(&self, path: &Path) -> Option<PathBuf> {
        let abs = absolute(path);
        self.roots.read().ok()?.get(&abs).cloned()
    }

    /// Run `op` against the repository holding `path` on the blocking pool.
    async fn with_repo<T, F>(&self, path: &Path, op: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Located) -> Result<T, BackendError> + Send + 'static,
    {
        let roots = Arc::clone(&self.roots);
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let located = locate(&roots, &owned)?;
            op(&located)
        })
        .await
        .map_err(|e| BackendError::unavailable(path, format!("git task failed: {}", e)))?
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve the repository for `path`, consulting and filling the root cache.
fn locate(
    roots: &RwLock<HashMap<PathBuf, PathBuf>>,
    path: &Path,
) -> Result<Located, BackendError> {
    let abs = absolute(path);

    let cached = roots.read().ok().and_then(|map| map.get(&abs).cloned());
    let root = match cached {
        Some(root) => {
            tracing::trace!(path = %abs.display(), "git root cache hit");
            root
        }
        None => {
            let repo = Repository::discover(search_start(&abs))
                .map_err(|_| BackendError::unavailable(path, "not a git repository"))?;
            let workdir = repo
                .workdir()
                .ok_or_else(|| BackendError::unavailable(path, "bare repository not supported"))?;
            let root = absolute(workdir);
            if let Ok(mut map) = roots.write() {
                map.entry(abs.clone()).or_insert_with(|| root.clone());
            }
            root
        }
    };

    let relative = abs
        .strip_prefix(&root)
        .map_err(|_| BackendError::unavailable(path, "path is outside the repository"))?
        .to_path_buf();
    let repo = Repository::open(&root)
        .map_err(|e| BackendError::unavailable(path, e.message().to_string()))?;

    Ok(Located { repo, relative })
}

fn find_commit<'r>(repo: &'r Repository, revision: &str) -> Result<Commit<'r>, git2::Error> {
    repo.revparse_single(revision)?.peel_to_commit()
}

fn revision_id(oid: git2::Oid) -> Result<RevisionId, git2::Error> {
    RevisionId::new(oid.to_string()).map_err(|e| git2::Error::from_str(&e.to_string()))
}

/// Blob id of `relative` in `commit`'s tree, if present.
fn entry_id(commit: &Commit<'_>, relative: &Path) -> Result<Option<git2::Oid>, git2::Error> {
    let tree = commit.tree()?;
    let id = tree.get_path(relative).ok().map(|entry| entry.id());
    Ok(id)
}

/// Whether `commit` changed `relative` relative to its first parent.
fn touches(commit: &Commit<'_>, relative: &Path) -> Result<bool, git2::Error> {
    let own = entry_id(commit, relative)?;
    let parent = match commit.parent(0) {
        Ok(parent) => entry_id(&parent, relative)?,
        Err(_) => None,
    };
    Ok(own != parent)
}

fn path_options(relative: &Path) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.pathspec(relative);
    opts.disable_pathspec_match(true);
    opts
}

/// Render a libgit2 diff as unified patch text.
fn render_patch(diff: &git2::Diff<'_>) -> Result<String, git2::Error> {
    let mut out = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            out.push(line.origin());
        }
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(out)
}

fn commit_diff(
    repo: &Repository,
    commit: &Commit<'_>,
    relative: &Path,
) -> Result<String, git2::Error> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };
    let mut opts = path_options(relative);
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;
    render_patch(&diff)
}

#[async_trait]
impl VcsBackend for GitBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    async fn list_revisions(
        &self,
        path: &Path,
        max_count: usize,
        older_than: Option<&RevisionId>,
    ) -> Result<Vec<RevisionId>, BackendError> {
        let older_than = older_than.cloned();
        let error_path = path.to_path_buf();
        tracing::debug!(path = %path.display(), max_count, older_than = ?older_than, "git log");

        self.with_repo(path, move |loc| {
            let fail =
                |e: git2::Error| BackendError::unavailable(&error_path, e.message().to_string());
            let repo = &loc.repo;

            let tip = match &older_than {
                Some(rev) => {
                    let commit = find_commit(repo, rev.as_str()).map_err(fail)?;
                    match commit.parent_id(0) {
                        Ok(parent) => parent,
                        Err(_) => return Ok(Vec::new()),
                    }
                }
                None => match repo.head() {
                    Ok(head) => head.peel_to_commit().map_err(fail)?.id(),
                    // Unborn HEAD: no history yet.
                    Err(_) => return Ok(Vec::new()),
                },
            };

            let mut walk = repo.revwalk().map_err(fail)?;
            walk.simplify_first_parent().map_err(fail)?;
            walk.push(tip).map_err(fail)?;

            let mut revisions = Vec::new();
            for oid in walk {
                if revisions.len() >= max_count {
                    break;
                }
                let oid = oid.map_err(fail)?;
                let commit = repo.find_commit(oid).map_err(fail)?;
                if touches(&commit, &loc.relative).map_err(fail)? {
                    revisions.push(revision_id(oid).map_err(fail)?);
                }
            }
            Ok(revisions)
        })
        .await
    }

    async fn diff_of_revision(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<String, BackendError> {
        let revision = revision.clone();
        tracing::debug!(path = %path.display(), %revision, "git diff");

        self.with_repo(path, move |loc| {
            let fail = |e: git2::Error| BackendError::DiffUnavailable {
                revision: revision.clone(),
                message: e.message().to_string(),
                payload: String::new(),
            };
            let commit = find_commit(&loc.repo, revision.as_str()).map_err(fail)?;
            commit_diff(&loc.repo, &commit, &loc.relative).map_err(fail)
        })
        .await
    }

    async fn working_copy_diff(&self, path: &Path) -> Result<String, BackendError> {
        let error_path = path.to_path_buf();
        tracing::debug!(path = %path.display(), "git working copy diff");

        self.with_repo(path, move |loc| {
            let fail =
                |e: git2::Error| BackendError::unavailable(&error_path, e.message().to_string());
            let repo = &loc.repo;

            let head_tree = match repo.head() {
                Ok(head) => head.peel_to_tree().map_err(fail)?,
                Err(_) => return Ok(String::new()),
            };
            let mut opts = path_options(&loc.relative);
            let diff = repo
                .diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))
                .map_err(fail)?;
            render_patch(&diff).map_err(fail)
        })
        .await
    }

    async fn revision_metadata(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<RevisionInfo, BackendError> {
        let revision = revision.clone();

        self.with_repo(path, move |loc| {
            let commit = find_commit(&loc.repo, revision.as_str()).map_err(|_| {
                BackendError::RevisionNotFound {
                    revision: revision.to_string(),
                }
            })?;
            let full_id = revision_id(commit.id()).map_err(|_| BackendError::RevisionNotFound {
                revision: revision.to_string(),
            })?;
            let diff = commit_diff(&loc.repo, &commit, &loc.relative).map_err(|e| {
                BackendError::DiffUnavailable {
                    revision: full_id.clone(),
                    message: e.message().to_string(),
                    payload: String::new(),
                }
            })?;

            let author = commit.author();
            let timestamp = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
                .unwrap_or(chrono::DateTime::UNIX_EPOCH);

            Ok(RevisionInfo {
                revision: full_id,
                author: author.name().unwrap_or("").to_string(),
                message: commit.message().unwrap_or("").to_string(),
                timestamp,
                diff,
            })
        })
        .await
    }
}
