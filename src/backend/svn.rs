//! backend::svn
//!
//! Subversion backend driving the `svn` command-line client.
//!
//! # Repository resolution
//!
//! The repository URL of a file is read from the working copy's
//! `.svn/wc.db` SQLite database (BASE layer of the `NODES` table joined with
//! `REPOSITORY`). Lookups are cached per path and never replaced.
//!
//! # History
//!
//! Listing runs against the working-copy path, starting at BASE, so an
//! out-of-date checkout never sees revisions it does not contain.
//!
//! # Working-copy diff
//!
//! The BASE revision of the file is exported into a temporary directory
//! created beside it and compared with the on-disk content. The directory is
//! owned by a [`tempfile::TempDir`] and removed when it goes out of scope,
//! whichever way the operation exits.
//!
//! # Credentials
//!
//! Every invocation is non-interactive and never caches credentials.
//! Configured credentials are passed on the command line.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OpenFlags, OptionalExtension};
use similar::TextDiff;
use tokio::process::Command;

use super::factory::{detect_working_copy, VcsKind};
use super::traits::{BackendError, VcsBackend};
use crate::core::types::{RevisionId, RevisionInfo};

/// Client settings for the svn backend.
#[derive(Clone, PartialEq, Eq)]
pub struct SvnSettings {
    /// Client executable
    pub binary: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for SvnSettings {
    fn default() -> Self {
        Self {
            binary: "svn".to_string(),
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for SvnSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvnSettings")
            .field("binary", &self.binary)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where a versioned file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnLocation {
    /// Working-copy root (holds `.svn`)
    pub wc_root: PathBuf,
    /// Path relative to the working-copy root, `/`-separated
    pub relpath: String,
    /// Repository root URL
    pub repository_root: String,
    /// Full URL of the file
    pub url: String,
}

/// Subversion implementation of [`VcsBackend`].
#[derive(Debug, Clone, Default)]
pub struct SvnBackend {
    settings: SvnSettings,
    /// Absolute file path -> resolved location.
    locations: Arc<RwLock<HashMap<PathBuf, SvnLocation>>>,
}

impl SvnBackend {
    pub fn new(settings: SvnSettings) -> Self {
        Self {
            settings,
            locations: Arc::default(),
        }
    }

    pub fn settings(&self) -> &SvnSettings {
        &self.settings
    }

    /// Resolve (and cache) the repository location of `path`.
    pub async fn locate(&self, path: &Path) -> Result<SvnLocation, BackendError> {
        let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(found) = self
            .locations
            .read()
            .ok()
            .and_then(|map| map.get(&abs).cloned())
        {
            return Ok(found);
        }

        let wc = detect_working_copy(&abs)?;
        if wc.kind != VcsKind::Svn {
            return Err(BackendError::unavailable(path, "not an svn working copy"));
        }
        let relpath = abs
            .strip_prefix(&wc.root)
            .map_err(|_| BackendError::unavailable(path, "path is outside the working copy"))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let db_path = wc.root.join(".svn").join("wc.db");
        let query_relpath = relpath.clone();
        let row = tokio::task::spawn_blocking(move || query_repository(&db_path, &query_relpath))
            .await
            .map_err(|e| BackendError::unavailable(path, format!("wc.db task failed: {}", e)))?
            .map_err(|e| BackendError::unavailable(path, format!("cannot read wc.db: {}", e)))?;

        let (repository_root, repos_path) =
            row.ok_or_else(|| BackendError::unavailable(path, "path is not under version control"))?;

        let location = SvnLocation {
            wc_root: wc.root,
            url: format!("{}/{}", repository_root.trim_end_matches('/'), repos_path),
            repository_root,
            relpath,
        };
        tracing::debug!(path = %abs.display(), url = %location.url, "resolved svn location");

        if let Ok(mut map) = self.locations.write() {
            map.entry(abs).or_insert_with(|| location.clone());
        }
        Ok(location)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.settings.binary);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run the client with standard non-interactive flags.
    async fn run(&self, path: &Path, args: &[&str]) -> Result<Output, BackendError> {
        tracing::debug!(args = ?args, "svn");
        let mut cmd = self.command();
        cmd.args(args).arg("--non-interactive").arg("--no-auth-cache");
        if let Some(user) = &self.settings.username {
            cmd.arg("--username").arg(user);
        }
        if let Some(password) = &self.settings.password {
            cmd.arg("--password").arg(password);
        }
        cmd.output().await.map_err(|e| {
            BackendError::unavailable(
                path,
                format!("failed to run {}: {}", self.settings.binary, e),
            )
        })
    }

    /// Check whether `username`/`password` are accepted for `url`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the client cannot be started.
    pub async fn verify_credentials(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<bool, BackendError> {
        let output = self
            .command()
            .args(["info", url, "--non-interactive", "--no-auth-cache"])
            .args(["--username", username, "--password", password])
            .output()
            .await
            .map_err(|e| {
                BackendError::unavailable(
                    Path::new(url),
                    format!("failed to run {}: {}", self.settings.binary, e),
                )
            })?;
        Ok(output.status.success())
    }
}

/// Query `(repository root, repository-relative path)` for a working-copy
/// relative path.
fn query_repository(
    db_path: &Path,
    relpath: &str,
) -> Result<Option<(String, String)>, rusqlite::Error> {
    let conn = rusqlite::Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.query_row(
        "SELECT R.root, N.repos_path \
         FROM NODES AS N JOIN REPOSITORY AS R ON R.id = N.repos_id \
         WHERE N.local_relpath = ?1 AND N.repos_path IS NOT NULL \
         ORDER BY N.op_depth ASC LIMIT 1",
        rusqlite::params![relpath],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )
    .optional()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Revision numbers from `svn log -q` output.
pub(crate) fn parse_log_revisions(text: &str) -> Vec<RevisionId> {
    text.lines()
        .filter_map(|line| {
            let head = line.strip_prefix('r')?.split(" |").next()?;
            if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            RevisionId::new(head).ok()
        })
        .collect()
}

/// One entry of `svn log -r N` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogEntry {
    pub revision: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Parse the first entry of non-quiet `svn log` output.
pub(crate) fn parse_log_entry(text: &str) -> Option<LogEntry> {
    let mut lines = text.lines().skip_while(|l| l.starts_with("----"));
    let header = lines.next()?;
    let mut fields = header.split(" | ");
    let revision = fields.next()?.strip_prefix('r')?.to_string();
    let author = fields.next()?.to_string();
    let date = fields.next()?;
    // "2024-01-02 03:04:05 +0000 (Tue, 02 Jan 2024)"
    let date = date.split(" (").next()?;
    let timestamp = DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z")
        .ok()?
        .with_timezone(&Utc);

    let body: Vec<&str> = lines
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.starts_with("------------------------------------"))
        .collect();

    Some(LogEntry {
        revision,
        author,
        timestamp,
        message: body.join("\n").trim_end().to_string(),
    })
}

/// Unified diff between two snapshots of one file; empty when identical.
pub(crate) fn unified_diff(old: &str, new: &str, label: &str) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(
            &format!("{}\t(BASE)", label),
            &format!("{}\t(working copy)", label),
        )
        .to_string()
}

#[async_trait]
impl VcsBackend for SvnBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Svn
    }

    async fn list_revisions(
        &self,
        path: &Path,
        max_count: usize,
        older_than: Option<&RevisionId>,
    ) -> Result<Vec<RevisionId>, BackendError> {
        let location = self.locate(path).await?;
        let limit = max_count.to_string();
        let range = match older_than {
            Some(rev) => {
                let number: u64 = rev.as_str().parse().map_err(|_| {
                    BackendError::unavailable(path, format!("not an svn revision: {}", rev))
                })?;
                if number <= 1 {
                    return Ok(Vec::new());
                }
                format!("{}:1", number - 1)
            }
            // The working-copy diff is taken against BASE, so history starts there.
            None => "BASE:1".to_string(),
        };
        let wc_path = location
            .wc_root
            .join(&location.relpath)
            .to_string_lossy()
            .into_owned();

        let args = [
            "log",
            "-q",
            "-l",
            limit.as_str(),
            "-r",
            range.as_str(),
            wc_path.as_str(),
        ];
        let output = self.run(path, &args).await?;
        if !output.status.success() {
            return Err(BackendError::unavailable(path, stderr_text(&output)));
        }
        let mut revisions = parse_log_revisions(&String::from_utf8_lossy(&output.stdout));
        revisions.truncate(max_count);
        Ok(revisions)
    }

    async fn diff_of_revision(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<String, BackendError> {
        let location = self.locate(path).await?;
        let output = self
            .run(path, &["diff", "-c", revision.as_str(), location.url.as_str()])
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if output.status.success() {
            Ok(stdout)
        } else {
            Err(BackendError::DiffUnavailable {
                revision: revision.clone(),
                message: stderr_text(&output),
                payload: stdout,
            })
        }
    }

    async fn working_copy_diff(&self, path: &Path) -> Result<String, BackendError> {
        let location = self.locate(path).await?;
        let abs = location.wc_root.join(&location.relpath);
        let dir = abs
            .parent()
            .filter(|d| d.is_dir())
            .ok_or_else(|| BackendError::unavailable(path, "could not get directory"))?;
        let file_name = abs
            .file_name()
            .ok_or_else(|| BackendError::unavailable(path, "not a file path"))?;

        let snapshot = tempfile::Builder::new()
            .prefix(".rangelog-base-")
            .tempdir_in(dir)
            .map_err(|e| BackendError::unavailable(path, format!("cannot create snapshot: {}", e)))?;
        let exported = snapshot.path().join(file_name);

        let abs_arg = abs.to_string_lossy().into_owned();
        let exported_arg = exported.to_string_lossy().into_owned();
        let output = self
            .run(path, &["export", "-r", "BASE", abs_arg.as_str(), exported_arg.as_str()])
            .await?;
        if !output.status.success() {
            return Err(BackendError::unavailable(
                path,
                format!("svn export failed: {}", stderr_text(&output)),
            ));
        }

        let base = tokio::fs::read(&exported)
            .await
            .map_err(|e| BackendError::unavailable(path, format!("cannot read snapshot: {}", e)))?;
        let current = tokio::fs::read(&abs)
            .await
            .map_err(|e| BackendError::unavailable(path, format!("cannot read file: {}", e)))?;

        Ok(unified_diff(
            &String::from_utf8_lossy(&base),
            &String::from_utf8_lossy(&current),
            &location.relpath,
        ))
    }

    async fn revision_metadata(
        &self,
        path: &Path,
        revision: &RevisionId,
    ) -> Result<RevisionInfo, BackendError> {
        let location = self.locate(path).await?;
        let output = self
            .run(path, &["log", "-r", revision.as_str(), location.url.as_str()])
            .await?;
        let not_found = || BackendError::RevisionNotFound {
            revision: revision.to_string(),
        };
        if !output.status.success() {
            return Err(not_found());
        }
        let entry =
            parse_log_entry(&String::from_utf8_lossy(&output.stdout)).ok_or_else(not_found)?;
        let diff = self.diff_of_revision(path, revision).await?;

        Ok(RevisionInfo {
            revision: RevisionId::new(entry.revision).map_err(|_| not_found())?,
            author: entry.author,
            message: entry.message,
            timestamp: entry.timestamp,
            diff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Diff;
    use tempfile::TempDir;

    #[test]
    fn parses_quiet_log() {
        let text = "\
------------------------------------------------------------------------
r42 | alice | 2024-01-02 03:04:05 +0000 (Tue, 02 Jan 2024)
------------------------------------------------------------------------
r17 | bob | 2023-11-30 10:00:00 +0100 (Thu, 30 Nov 2023)
------------------------------------------------------------------------
";
        let revs = parse_log_revisions(text);
        let ids: Vec<_> = revs.iter().map(|r| r.as_str()).collect();
        assert_eq!(ids, vec!["42", "17"]);
    }

    #[test]
    fn ignores_non_revision_lines() {
        assert!(parse_log_revisions("random text\nrevert | x\n").is_empty());
    }

    #[test]
    fn parses_log_entry() {
        let text = "\
------------------------------------------------------------------------
r42 | alice | 2024-01-02 03:04:05 +0000 (Tue, 02 Jan 2024) | 2 lines

Fix off-by-one in parser
Second line
------------------------------------------------------------------------
";
        let entry = parse_log_entry(text).unwrap();
        assert_eq!(entry.revision, "42");
        assert_eq!(entry.author, "alice");
        assert_eq!(entry.message, "Fix off-by-one in parser\nSecond line");
        assert_eq!(entry.timestamp.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn empty_log_has_no_entry() {
        assert!(parse_log_entry("------------------------------------\n").is_none());
    }

    #[test]
    fn unified_diff_round_trips_through_parser() {
        let old = "a\nb\nc\n";
        let new = "a\nb\nx\ny\nc\n";
        let text = unified_diff(old, new, "trunk/f.txt");
        let diff = Diff::parse(&text).unwrap();
        let hunk = &diff.first_file_hunks()[0];
        assert_eq!(hunk.changed_line_ranges(), vec![3..5]);
        assert_eq!(diff.files[0].new_path.as_deref(), Some("trunk/f.txt"));
    }

    #[test]
    fn identical_snapshots_have_empty_diff() {
        assert_eq!(unified_diff("same\n", "same\n", "f"), "");
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let settings = SvnSettings {
            password: Some("hunter2".into()),
            ..SvnSettings::default()
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn resolves_url_from_wc_db() {
        let dir = TempDir::new().unwrap();
        let admin = dir.path().join(".svn");
        std::fs::create_dir(&admin).unwrap();
        let conn = rusqlite::Connection::open(admin.join("wc.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE REPOSITORY (id INTEGER PRIMARY KEY, root TEXT, uuid TEXT);
             CREATE TABLE NODES (local_relpath TEXT, op_depth INTEGER, repos_id INTEGER, repos_path TEXT);
             INSERT INTO REPOSITORY VALUES (1, 'https://svn.example.org/repo', 'u');
             INSERT INTO NODES VALUES ('src/main.c', 0, 1, 'trunk/src/main.c');",
        )
        .unwrap();
        drop(conn);

        let row = query_repository(&admin.join("wc.db"), "src/main.c").unwrap();
        assert_eq!(
            row,
            Some((
                "https://svn.example.org/repo".to_string(),
                "trunk/src/main.c".to_string()
            ))
        );
        assert_eq!(query_repository(&admin.join("wc.db"), "nope").unwrap(), None);
    }

    /// Working copy rooted at a temp dir holding `main.c` (`trunk/main.c`).
    fn checkout() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let admin = dir.path().join(".svn");
        std::fs::create_dir(&admin).unwrap();
        let conn = rusqlite::Connection::open(admin.join("wc.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE REPOSITORY (id INTEGER PRIMARY KEY, root TEXT, uuid TEXT);
             CREATE TABLE NODES (local_relpath TEXT, op_depth INTEGER, repos_id INTEGER, repos_path TEXT);
             INSERT INTO REPOSITORY VALUES (1, 'svn://host/repo/', 'u');
             INSERT INTO NODES VALUES ('main.c', 0, 1, 'trunk/main.c');",
        )
        .unwrap();
        drop(conn);
        let file = dir.path().join("main.c");
        std::fs::write(&file, "int x;\n").unwrap();
        (dir, file)
    }

    #[tokio::test]
    async fn locate_caches_location() {
        let (dir, file) = checkout();

        let backend = SvnBackend::default();
        let loc = backend.locate(&file).await.unwrap();
        assert_eq!(loc.url, "svn://host/repo/trunk/main.c");
        assert_eq!(loc.relpath, "main.c");

        // Second lookup is served from the cache even if wc.db disappears.
        std::fs::remove_file(dir.path().join(".svn").join("wc.db")).unwrap();
        assert_eq!(backend.locate(&file).await.unwrap(), loc);
    }

    #[tokio::test]
    async fn unversioned_path_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let admin = dir.path().join(".svn");
        std::fs::create_dir(&admin).unwrap();
        let conn = rusqlite::Connection::open(admin.join("wc.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE REPOSITORY (id INTEGER PRIMARY KEY, root TEXT, uuid TEXT);
             CREATE TABLE NODES (local_relpath TEXT, op_depth INTEGER, repos_id INTEGER, repos_path TEXT);",
        )
        .unwrap();
        drop(conn);
        let file = dir.path().join("new.c");
        std::fs::write(&file, "").unwrap();

        let err = SvnBackend::default().locate(&file).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { .. }));
    }

    /// Runs the adapter against a shell-script stand-in for the svn client.
    #[cfg(unix)]
    mod client {
        use super::*;
        use crate::core::types::SourceRange;
        use crate::track::{RangeTracker, TrackError};
        use std::os::unix::fs::PermissionsExt;

        // Writing then executing a script races with forks from other tests.
        static CLIENT_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

        const LOG_OUTPUT: &str = "\
------------------------------------------------------------------------
r5 | alice | 2024-01-02 03:04:05 +0000 (Tue, 02 Jan 2024)
------------------------------------------------------------------------
r3 | bob | 2023-12-01 10:00:00 +0000 (Fri, 01 Dec 2023)
------------------------------------------------------------------------
";

        /// Install `body` as the client; `$1` is the subcommand.
        fn stub(dir: &Path, body: &str) -> SvnSettings {
            let bin = dir.join("svn");
            std::fs::write(&bin, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
            SvnSettings {
                binary: bin.to_string_lossy().into_owned(),
                ..SvnSettings::default()
            }
        }

        fn snapshot_dirs(dir: &Path) -> Vec<PathBuf> {
            std::fs::read_dir(dir)
                .unwrap()
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(".rangelog-base-"))
                })
                .collect()
        }

        fn rev(id: &str) -> RevisionId {
            RevisionId::new(id).unwrap()
        }

        #[tokio::test]
        async fn history_starts_at_base_of_working_copy() {
            let _guard = CLIENT_LOCK.lock().await;
            let (_wc, file) = checkout();
            let bin_dir = TempDir::new().unwrap();
            let args_file = bin_dir.path().join("args");
            let settings = stub(
                bin_dir.path(),
                &format!(
                    "printf '%s\\n' \"$@\" > '{}'\ncat <<'EOF'\n{}EOF",
                    args_file.display(),
                    LOG_OUTPUT
                ),
            );
            let backend = SvnBackend::new(settings);
            let loc = backend.locate(&file).await.unwrap();
            let wc_path = loc.wc_root.join(&loc.relpath).to_string_lossy().into_owned();

            let revs = backend.list_revisions(&file, 5, None).await.unwrap();
            assert_eq!(revs, vec![rev("5"), rev("3")]);

            let args: Vec<String> = std::fs::read_to_string(&args_file)
                .unwrap()
                .lines()
                .map(String::from)
                .collect();
            assert!(args.windows(2).any(|w| w[0] == "-r" && w[1] == "BASE:1"));
            assert!(args.contains(&wc_path));
            assert!(!args.iter().any(|a| a.starts_with("svn://")));

            backend
                .list_revisions(&file, 5, Some(&rev("3")))
                .await
                .unwrap();
            let args = std::fs::read_to_string(&args_file).unwrap();
            assert!(args.lines().any(|a| a == "2:1"));
            assert!(!args.lines().any(|a| a == "BASE:1"));
            assert!(args.lines().any(|a| a == wc_path));
        }

        #[tokio::test]
        async fn failed_diff_with_output_aborts_tracking() {
            let _guard = CLIENT_LOCK.lock().await;
            let (_wc, file) = checkout();
            let bin_dir = TempDir::new().unwrap();
            let settings = stub(
                bin_dir.path(),
                &format!(
                    r#"case "$1" in
log) cat <<'EOF'
{}EOF
;;
export) cp "$4" "$5" ;;
diff) cat <<'EOF'
Index: main.c
===================================================================
--- main.c	(revision 4)
+++ main.c	(revision 5)
@@ -1 +1 @@
-int y;
+int x;
EOF
echo "svn: E175002: connection reset" >&2
exit 1 ;;
esac"#,
                    LOG_OUTPUT
                ),
            );
            let backend = SvnBackend::new(settings);

            let err = backend
                .diff_of_revision(&file, &rev("5"))
                .await
                .unwrap_err();
            match &err {
                BackendError::DiffUnavailable {
                    payload, message, ..
                } => {
                    assert!(payload.contains("+int x;"));
                    assert!(message.contains("E175002"));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!err.is_skippable());

            let mut tracker = RangeTracker::new(Arc::new(backend));
            let err = tracker
                .start_tracking(&file, SourceRange::new(1, 1).unwrap(), 5)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                TrackError::Backend(BackendError::DiffUnavailable { .. })
            ));
            assert!(tracker.session().is_none());
        }

        #[tokio::test]
        async fn failed_diff_without_output_is_skipped() {
            let _guard = CLIENT_LOCK.lock().await;
            let (_wc, file) = checkout();
            let bin_dir = TempDir::new().unwrap();
            let settings = stub(
                bin_dir.path(),
                &format!(
                    r#"case "$1" in
log) cat <<'EOF'
{}EOF
;;
export) cp "$4" "$5" ;;
diff) echo "svn: E160013: path not found" >&2; exit 1 ;;
esac"#,
                    LOG_OUTPUT
                ),
            );
            let backend = SvnBackend::new(settings);

            let err = backend
                .diff_of_revision(&file, &rev("3"))
                .await
                .unwrap_err();
            assert!(err.is_skippable());

            let mut tracker = RangeTracker::new(Arc::new(backend));
            let changed = tracker
                .start_tracking(&file, SourceRange::new(1, 1).unwrap(), 5)
                .await
                .unwrap();
            assert!(changed.is_empty());
            let session = tracker.session().unwrap();
            assert!(session.history().is_empty());
            assert!(!session.is_exhausted());
        }

        #[tokio::test]
        async fn snapshot_removed_after_failed_export() {
            let _guard = CLIENT_LOCK.lock().await;
            let (wc, file) = checkout();
            let bin_dir = TempDir::new().unwrap();
            let settings = stub(
                bin_dir.path(),
                "echo \"svn: E155010: node not found\" >&2\nexit 1",
            );

            let err = SvnBackend::new(settings)
                .working_copy_diff(&file)
                .await
                .unwrap_err();
            assert!(matches!(err, BackendError::Unavailable { .. }));
            assert!(err.to_string().contains("E155010"));
            assert!(snapshot_dirs(wc.path()).is_empty());
        }

        #[tokio::test]
        async fn snapshot_removed_after_diff() {
            let _guard = CLIENT_LOCK.lock().await;
            let (wc, file) = checkout();
            let bin_dir = TempDir::new().unwrap();
            let settings = stub(bin_dir.path(), "printf 'int y;\\n' > \"$5\"");

            let diff = SvnBackend::new(settings)
                .working_copy_diff(&file)
                .await
                .unwrap();
            assert!(diff.contains("-int y;"));
            assert!(diff.contains("+int x;"));
            assert!(snapshot_dirs(wc.path()).is_empty());
        }
    }
}
