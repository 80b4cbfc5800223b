//! diff::parse
//!
//! Unified diff text parser.
//!
//! Accepts the output of `git diff`/libgit2 patches and `svn diff`. Body
//! lines are classified by the remaining counts from the hunk header, so a
//! removed line whose content starts with `-- ` is never mistaken for a
//! file header.

use thiserror::Error;

use super::{Diff, DiffLine, FileDiff, Hunk, LineKind};

/// Errors from diff parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiffParseError {
    #[error("malformed hunk header on line {line}: {header}")]
    MalformedHunkHeader { line: usize, header: String },
}

/// Remaining body lines for the hunk being read.
struct Remaining {
    old: u32,
    new: u32,
}

impl Remaining {
    fn is_done(&self) -> bool {
        self.old == 0 && self.new == 0
    }
}

pub(super) fn parse_unified(text: &str) -> Result<Diff, DiffParseError> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut remaining = Remaining { old: 0, new: 0 };

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if !remaining.is_done() {
            if let Some(hunk) = current.as_mut().and_then(|f| f.hunks.last_mut()) {
                if let Some(kind) = classify_body_line(line, &mut remaining) {
                    let content = line.get(1..).unwrap_or("").to_string();
                    hunk.lines.push(DiffLine { kind, content });
                    continue;
                }
                if line.starts_with('\\') {
                    continue;
                }
                // Truncated hunk: fall through and treat as header text.
                remaining = Remaining { old: 0, new: 0 };
            }
        }

        if line.starts_with('\\') {
            continue;
        }

        if line.starts_with("diff --git ") || line.starts_with("Index: ") {
            if let Some(file) = current.take() {
                files.push(file);
            }
            current = Some(FileDiff::default());
            continue;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            let file = start_file_if_needed(&mut current, &mut files);
            file.old_path = Some(header_path(path));
            continue;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            let file = current.get_or_insert_with(FileDiff::default);
            file.new_path = Some(header_path(path));
            continue;
        }

        if line.starts_with("@@") {
            let hunk = parse_hunk_header(line).ok_or_else(|| {
                DiffParseError::MalformedHunkHeader {
                    line: idx + 1,
                    header: line.to_string(),
                }
            })?;
            remaining = Remaining {
                old: hunk.old_lines,
                new: hunk.new_lines,
            };
            current
                .get_or_insert_with(FileDiff::default)
                .hunks
                .push(hunk);
            continue;
        }

        if line.starts_with("Binary files ")
            || line.starts_with("Cannot display: file marked as a binary")
        {
            current.get_or_insert_with(FileDiff::default).binary = true;
        }
    }

    if let Some(file) = current.take() {
        files.push(file);
    }

    for file in &mut files {
        file.hunks.sort_by_key(|h| (h.old_start, h.new_start));
    }

    Ok(Diff { files })
}

/// A `---` header starts a new file unless one was just opened by a
/// `diff --git`/`Index:` line that has no paths yet.
fn start_file_if_needed<'a>(
    current: &'a mut Option<FileDiff>,
    files: &mut Vec<FileDiff>,
) -> &'a mut FileDiff {
    let fresh = matches!(current, Some(f) if f.old_path.is_none() && f.hunks.is_empty());
    if !fresh {
        if let Some(file) = current.take() {
            files.push(file);
        }
        *current = Some(FileDiff::default());
    }
    current.get_or_insert_with(FileDiff::default)
}

/// Strip the trailing tab-separated timestamp/revision annotation.
fn header_path(raw: &str) -> String {
    let path = raw.split('\t').next().unwrap_or(raw);
    // svn appends "(revision N)" / "(working copy)" after the path.
    let path = match path.rfind(" (") {
        Some(pos) if path.ends_with(')') => &path[..pos],
        _ => path,
    };
    path.trim_end().to_string()
}

fn classify_body_line(line: &str, remaining: &mut Remaining) -> Option<LineKind> {
    match line.as_bytes().first() {
        Some(b' ') | None if remaining.old > 0 && remaining.new > 0 => {
            remaining.old -= 1;
            remaining.new -= 1;
            Some(LineKind::Context)
        }
        Some(b'-') if remaining.old > 0 => {
            remaining.old -= 1;
            Some(LineKind::Removed)
        }
        Some(b'+') if remaining.new > 0 => {
            remaining.new -= 1;
            Some(LineKind::Added)
        }
        _ => None,
    }
}

/// Parse `@@ -a[,b] +c[,d] @@ ...`.
fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let mut parts = rest[..end].split_whitespace();
    let (old_start, old_lines) = parse_span(parts.next()?.strip_prefix('-')?)?;
    let (new_start, new_lines) = parse_span(parts.next()?.strip_prefix('+')?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(Hunk {
        old_start,
        old_lines,
        new_start,
        new_lines,
        lines: Vec::new(),
    })
}

fn parse_span(span: &str) -> Option<(u32, u32)> {
    match span.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((span.parse().ok()?, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIT_DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 3b18e51..a1c2d3f 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -8,5 +8,7 @@ fn setup() {
 let a = 1;
 let b = 2;
+let c = 3;
+let d = 4;
 let e = 5;
 let f = 6;
 let g = 7;
";

    const SVN_DIFF: &str = "\
Index: trunk/main.c
===================================================================
--- trunk/main.c\t(revision 41)
+++ trunk/main.c\t(revision 42)
@@ -1,3 +1,3 @@
 #include <stdio.h>
-int x;
+long x;
 int main(void);
";

    #[test]
    fn parses_git_diff() {
        let diff = Diff::parse(GIT_DIFF).unwrap();
        assert_eq!(diff.files.len(), 1);
        let file = &diff.files[0];
        assert_eq!(file.old_path.as_deref(), Some("a/src/lib.rs"));
        assert_eq!(file.new_path.as_deref(), Some("b/src/lib.rs"));
        assert_eq!(file.hunks.len(), 1);

        let hunk = &file.hunks[0];
        assert_eq!(
            (hunk.old_start, hunk.old_lines, hunk.new_start, hunk.new_lines),
            (8, 5, 8, 7)
        );
        assert_eq!(hunk.lines.len(), 7);
        assert_eq!(hunk.lines[2].kind, LineKind::Added);
        assert_eq!(hunk.lines[2].content, "let c = 3;");
    }

    #[test]
    fn parses_svn_diff() {
        let diff = Diff::parse(SVN_DIFF).unwrap();
        assert_eq!(diff.files.len(), 1);
        let file = &diff.files[0];
        assert_eq!(file.old_path.as_deref(), Some("trunk/main.c"));
        let kinds: Vec<_> = file.hunks[0].lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Context,
                LineKind::Removed,
                LineKind::Added,
                LineKind::Context
            ]
        );
    }

    #[test]
    fn omitted_counts_default_to_one() {
        let diff = Diff::parse("--- a/x\n+++ b/x\n@@ -3 +3 @@\n-old\n+new\n").unwrap();
        let hunk = &diff.files[0].hunks[0];
        assert_eq!((hunk.old_lines, hunk.new_lines), (1, 1));
        assert_eq!(hunk.lines.len(), 2);
    }

    #[test]
    fn header_like_content_inside_hunk() {
        let text = "--- a/x\n+++ b/x\n@@ -1,2 +1,2 @@\n--- removed dashes\n+++ added plusses\n same\n";
        let diff = Diff::parse(text).unwrap();
        assert_eq!(diff.files.len(), 1);
        let hunk = &diff.files[0].hunks[0];
        assert_eq!(hunk.lines[0].kind, LineKind::Removed);
        assert_eq!(hunk.lines[0].content, "-- removed dashes");
        assert_eq!(hunk.lines[1].kind, LineKind::Added);
        assert_eq!(hunk.lines[2].kind, LineKind::Context);
    }

    #[test]
    fn no_newline_marker_is_ignored() {
        let text = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file\n";
        let diff = Diff::parse(text).unwrap();
        assert_eq!(diff.files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn empty_body_line_is_context() {
        let text = "--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n a\n\n-c\n+d\n";
        let diff = Diff::parse(text).unwrap();
        let kinds: Vec<_> = diff.files[0].hunks[0].lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Context,
                LineKind::Context,
                LineKind::Removed,
                LineKind::Added
            ]
        );
    }

    #[test]
    fn multiple_files() {
        let text = format!("{}{}", GIT_DIFF, SVN_DIFF);
        let diff = Diff::parse(&text).unwrap();
        assert_eq!(diff.files.len(), 2);
        assert_eq!(diff.files[1].new_path.as_deref(), Some("trunk/main.c"));
    }

    #[test]
    fn hunks_sorted_by_position() {
        let text = "--- a/x\n+++ b/x\n@@ -20 +20 @@\n-a\n+b\n@@ -2 +2 @@\n-c\n+d\n";
        let diff = Diff::parse(text).unwrap();
        let starts: Vec<_> = diff.files[0].hunks.iter().map(|h| h.old_start).collect();
        assert_eq!(starts, vec![2, 20]);
    }

    #[test]
    fn malformed_header_is_error() {
        let err = Diff::parse("--- a/x\n+++ b/x\n@@ -a,b +c @@\n").unwrap_err();
        assert!(matches!(
            err,
            DiffParseError::MalformedHunkHeader { line: 3, .. }
        ));
    }

    #[test]
    fn empty_text_is_empty_diff() {
        let diff = Diff::parse("").unwrap();
        assert!(diff.files.is_empty());
        assert!(diff.is_empty());
    }

    #[test]
    fn binary_marker() {
        let text = "diff --git a/img.png b/img.png\nBinary files a/img.png and b/img.png differ\n";
        let diff = Diff::parse(text).unwrap();
        assert!(diff.files[0].binary);
        assert!(diff.is_empty());
    }
}
