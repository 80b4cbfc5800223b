//! diff
//!
//! Structured representation of a unified diff.
//!
//! # Structure
//!
//! - [`Diff`] - All files in one diff text
//!   - [`FileDiff`] - One file's changes
//!     - [`Hunk`] - One contiguous edit region (`@@ -a,b +c,d @@`)
//!       - [`DiffLine`] - A context, added or removed line
//!
//! Hunks also expose [`ChangeBlock`]s: maximal runs of removed/added lines
//! with their old-side and new-side line intervals. The range translator
//! works on change blocks so that context lines never count as edits.
//!
//! # Example
//!
//! ```
//! use rangelog::diff::Diff;
//!
//! let text = "\
//! --- a/lib.rs
//! +++ b/lib.rs
//! @@ -1,2 +1,3 @@
//!  fn main() {
//! +    run();
//!  }
//! ";
//! let diff = Diff::parse(text).unwrap();
//! let hunk = &diff.files[0].hunks[0];
//! assert_eq!(hunk.changed_line_ranges(), vec![2..3]);
//! ```

mod parse;

pub use parse::DiffParseError;

use std::ops::Range;

/// Classification of a single hunk body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
}

/// A maximal run of removed and/or added lines inside a hunk.
///
/// Both intervals are half-open. A pure insertion has an empty `old`
/// interval positioned at the first old line after the insertion point; a
/// pure deletion has an empty `new` interval positioned likewise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBlock {
    pub old: Range<i64>,
    pub new: Range<i64>,
}

impl ChangeBlock {
    pub fn added(&self) -> i64 {
        self.new.end - self.new.start
    }

    pub fn removed(&self) -> i64 {
        self.old.end - self.old.start
    }

    /// Net number of lines this block adds to the file.
    pub fn net(&self) -> i64 {
        self.added() - self.removed()
    }
}

/// One contiguous edit region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// First old-side line covered by this hunk.
    ///
    /// Unified diffs report the line *before* the hunk when a side is
    /// empty, so a zero count shifts the cursor one line forward.
    fn first_old_line(&self) -> i64 {
        if self.old_lines == 0 {
            i64::from(self.old_start) + 1
        } else {
            i64::from(self.old_start)
        }
    }

    fn first_new_line(&self) -> i64 {
        if self.new_lines == 0 {
            i64::from(self.new_start) + 1
        } else {
            i64::from(self.new_start)
        }
    }

    /// Maximal runs of removed/added lines, in order.
    pub fn change_blocks(&self) -> Vec<ChangeBlock> {
        let mut old_line = self.first_old_line();
        let mut new_line = self.first_new_line();

        if self.lines.is_empty() {
            if self.old_lines == 0 && self.new_lines == 0 {
                return Vec::new();
            }
            return vec![ChangeBlock {
                old: old_line..old_line + i64::from(self.old_lines),
                new: new_line..new_line + i64::from(self.new_lines),
            }];
        }

        let mut blocks = Vec::new();
        let mut open: Option<(i64, i64)> = None;

        for line in &self.lines {
            match line.kind {
                LineKind::Context => {
                    if let Some((old_start, new_start)) = open.take() {
                        blocks.push(ChangeBlock {
                            old: old_start..old_line,
                            new: new_start..new_line,
                        });
                    }
                    old_line += 1;
                    new_line += 1;
                }
                LineKind::Removed => {
                    open.get_or_insert((old_line, new_line));
                    old_line += 1;
                }
                LineKind::Added => {
                    open.get_or_insert((old_line, new_line));
                    new_line += 1;
                }
            }
        }

        if let Some((old_start, new_start)) = open {
            blocks.push(ChangeBlock {
                old: old_start..old_line,
                new: new_start..new_line,
            });
        }

        blocks
    }

    /// New-side intervals occupied by added lines.
    pub fn changed_line_ranges(&self) -> Vec<Range<i64>> {
        self.change_blocks()
            .into_iter()
            .filter(|block| block.added() > 0)
            .map(|block| block.new)
            .collect()
    }
}

/// Changes to a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Path from the `---` header, with any `a/` prefix kept verbatim
    pub old_path: Option<String>,
    /// Path from the `+++` header
    pub new_path: Option<String>,
    /// Hunks sorted by ascending position
    pub hunks: Vec<Hunk>,
    /// Whether the backend reported a binary change
    pub binary: bool,
}

/// A parsed unified diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub files: Vec<FileDiff>,
}

impl Diff {
    /// Parse unified diff text.
    ///
    /// # Errors
    ///
    /// Returns [`DiffParseError`] on a malformed hunk header.
    pub fn parse(text: &str) -> Result<Self, DiffParseError> {
        parse::parse_unified(text)
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(|f| f.hunks.is_empty())
    }

    /// Hunks of the first file, or nothing if the diff touches no file.
    pub fn first_file_hunks(&self) -> &[Hunk] {
        self.files
            .first()
            .map(|f| f.hunks.as_slice())
            .unwrap_or(&[])
    }
}
