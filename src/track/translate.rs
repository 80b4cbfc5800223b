//! track::translate
//!
//! Maps a line range backward through one diff.
//!
//! # Semantics
//!
//! A diff is the forward change from an older state to a newer state. Given
//! a range in the newer state's coordinates, [`translate`] returns the
//! range the same code occupied in the older state, and whether any line
//! inside the range was added, removed, or rewritten by the diff.
//!
//! # Algorithm
//!
//! Change blocks (maximal runs of `-`/`+` lines) are visited in ascending
//! order while a running offset accumulates their net line counts:
//!
//! - blocks ending before the range only shift the offset;
//! - the first block starting after the range ends the scan;
//! - every other block overlaps the range and sets `changed`.
//!
//! A boundary that lands on added lines anchors to the old side of its
//! block (first old line for the start, last old line for the end). Any
//! other boundary is shifted by the offset of the blocks preceding it. If
//! the mapped interval is empty the range was introduced by this diff and
//! the null range is returned.
//!
//! Blocks that merely touch the range (ending at `start - 1` or starting at
//! `end + 1`) are not overlaps.
//!
//! # Example
//!
//! ```
//! use rangelog::core::types::SourceRange;
//! use rangelog::diff::Diff;
//! use rangelog::track::translate;
//!
//! let diff = Diff::parse("\
//! --- a/f
//! +++ b/f
//! @@ -1,2 +1,4 @@
//!  one
//! +two
//! +three
//!  four
//! ").unwrap();
//!
//! // Line 4 used to be line 2.
//! let t = translate(SourceRange::new(4, 4).unwrap(), diff.first_file_hunks());
//! assert_eq!(t.range, SourceRange::new(2, 2).unwrap());
//! assert!(!t.changed);
//! ```

use crate::core::types::SourceRange;
use crate::diff::Hunk;

/// Result of mapping a range through one diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// Range in the older state, or [`SourceRange::NULL`]
    pub range: SourceRange,
    /// Whether the diff touched any line inside the input range
    pub changed: bool,
}

impl Translation {
    /// True when the walk cannot go further back.
    pub fn is_boundary(&self) -> bool {
        self.range.is_null()
    }
}

/// Map `range` (new-side coordinates) through `hunks` to old-side
/// coordinates.
///
/// Never fails: a range with no older counterpart maps to the null range.
pub fn translate(range: SourceRange, hunks: &[Hunk]) -> Translation {
    if range.is_null() {
        return Translation {
            range: SourceRange::NULL,
            changed: false,
        };
    }

    let start = range.start_line();
    let end = range.end_line();

    let mut offset_at_start = 0i64;
    let mut offset_at_end = 0i64;
    let mut anchored_start: Option<i64> = None;
    let mut anchored_end: Option<i64> = None;
    let mut changed = false;

    'hunks: for hunk in hunks {
        for block in hunk.change_blocks() {
            if block.new.start > end {
                break 'hunks;
            }
            if block.new.end <= start {
                offset_at_start += block.net();
                offset_at_end += block.net();
                continue;
            }

            changed = true;
            if block.new.contains(&start) {
                anchored_start = Some(block.old.start);
            }
            if block.new.contains(&end) {
                anchored_end = Some(block.old.end - 1);
            } else {
                offset_at_end += block.net();
            }
        }
    }

    let old_start = anchored_start.unwrap_or(start - offset_at_start);
    let old_end = anchored_end.unwrap_or(end - offset_at_end);

    Translation {
        range: SourceRange::from_bounds(old_start, old_end),
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Diff;

    fn range(start: i64, end: i64) -> SourceRange {
        SourceRange::new(start, end).unwrap()
    }

    fn hunks(text: &str) -> Vec<Hunk> {
        Diff::parse(text).unwrap().first_file_hunks().to_vec()
    }

    /// Inserts two lines after old line 9 (new lines 10-11).
    const INSERT_AT_10: &str = "\
--- a/f
+++ b/f
@@ -8,5 +8,7 @@
 l8
 l9
+n10
+n11
 l10
 l11
 l12
";

    #[test]
    fn no_hunks_is_identity() {
        let t = translate(range(10, 12), &[]);
        assert_eq!(t.range, range(10, 12));
        assert!(!t.changed);
    }

    #[test]
    fn null_range_passes_through() {
        let t = translate(SourceRange::NULL, &hunks(INSERT_AT_10));
        assert!(t.range.is_null());
        assert!(!t.changed);
    }

    #[test]
    fn hunk_before_range_shifts() {
        let t = translate(range(20, 22), &hunks(INSERT_AT_10));
        assert_eq!(t.range, range(18, 20));
        assert!(!t.changed);
    }

    #[test]
    fn hunk_after_range_is_ignored() {
        let t = translate(range(2, 4), &hunks(INSERT_AT_10));
        assert_eq!(t.range, range(2, 4));
        assert!(!t.changed);
    }

    #[test]
    fn context_lines_are_not_changes() {
        // Lines 8-9 sit in the hunk's leading context.
        let t = translate(range(8, 9), &hunks(INSERT_AT_10));
        assert_eq!(t.range, range(8, 9));
        assert!(!t.changed);
    }

    #[test]
    fn range_inside_hunk_context_is_unchanged() {
        // One line added at 3; old lines 1-5 become new 1-2 and 4-6.
        let text = "\
--- a/f
+++ b/f
@@ -1,5 +1,6 @@
 a
 b
+x
 c
 d
 e
";
        let t = translate(range(1, 2), &hunks(text));
        assert_eq!(t.range, range(1, 2));
        assert!(!t.changed);

        let t = translate(range(4, 6), &hunks(text));
        assert_eq!(t.range, range(3, 5));
        assert!(!t.changed);
    }

    #[test]
    fn adjacent_blocks_do_not_overlap() {
        // Added lines 10-11: range ending at 9 and range starting at 12.
        let t = translate(range(5, 9), &hunks(INSERT_AT_10));
        assert!(!t.changed);
        assert_eq!(t.range, range(5, 9));

        let t = translate(range(12, 14), &hunks(INSERT_AT_10));
        assert!(!t.changed);
        assert_eq!(t.range, range(10, 12));
    }

    #[test]
    fn insertion_overlapping_range_start() {
        let t = translate(range(10, 12), &hunks(INSERT_AT_10));
        assert!(t.changed);
        assert_eq!(t.range, range(10, 10));
    }

    #[test]
    fn insertion_overlapping_range_end() {
        let t = translate(range(8, 10), &hunks(INSERT_AT_10));
        assert!(t.changed);
        assert_eq!(t.range, range(8, 9));
    }

    #[test]
    fn insertion_inside_range() {
        let t = translate(range(9, 13), &hunks(INSERT_AT_10));
        assert!(t.changed);
        assert_eq!(t.range, range(9, 11));
    }

    #[test]
    fn range_entirely_introduced_is_boundary() {
        let t = translate(range(10, 11), &hunks(INSERT_AT_10));
        assert!(t.changed);
        assert!(t.is_boundary());
    }

    #[test]
    fn new_file_is_boundary() {
        let diff = "--- /dev/null\n+++ b/f\n@@ -0,0 +1,3 @@\n+a\n+b\n+c\n";
        let t = translate(range(1, 2), &hunks(diff));
        assert!(t.changed);
        assert!(t.range.is_null());
    }

    #[test]
    fn rewrite_anchors_to_removed_lines() {
        // Old lines 4-5 replaced by a single new line 4.
        let diff = "--- a/f\n+++ b/f\n@@ -3,4 +3,3 @@\n c\n-x\n-y\n+z\n d\n";
        let t = translate(range(4, 4), &hunks(diff));
        assert!(t.changed);
        assert_eq!(t.range, range(4, 5));

        let t = translate(range(3, 5), &hunks(diff));
        assert!(t.changed);
        assert_eq!(t.range, range(3, 6));
    }

    #[test]
    fn deletion_inside_range() {
        // Old line 6 removed; new lines 5 and 6 straddle the gap.
        let diff = "--- a/f\n+++ b/f\n@@ -5,3 +5,2 @@\n a\n-b\n c\n";
        let t = translate(range(5, 6), &hunks(diff));
        assert!(t.changed);
        assert_eq!(t.range, range(5, 7));
    }

    #[test]
    fn deletion_adjacent_to_range() {
        let diff = "--- a/f\n+++ b/f\n@@ -5,3 +5,2 @@\n a\n-b\n c\n";
        // Gap sits between new lines 5 and 6.
        let t = translate(range(6, 8), &hunks(diff));
        assert!(!t.changed);
        assert_eq!(t.range, range(7, 9));

        let t = translate(range(2, 5), &hunks(diff));
        assert!(!t.changed);
        assert_eq!(t.range, range(2, 5));
    }

    #[test]
    fn single_line_range_next_to_deletion() {
        let diff = "--- a/f\n+++ b/f\n@@ -5,3 +5,2 @@\n a\n-b\n c\n";
        let t = translate(range(6, 6), &hunks(diff));
        assert!(!t.changed);
        assert_eq!(t.range, range(7, 7));
    }

    #[test]
    fn multiple_hunks_accumulate_offset() {
        let diff = "\
--- a/f
+++ b/f
@@ -1,1 +1,2 @@
 a
+b
@@ -10,2 +10,0 @@
-x
-y
@@ -30,1 +29,1 @@
-old
+new
";
        let t = translate(range(20, 25), &hunks(diff));
        assert!(!t.changed);
        // +1 from the first hunk, -2 from the second.
        assert_eq!(t.range, range(21, 26));

        let t = translate(range(28, 29), &hunks(diff));
        assert!(t.changed);
        assert_eq!(t.range, range(29, 30));
    }

    #[test]
    fn append_at_end_of_file() {
        let diff = "--- a/f\n+++ b/f\n@@ -3,0 +4,2 @@\n+d\n+e\n";
        let t = translate(range(3, 5), &hunks(diff));
        assert!(t.changed);
        assert_eq!(t.range, range(3, 3));

        let t = translate(range(4, 5), &hunks(diff));
        assert!(t.is_boundary());
    }

    #[test]
    fn range_spanning_two_insertions() {
        let diff = "\
--- a/f
+++ b/f
@@ -1,3 +1,5 @@
+x
 a
 b
+y
 c
";
        // New 1 (x) .. new 4 (y): anchors to old 1 and old 2.
        let t = translate(range(1, 4), &hunks(diff));
        assert!(t.changed);
        assert_eq!(t.range, range(1, 2));
    }
}
