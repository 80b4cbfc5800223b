//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`SourceRange`] - 1-based inclusive line interval, or the null range
//! - [`RevisionId`] - Backend revision identifier (git SHA, svn revision number)
//! - [`RevisionKey`] - A committed revision or the uncommitted working copy
//! - [`RevisionInfo`] - Read-only revision metadata
//!
//! # Validation
//!
//! These types enforce validity at construction time. A `SourceRange` is
//! either the null range or satisfies `1 <= start <= end`; a `RevisionId`
//! is never empty and never contains whitespace.
//!
//! # Examples
//!
//! ```
//! use rangelog::core::types::{RevisionId, SourceRange};
//!
//! let range = SourceRange::new(10, 12).unwrap();
//! assert_eq!(range.len(), 3);
//! assert!(SourceRange::NULL.is_null());
//!
//! assert!(SourceRange::new(5, 4).is_err());
//! assert!(RevisionId::new("r 1").is_err());
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid line range: {0}")]
    InvalidRange(String),

    #[error("invalid revision id: {0}")]
    InvalidRevision(String),
}

/// A contiguous, 1-based, inclusive line interval.
///
/// The sentinel [`SourceRange::NULL`] (`-1..-1`) means the tracked code has
/// no counterpart at a given point in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RangeWire", into = "RangeWire")]
pub struct SourceRange {
    start_line: i64,
    end_line: i64,
}

/// Serialized form of [`SourceRange`]; validated on the way in.
#[derive(Serialize, Deserialize)]
struct RangeWire {
    start_line: i64,
    end_line: i64,
}

impl TryFrom<RangeWire> for SourceRange {
    type Error = TypeError;

    fn try_from(wire: RangeWire) -> Result<Self, Self::Error> {
        if wire.start_line == -1 && wire.end_line == -1 {
            return Ok(SourceRange::NULL);
        }
        SourceRange::new(wire.start_line, wire.end_line)
    }
}

impl From<SourceRange> for RangeWire {
    fn from(range: SourceRange) -> Self {
        RangeWire {
            start_line: range.start_line,
            end_line: range.end_line,
        }
    }
}

impl SourceRange {
    /// The null range.
    pub const NULL: SourceRange = SourceRange {
        start_line: -1,
        end_line: -1,
    };

    /// Create a validated, non-null range.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRange` unless `1 <= start_line <= end_line`.
    pub fn new(start_line: i64, end_line: i64) -> Result<Self, TypeError> {
        if start_line < 1 {
            return Err(TypeError::InvalidRange(format!(
                "start line must be >= 1, got {}",
                start_line
            )));
        }
        if end_line < start_line {
            return Err(TypeError::InvalidRange(format!(
                "end line {} is before start line {}",
                end_line, start_line
            )));
        }
        Ok(Self {
            start_line,
            end_line,
        })
    }

    /// Build a range from computed bounds, collapsing anything invalid to null.
    pub(crate) fn from_bounds(start_line: i64, end_line: i64) -> Self {
        Self::new(start_line, end_line).unwrap_or(Self::NULL)
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn start_line(&self) -> i64 {
        self.start_line
    }

    pub fn end_line(&self) -> i64 {
        self.end_line
    }

    /// Number of lines covered. Zero for the null range.
    pub fn len(&self) -> i64 {
        if self.is_null() {
            0
        } else {
            self.end_line - self.start_line + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `line` falls inside the range.
    pub fn contains(&self, line: i64) -> bool {
        !self.is_null() && self.start_line <= line && line <= self.end_line
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "(untraceable)")
        } else {
            write!(f, "{}-{}", self.start_line, self.end_line)
        }
    }
}

/// A revision identifier as reported by a backend.
///
/// Git revisions are full hex SHAs, svn revisions are decimal numbers. The
/// tracker treats both as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId(String);

impl RevisionId {
    /// Create a validated revision id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRevision` if the id is empty or contains
    /// whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidRevision(
                "revision id cannot be empty".into(),
            ));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidRevision(format!(
                "revision id cannot contain whitespace: {:?}",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (git SHAs are cut to `len` characters).
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for RevisionId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RevisionId> for String {
    fn from(id: RevisionId) -> Self {
        id.0
    }
}

impl AsRef<str> for RevisionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in a file's history as seen by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKey {
    /// Uncommitted local state of the working copy.
    WorkingCopy,
    /// A committed revision.
    Revision(RevisionId),
}

impl RevisionKey {
    /// The committed revision id, if any.
    pub fn revision(&self) -> Option<&RevisionId> {
        match self {
            RevisionKey::WorkingCopy => None,
            RevisionKey::Revision(id) => Some(id),
        }
    }

    pub fn is_working_copy(&self) -> bool {
        matches!(self, RevisionKey::WorkingCopy)
    }
}

impl From<RevisionId> for RevisionKey {
    fn from(id: RevisionId) -> Self {
        RevisionKey::Revision(id)
    }
}

impl fmt::Display for RevisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionKey::WorkingCopy => write!(f, "working-copy"),
            RevisionKey::Revision(id) => write!(f, "{}", id),
        }
    }
}

/// Metadata for a single revision, looked up on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    /// Revision identifier
    pub revision: RevisionId,
    /// Author name as recorded by the backend
    pub author: String,
    /// Full commit/log message
    pub message: String,
    /// Commit time
    pub timestamp: DateTime<Utc>,
    /// Unified diff introduced by this revision
    pub diff: String,
}

impl RevisionInfo {
    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}
