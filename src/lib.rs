//! rangelog - history of a block of lines
//!
//! rangelog answers "which of the last N revisions changed the code that
//! now sits in lines `a..=b` of this file, and where did those lines live
//! at each point?" for git and svn working copies, including uncommitted
//! local edits.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, formats output)
//! - [`track`] - Range translation and the resumable history tracker
//! - [`diff`] - Unified diff model and parser
//! - [`backend`] - Single doorway to git and svn
//! - [`core`] - Domain types and configuration
//!
//! # Correctness Invariants
//!
//! 1. A tracked range is either null or `1 <= start <= end`
//! 2. Reported revisions keep the newest-first order of the backend listing
//! 3. A failed collection cycle leaves the tracking session untouched
//! 4. No revision is visited twice within one session

pub mod backend;
pub mod cli;
pub mod core;
pub mod diff;
pub mod track;
