//! backend
//!
//! Abstraction over version-control clients (Git, Subversion).
//!
//! # Architecture
//!
//! The `VcsBackend` trait is the only surface the tracker sees. Commands
//! obtain a backend through [`open_backend`], which detects the kind of
//! working copy once and returns a fixed [`Backend`] variant.
//!
//! # Modules
//!
//! - `traits`: `VcsBackend` trait and `BackendError`
//! - [`git`]: Git implementation on `git2`
//! - [`svn`]: Subversion implementation driving the `svn` client
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Kind detection and backend creation
//!
//! # Example
//!
//! ```ignore
//! use rangelog::backend::{open_backend, VcsBackend};
//! use rangelog::core::config::Config;
//!
//! let path = std::path::Path::new("src/lib.rs");
//! let backend = open_backend(path, &Config::default())?;
//! for rev in backend.list_revisions(path, 10, None).await? {
//!     println!("{}", rev);
//! }
//! ```

mod factory;
pub mod git;
pub mod mock;
pub mod svn;
mod traits;

pub use factory::{
    detect_kind, detect_working_copy, open_backend, valid_backend_names, Backend, VcsKind,
    WorkingCopy,
};
pub use traits::*;
