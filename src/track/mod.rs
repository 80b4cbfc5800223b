//! track
//!
//! Backward tracking of a line range through a file's history.
//!
//! # Modules
//!
//! - `translate`: maps a range through one diff (pure, never fails)
//! - `session`: per-request state, owned by the tracker
//! - `tracker`: collection cycles, fetch fan-out, and pass-throughs

mod session;
mod tracker;
mod translate;

pub use session::TrackingSession;
pub use tracker::{RangeTracker, TrackError};
pub use translate::{translate, Translation};
