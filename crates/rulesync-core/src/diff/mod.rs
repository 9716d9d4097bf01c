//! Change-set computation
//!
//! Compares the desired managed list against the remote snapshot and the
//! names managed by earlier passes.
//!
//! ```ignore
//! use rulesync_core::diff::{compute_diff, render_human_summary};
//!
//! let change_set = compute_diff(&desired, &previously_managed, &snapshot, &ExactBodyEquality)?;
//! println!("{}", render_human_summary(&location, &change_set, &ops));
//! ```
//!
//! The output is deterministic: every list follows either desired order or
//! the caller's previously-managed order.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::compute_diff;
pub use human_summary::render_human_summary;
pub use model::ChangeSet;
