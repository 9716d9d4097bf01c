//! Command orchestration layer.
//!
//! ## Logging Ownership
//!
//! The engine owns lifecycle logging for reconciliation:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The store uses only `tracing::debug!`; the core algorithms emit nothing.

pub mod options;
pub mod reconcile;
pub mod tracked;
