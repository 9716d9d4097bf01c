//! rulesync engine - reconciliation orchestration
//!
//! Coordinates the core pipeline against an injected rule store client and,
//! for tracked passes, the SQLite state ledger.

pub mod commands;

pub use commands::options::{ReconcileOptions, ReconcileRequest};
pub use commands::reconcile::{ReconcileOutcome, Reconciler};
