//! Structured logging facility for rulesync
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`) that
//!   emit the canonical fields from `rulesync_core_types::schema`
//! - Test capture mode for deterministic assertions
//!
//! Only the engine emits lifecycle events. The store layer logs at debug
//! level with plain `tracing::debug!`; the reconciliation algorithms in this
//! crate are silent.
//!
//! # Usage
//!
//! ```rust
//! use rulesync_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
