//! Schema migrations
//!
//! Migrations are embedded SQL files applied in order, each recorded in
//! `schema_version` with a checksum of its text.

mod checksums;
mod embedded;
mod runner;

pub use checksums::compute_checksum;
pub use runner::{applied_migrations, apply_migrations};
