//! rulesync store - SQLite persistence for rulesync
//!
//! Provides:
//! - [`SqliteRuleStore`], a `RuleStoreClient` backed by SQLite, usable as a
//!   local policy store for staging and tests
//! - [`state::ManagedStateStore`], the per-location ledger of managed names
//!   and reconcile run history
//! - YAML rulebase fixtures that stage remote contents
//! - Embedded, checksummed schema migrations

pub mod config;
pub mod db;
pub mod errors;
pub mod fixture;
pub mod migrations;
pub mod rule_store;
pub mod state;

pub use config::StoreConfig;
pub use errors::Result;
pub use rule_store::SqliteRuleStore;
pub use state::{ManagedStateStore, RunRecord, RunStatus};
