//! rulesync core - ordered rule-set reconciliation
//!
//! Converges the managed rules of one remote location to a desired ordered
//! list with the fewest primitive remote calls, without reordering rules it
//! does not own. The pipeline is
//! Read → Diff → Resolve → Plan → Apply:
//!
//! - [`reader::read_snapshot`] fetches the remote order
//! - [`diff::compute_diff`] decides what to create, update and delete
//! - [`position::resolve`] turns a position directive into an anchor
//! - [`planner::plan`] emits deletes, creates, updates and the move chain
//! - [`apply::apply`] runs the plan against a [`client::RuleStoreClient`]
//!
//! Everything here is synchronous and free of global state. Lifecycle
//! logging is the engine's job; this crate only provides the facility.

pub mod apply;
pub mod client;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod planner;
pub mod policy;
pub mod position;
pub mod reader;

// Used by the exported logging macros
#[doc(hidden)]
pub use rulesync_core_types;

pub use apply::{apply, ApplyReport};
pub use client::{ClientResult, InMemoryRuleStore, Placement, RuleStoreClient};
pub use diff::{compute_diff, ChangeSet};
pub use errors::{ExError, ExErrorKind, Result, RuleSyncError};
pub use model::{Location, ManagedSet, RemoteSnapshot, Rule, RuleBody, RuleKind, RuleName, RuleSummary, Rulebase};
pub use planner::{block_in_place, plan, project, RemoteOp};
pub use policy::{BodyEquality, ExactBodyEquality, IgnoreKeysEquality};
pub use position::{resolve, Anchor, Edge, PositionDirective};
pub use reader::read_snapshot;
