//! Rule store client contract
//!
//! The remote policy store is reached only through [`RuleStoreClient`]. It
//! offers the primitive List/Create/Update/Delete/Move calls and nothing
//! like a bulk "set order". Implementations report failures as [`ExError`]
//! and must use `ExErrorKind::NotFound` for absent rules so callers can tell
//! drift apart from real failures.

pub mod memory;
pub mod recording;

use crate::errors::ExError;
use crate::model::{Location, Rule, RuleName, RuleSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use memory::InMemoryRuleStore;
pub use recording::{RecordedCall, RecordingClient};

pub type ClientResult<T> = std::result::Result<T, ExError>;

/// Target of a Move call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "where", content = "pivot", rename_all = "snake_case")]
pub enum Placement {
    First,
    Last,
    Before(RuleName),
    After(RuleName),
}

impl Placement {
    /// Wire value of the `where` argument
    pub fn where_str(&self) -> &'static str {
        match self {
            Placement::First => "first",
            Placement::Last => "last",
            Placement::Before(_) => "before",
            Placement::After(_) => "after",
        }
    }

    pub fn pivot(&self) -> Option<&RuleName> {
        match self {
            Placement::Before(p) | Placement::After(p) => Some(p),
            Placement::First | Placement::Last => None,
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pivot() {
            Some(pivot) => write!(f, "{} {}", self.where_str(), pivot),
            None => f.write_str(self.where_str()),
        }
    }
}

/// Synchronous client for one remote policy store
///
/// All calls are scoped to a single [`Location`]. The reconciler never
/// retries, cancels or times out a call; that is up to the implementation.
pub trait RuleStoreClient: Send + Sync {
    /// Full ordered rule list for `location`
    ///
    /// # Errors
    ///
    /// Transport failures, or `NotFound` when the location itself is unknown.
    fn list(&self, location: &Location) -> ClientResult<Vec<RuleSummary>>;

    /// Create `rule`; new rules are appended at the end of the order
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the name is taken, or any transport failure.
    fn create(&self, location: &Location, rule: &Rule) -> ClientResult<()>;

    /// Replace the body of an existing rule without moving it
    ///
    /// # Errors
    ///
    /// `NotFound` if the rule is absent, or any transport failure.
    fn update(&self, location: &Location, rule: &Rule) -> ClientResult<()>;

    /// Delete every named rule that exists
    ///
    /// # Errors
    ///
    /// `NotFound` naming an absent rule after the present ones were removed,
    /// or any transport failure.
    fn delete(&self, location: &Location, names: &[RuleName]) -> ClientResult<()>;

    /// Move `name` relative to the list edges or to a pivot rule
    ///
    /// # Errors
    ///
    /// `NotFound` if `name` or the pivot is absent, or any transport failure.
    fn move_rule(&self, location: &Location, name: &RuleName, placement: &Placement)
        -> ClientResult<()>;
}

impl<T: RuleStoreClient + ?Sized> RuleStoreClient for &T {
    fn list(&self, location: &Location) -> ClientResult<Vec<RuleSummary>> {
        (**self).list(location)
    }

    fn create(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        (**self).create(location, rule)
    }

    fn update(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        (**self).update(location, rule)
    }

    fn delete(&self, location: &Location, names: &[RuleName]) -> ClientResult<()> {
        (**self).delete(location, names)
    }

    fn move_rule(
        &self,
        location: &Location,
        name: &RuleName,
        placement: &Placement,
    ) -> ClientResult<()> {
        (**self).move_rule(location, name, placement)
    }
}

impl<T: RuleStoreClient + ?Sized> RuleStoreClient for Arc<T> {
    fn list(&self, location: &Location) -> ClientResult<Vec<RuleSummary>> {
        (**self).list(location)
    }

    fn create(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        (**self).create(location, rule)
    }

    fn update(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        (**self).update(location, rule)
    }

    fn delete(&self, location: &Location, names: &[RuleName]) -> ClientResult<()> {
        (**self).delete(location, names)
    }

    fn move_rule(
        &self,
        location: &Location,
        name: &RuleName,
        placement: &Placement,
    ) -> ClientResult<()> {
        (**self).move_rule(location, name, placement)
    }
}
