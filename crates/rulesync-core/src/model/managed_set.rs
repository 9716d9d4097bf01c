//! Desired ordered rule list for one pass

use crate::errors::{Result, RuleSyncError};
use crate::model::rule::{Rule, RuleName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The desired, ordered sequence of managed rules
///
/// Built fresh for every pass and never mutated while the pass runs.
/// Construction does not reject duplicates so that the caller gets a
/// `DuplicateName` error from [`ManagedSet::validate`] at pre-flight time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedSet {
    rules: Vec<Rule>,
}

impl ManagedSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names in desired order
    pub fn names(&self) -> Vec<RuleName> {
        self.rules.iter().map(|r| r.name.clone()).collect()
    }

    pub fn name_set(&self) -> HashSet<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name.as_str() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name.as_str() == name)
    }

    /// # Errors
    ///
    /// `InvalidRuleName` for a name [`RuleName::new`] would refuse, and
    /// `DuplicateName` naming the first repeated rule, in list order.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.rules.len());
        for rule in &self.rules {
            rule.name.validate_local()?;
            if !seen.insert(rule.name.as_str()) {
                return Err(RuleSyncError::DuplicateName {
                    name: rule.name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<Rule> for ManagedSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
