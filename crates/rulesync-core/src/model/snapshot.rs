//! Point-in-time view of a location's remote rule order

use crate::errors::{Result, RuleSyncError};
use crate::model::location::Location;
use crate::model::managed_set::ManagedSet;
use crate::model::rule::{RuleName, RuleSummary};
use std::collections::HashMap;

/// Ordered rules currently stored remotely for one location
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    location: Location,
    entries: Vec<RuleSummary>,
    index: HashMap<RuleName, usize>,
}

/// Snapshot entries split by membership in the desired set, server order kept
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub managed: Vec<RuleSummary>,
    pub foreign: Vec<RuleSummary>,
}

impl RemoteSnapshot {
    /// # Errors
    ///
    /// `DuplicateRemoteName` if the listing names a rule twice.
    pub fn new(location: Location, entries: Vec<RuleSummary>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if index.insert(entry.name.clone(), pos).is_some() {
                return Err(RuleSyncError::DuplicateRemoteName {
                    name: entry.name.to_string(),
                });
            }
        }
        Ok(Self {
            location,
            entries,
            index,
        })
    }

    pub fn empty(location: Location) -> Self {
        Self {
            location,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn entries(&self) -> &[RuleSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<RuleName> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RuleSummary> {
        self.position_of(name).map(|pos| &self.entries[pos])
    }

    /// Split entries into managed (named in `desired`) and foreign
    pub fn partition(&self, desired: &ManagedSet) -> Partition {
        let wanted = desired.name_set();
        let (managed, foreign) = self
            .entries
            .iter()
            .cloned()
            .partition(|e| wanted.contains(e.name.as_str()));
        Partition { managed, foreign }
    }

    /// Names of desired rules in the order they currently appear remotely
    pub fn managed_order(&self, desired: &ManagedSet) -> Vec<RuleName> {
        self.partition(desired)
            .managed
            .into_iter()
            .map(|e| e.name)
            .collect()
    }
}
