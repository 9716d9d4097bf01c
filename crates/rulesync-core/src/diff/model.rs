//! Change-set types

use crate::model::RuleName;
use serde::{Deserialize, Serialize};

/// What one pass has to do, before ordering is considered
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeSet {
    /// Desired rules missing remotely, in desired order
    pub to_create: Vec<RuleName>,
    /// Desired rules present remotely with a different body, in desired order
    pub to_update: Vec<RuleName>,
    /// Previously managed rules no longer desired and still present remotely
    pub to_delete: Vec<RuleName>,
    /// Previously managed rules no longer desired and already gone remotely
    pub already_absent: Vec<RuleName>,
    /// The desired name sequence, verbatim
    pub desired_order: Vec<RuleName>,
}

impl ChangeSet {
    /// No create, update or delete is needed (ordering may still be)
    pub fn has_no_content_changes(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn is_deleted(&self, name: &str) -> bool {
        self.to_delete.iter().any(|n| n.as_str() == name)
    }
}
