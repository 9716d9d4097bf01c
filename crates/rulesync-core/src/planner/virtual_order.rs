//! Simulated remote order used while planning moves

use crate::client::Placement;
use crate::errors::{Result, RuleSyncError};
use crate::model::{RemoteSnapshot, RuleName};

/// Ordered rule names, mutated the way the remote store would be
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VirtualOrder {
    names: Vec<RuleName>,
}

impl VirtualOrder {
    pub fn new(names: Vec<RuleName>) -> Self {
        Self { names }
    }

    pub fn from_snapshot(snapshot: &RemoteSnapshot) -> Self {
        Self::new(snapshot.names())
    }

    pub fn names(&self) -> &[RuleName] {
        &self.names
    }

    pub fn into_names(self) -> Vec<RuleName> {
        self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.as_str() == name)
    }

    /// Returns whether the name was present
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.names.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Append at the end, as a remote Create does
    pub fn push(&mut self, name: RuleName) {
        self.names.push(name);
    }

    /// `prev` sits directly in front of `cur`
    pub fn immediately_precedes(&self, prev: &str, cur: &str) -> bool {
        match (self.position(prev), self.position(cur)) {
            (Some(p), Some(c)) => p + 1 == c,
            _ => false,
        }
    }

    /// Apply a Move exactly as the remote store would
    ///
    /// # Errors
    ///
    /// `Internal` if `name` or the pivot is not in the order; the planner
    /// only emits moves for names it has placed there.
    pub fn apply_move(&mut self, name: &RuleName, placement: &Placement) -> Result<()> {
        let idx = self.position(name.as_str()).ok_or_else(|| RuleSyncError::Internal {
            message: format!("cannot move '{}': not in the planned order", name),
        })?;
        if let Some(pivot) = placement.pivot() {
            if pivot == name || self.position(pivot.as_str()).is_none() {
                return Err(RuleSyncError::Internal {
                    message: format!(
                        "cannot move '{}' {}: pivot not usable in the planned order",
                        name, placement
                    ),
                });
            }
        }

        let moved = self.names.remove(idx);
        let target = match placement {
            Placement::First => 0,
            Placement::Last => self.names.len(),
            Placement::Before(pivot) => self.position(pivot.as_str()).unwrap_or(self.names.len()),
            Placement::After(pivot) => self
                .position(pivot.as_str())
                .map_or(self.names.len(), |p| p + 1),
        };
        self.names.insert(target, moved);
        Ok(())
    }
}
