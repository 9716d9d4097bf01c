//! Move-sequence planner
//!
//! Turns a change-set and a resolved anchor into the ordered list of
//! primitive remote calls for one pass:
//!
//! 1. one batched Delete for every rule leaving management
//! 2. one Create per new rule (the remote appends it at the end)
//! 3. one Update per changed body
//! 4. the moves that put the managed block in desired order at the anchor
//!
//! Moves are computed against a virtual order (snapshot minus deletes plus
//! creates appended in desired order). Two chains are built, one pinned at
//! the head of the block and one pinned at its tail, and the one with fewer
//! moves wins; ties go to the head-pinned chain.

mod moves;
pub mod virtual_order;

use crate::client::Placement;
use crate::diff::ChangeSet;
use crate::errors::{Result, RuleSyncError};
use crate::model::{ManagedSet, RemoteSnapshot, Rule, RuleName};
use crate::position::{Anchor, Edge};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub use virtual_order::VirtualOrder;

/// One primitive call against the rule store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RemoteOp {
    Delete { names: Vec<RuleName> },
    Create { rule: Rule },
    Update { rule: Rule },
    Move { name: RuleName, placement: Placement },
}

impl RemoteOp {
    /// Short operation name used in errors and logs
    pub fn op_name(&self) -> &'static str {
        match self {
            RemoteOp::Delete { .. } => "delete",
            RemoteOp::Create { .. } => "create",
            RemoteOp::Update { .. } => "update",
            RemoteOp::Move { .. } => "move",
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, RemoteOp::Move { .. })
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteOp::Delete { names } => {
                let joined: Vec<&str> = names.iter().map(RuleName::as_str).collect();
                write!(f, "delete {}", joined.join(", "))
            }
            RemoteOp::Create { rule } => write!(f, "create {}", rule.name),
            RemoteOp::Update { rule } => write!(f, "update {}", rule.name),
            RemoteOp::Move { name, placement } => write!(f, "move {} {}", name, placement),
        }
    }
}

fn check_pivot(anchor: &Anchor, desired: &ManagedSet, change_set: &ChangeSet) -> Result<()> {
    let Some(pivot) = &anchor.pivot else {
        return Ok(());
    };
    if desired.contains(pivot.as_str()) {
        return Err(RuleSyncError::PivotIsManaged {
            pivot: pivot.to_string(),
        });
    }
    if change_set.is_deleted(pivot.as_str()) {
        return Err(RuleSyncError::PivotScheduledForDeletion {
            pivot: pivot.to_string(),
        });
    }
    Ok(())
}

/// Plan the remote calls for one pass.
///
/// Returns an empty list when the remote already matches: no content change
/// and the managed block already in order at the anchor.
///
/// # Errors
///
/// - `PivotIsManaged` / `PivotScheduledForDeletion` for an unusable pivot
/// - `PivotNotFound` if the pivot is missing from the planned order
/// - `Internal` if `change_set` names a rule that `desired` does not hold
pub fn plan(
    desired: &ManagedSet,
    change_set: &ChangeSet,
    anchor: &Anchor,
    snapshot: &RemoteSnapshot,
) -> Result<Vec<RemoteOp>> {
    check_pivot(anchor, desired, change_set)?;

    let lookup = |name: &RuleName| -> Result<Rule> {
        desired
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| RuleSyncError::Internal {
                message: format!("change-set names '{}' which is not desired", name),
            })
    };

    let mut ops = Vec::new();
    if !change_set.to_delete.is_empty() {
        ops.push(RemoteOp::Delete {
            names: change_set.to_delete.clone(),
        });
    }
    for name in &change_set.to_create {
        ops.push(RemoteOp::Create {
            rule: lookup(name)?,
        });
    }
    for name in &change_set.to_update {
        ops.push(RemoteOp::Update {
            rule: lookup(name)?,
        });
    }

    let mut order = VirtualOrder::from_snapshot(snapshot);
    for name in &change_set.to_delete {
        order.remove(name.as_str());
    }
    for name in &change_set.to_create {
        order.push(name.clone());
    }

    let managed: HashSet<&str> = desired.name_set();
    let forward = moves::forward_chain(&order, &change_set.desired_order, anchor, &managed)?;
    let backward = moves::backward_chain(&order, &change_set.desired_order, anchor, &managed)?;
    let chain = if backward.moves.len() < forward.moves.len() {
        backward
    } else {
        forward
    };

    ops.extend(
        chain
            .moves
            .into_iter()
            .map(|(name, placement)| RemoteOp::Move { name, placement }),
    );
    Ok(ops)
}

/// Whether `snapshot` holds the desired names as one contiguous block, in
/// desired order, at `anchor`
///
/// The anchor is checked with the predicate the planner pins chains with:
/// on the head for `Start`/`Before`, on the tail for `End`/`After`. An
/// empty desired set is always in place.
///
/// # Errors
///
/// `PivotNotFound` if the anchor's pivot is not in `snapshot`.
pub fn block_in_place(
    snapshot: &RemoteSnapshot,
    desired: &ManagedSet,
    anchor: &Anchor,
) -> Result<bool> {
    let names = desired.names();
    let (Some(head), Some(tail)) = (names.first(), names.last()) else {
        return Ok(true);
    };
    let Some(start) = snapshot.position_of(head.as_str()) else {
        return Ok(false);
    };
    let contiguous = names
        .iter()
        .enumerate()
        .all(|(offset, name)| snapshot.position_of(name.as_str()) == Some(start + offset));
    if !contiguous {
        return Ok(false);
    }

    let pinned = match anchor.edge {
        Edge::Start | Edge::Before => head,
        Edge::End | Edge::After => tail,
    };
    let order = VirtualOrder::from_snapshot(snapshot);
    moves::anchor_satisfied(&order, pinned.as_str(), anchor, &desired.name_set())
}

/// Order the remote would have after applying `ops` to `snapshot`
///
/// Deletes of absent names are ignored, like the remote does.
///
/// # Errors
///
/// `Internal` if a move references a name that would not exist.
pub fn project(snapshot: &RemoteSnapshot, ops: &[RemoteOp]) -> Result<Vec<RuleName>> {
    let mut order = VirtualOrder::from_snapshot(snapshot);
    for op in ops {
        match op {
            RemoteOp::Delete { names } => {
                for name in names {
                    order.remove(name.as_str());
                }
            }
            RemoteOp::Create { rule } => order.push(rule.name.clone()),
            RemoteOp::Update { .. } => {}
            RemoteOp::Move { name, placement } => order.apply_move(name, placement)?,
        }
    }
    Ok(order.into_names())
}
