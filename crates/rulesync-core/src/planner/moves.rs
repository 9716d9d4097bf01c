//! Move-chain construction
//!
//! A chain pins one end rule of the managed block to the anchor, then walks
//! the desired order pulling each neighbour next to the rule before it (or
//! after it, walking backwards). Foreign rules are never moved and the
//! pinned rule never moves after pinning, so foreign relative order is
//! preserved. Every managed rule moves at most once.

use super::virtual_order::VirtualOrder;
use crate::client::Placement;
use crate::errors::{Result, RuleSyncError};
use crate::model::RuleName;
use crate::position::{Anchor, Edge};
use std::collections::HashSet;

/// Moves of one candidate chain and the order they produce
#[derive(Debug, Clone)]
pub(crate) struct Chain {
    pub moves: Vec<(RuleName, Placement)>,
    pub order: VirtualOrder,
}

/// Move target that satisfies `anchor` for a single rule
pub(crate) fn anchor_placement(anchor: &Anchor) -> Result<Placement> {
    let pivot = || {
        anchor.pivot.clone().ok_or_else(|| RuleSyncError::Internal {
            message: format!("{:?} anchor without a pivot", anchor.edge),
        })
    };
    Ok(match anchor.edge {
        Edge::Start => Placement::First,
        Edge::End => Placement::Last,
        Edge::Before => Placement::Before(pivot()?),
        Edge::After => Placement::After(pivot()?),
    })
}

/// Whether `rule`, as the block's pinned end, already honours `anchor`.
///
/// Managed rules between the pinned rule and the anchor point do not count
/// as separation: the chain pulls them into the block.
pub(crate) fn anchor_satisfied(
    order: &VirtualOrder,
    rule: &str,
    anchor: &Anchor,
    managed: &HashSet<&str>,
) -> Result<bool> {
    let names = order.names();
    let i = order.position(rule).ok_or_else(|| RuleSyncError::Internal {
        message: format!("rule '{}' missing from planned order", rule),
    })?;
    let all_managed = |range: &[RuleName]| range.iter().all(|n| managed.contains(n.as_str()));

    let pivot_pos = || -> Result<usize> {
        let pivot = anchor.pivot.as_ref().ok_or_else(|| RuleSyncError::Internal {
            message: format!("{:?} anchor without a pivot", anchor.edge),
        })?;
        order
            .position(pivot.as_str())
            .ok_or_else(|| RuleSyncError::PivotNotFound {
                pivot: pivot.to_string(),
            })
    };

    Ok(match anchor.edge {
        Edge::Start => all_managed(&names[..i]),
        Edge::End => all_managed(&names[i + 1..]),
        Edge::Before => {
            let j = pivot_pos()?;
            i < j && (!anchor.directly || all_managed(&names[i + 1..j]))
        }
        Edge::After => {
            let j = pivot_pos()?;
            i > j && (!anchor.directly || all_managed(&names[j + 1..i]))
        }
    })
}

fn pin(
    order: &mut VirtualOrder,
    moves: &mut Vec<(RuleName, Placement)>,
    rule: &RuleName,
    anchor: &Anchor,
    managed: &HashSet<&str>,
) -> Result<()> {
    if !anchor_satisfied(order, rule.as_str(), anchor, managed)? {
        let placement = anchor_placement(anchor)?;
        order.apply_move(rule, &placement)?;
        moves.push((rule.clone(), placement));
    }
    Ok(())
}

/// Pin the first desired rule, then `Move(cur, after prev)` down the list
pub(crate) fn forward_chain(
    start: &VirtualOrder,
    desired: &[RuleName],
    anchor: &Anchor,
    managed: &HashSet<&str>,
) -> Result<Chain> {
    let mut order = start.clone();
    let mut moves = Vec::new();
    let Some(head) = desired.first() else {
        return Ok(Chain { moves, order });
    };

    pin(&mut order, &mut moves, head, anchor, managed)?;
    for pair in desired.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if !order.immediately_precedes(prev.as_str(), cur.as_str()) {
            let placement = Placement::After(prev.clone());
            order.apply_move(cur, &placement)?;
            moves.push((cur.clone(), placement));
        }
    }
    Ok(Chain { moves, order })
}

/// Pin the last desired rule, then `Move(cur, before next)` up the list
pub(crate) fn backward_chain(
    start: &VirtualOrder,
    desired: &[RuleName],
    anchor: &Anchor,
    managed: &HashSet<&str>,
) -> Result<Chain> {
    let mut order = start.clone();
    let mut moves = Vec::new();
    let Some(tail) = desired.last() else {
        return Ok(Chain { moves, order });
    };

    pin(&mut order, &mut moves, tail, anchor, managed)?;
    for pair in desired.windows(2).rev() {
        let (cur, next) = (&pair[0], &pair[1]);
        if !order.immediately_precedes(cur.as_str(), next.as_str()) {
            let placement = Placement::Before(next.clone());
            order.apply_move(cur, &placement)?;
            moves.push((cur.clone(), placement));
        }
    }
    Ok(Chain { moves, order })
}
