//! Position directives and their resolution against a snapshot

use crate::errors::{Result, RuleSyncError};
use crate::model::{RemoteSnapshot, RuleName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the managed block should sit in the remote order
///
/// With `directly = true` the block's first (for `Before`) or last (for
/// `After`) rule must be the pivot's immediate neighbour. With
/// `directly = false` foreign rules may sit between the block and the pivot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "where", rename_all = "snake_case")]
pub enum PositionDirective {
    First,
    Last,
    Before { pivot: RuleName, directly: bool },
    After { pivot: RuleName, directly: bool },
}

impl PositionDirective {
    pub fn before(pivot: RuleName, directly: bool) -> Self {
        PositionDirective::Before { pivot, directly }
    }

    pub fn after(pivot: RuleName, directly: bool) -> Self {
        PositionDirective::After { pivot, directly }
    }

    pub fn pivot(&self) -> Option<&RuleName> {
        match self {
            PositionDirective::Before { pivot, .. } | PositionDirective::After { pivot, .. } => {
                Some(pivot)
            }
            PositionDirective::First | PositionDirective::Last => None,
        }
    }
}

impl fmt::Display for PositionDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionDirective::First => f.write_str("first"),
            PositionDirective::Last => f.write_str("last"),
            PositionDirective::Before { pivot, directly } => {
                write!(f, "{}before {}", if *directly { "directly " } else { "" }, pivot)
            }
            PositionDirective::After { pivot, directly } => {
                write!(f, "{}after {}", if *directly { "directly " } else { "" }, pivot)
            }
        }
    }
}

/// Side of the anchor point the managed block attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Synthetic start of the remote order
    Start,
    /// Synthetic end of the remote order
    End,
    Before,
    After,
}

/// A directive resolved against the current remote order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub pivot: Option<RuleName>,
    pub edge: Edge,
    pub directly: bool,
}

impl Anchor {
    pub fn start() -> Self {
        Self {
            pivot: None,
            edge: Edge::Start,
            directly: true,
        }
    }

    pub fn end() -> Self {
        Self {
            pivot: None,
            edge: Edge::End,
            directly: true,
        }
    }
}

/// Resolve `directive` into an anchor in the snapshot's order.
///
/// `First` and `Last` always resolve; the synthetic edges have no pivot.
///
/// # Errors
///
/// `PivotNotFound` if a `Before`/`After` pivot is not in the snapshot.
pub fn resolve(directive: &PositionDirective, snapshot: &RemoteSnapshot) -> Result<Anchor> {
    let (pivot, edge, directly) = match directive {
        PositionDirective::First => return Ok(Anchor::start()),
        PositionDirective::Last => return Ok(Anchor::end()),
        PositionDirective::Before { pivot, directly } => (pivot, Edge::Before, *directly),
        PositionDirective::After { pivot, directly } => (pivot, Edge::After, *directly),
    };

    if !snapshot.contains(pivot.as_str()) {
        return Err(RuleSyncError::PivotNotFound {
            pivot: pivot.to_string(),
        });
    }

    Ok(Anchor {
        pivot: Some(pivot.clone()),
        edge,
        directly,
    })
}
