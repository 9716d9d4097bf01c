//! Applier: runs a planned operation list against a rule store client

use crate::client::RuleStoreClient;
use crate::errors::{ExError, ExErrorKind, Result, RuleSyncError};
use crate::model::Location;
use crate::planner::RemoteOp;
use serde::Serialize;

/// Progress of an apply run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ApplyReport {
    pub applied: usize,
    pub total: usize,
}

fn execute<C>(client: &C, location: &Location, op: &RemoteOp) -> std::result::Result<(), ExError>
where
    C: RuleStoreClient + ?Sized,
{
    match op {
        RemoteOp::Delete { names } => match client.delete(location, names) {
            // Someone else already removed it
            Err(err) if err.kind() == ExErrorKind::NotFound => Ok(()),
            other => other,
        },
        RemoteOp::Create { rule } => client.create(location, rule),
        RemoteOp::Update { rule } => client.update(location, rule),
        RemoteOp::Move { name, placement } => client.move_rule(location, name, placement),
    }
}

/// Execute `ops` strictly in order, stopping at the first failure.
///
/// Nothing is rolled back. Deleting a rule that is already gone counts as
/// success.
///
/// # Errors
///
/// - the classified remote error (`RemoteUnavailable`, `RemoteRejected`,
///   `RuleNotFound`, `RuleAlreadyExists`) if the very first operation fails
/// - `PartialApplication` carrying the applied count if a later one fails
pub fn apply<C>(client: &C, location: &Location, ops: &[RemoteOp]) -> Result<ApplyReport>
where
    C: RuleStoreClient + ?Sized,
{
    let total = ops.len();
    for (applied, op) in ops.iter().enumerate() {
        if let Err(err) = execute(client, location, op) {
            if applied == 0 {
                return Err(RuleSyncError::from_remote(op.op_name(), &err));
            }
            return Err(RuleSyncError::PartialApplication {
                applied,
                total,
                failed_op: op.to_string(),
                cause: err.kind(),
                message: err.to_string(),
            });
        }
    }
    Ok(ApplyReport {
        applied: total,
        total,
    })
}
