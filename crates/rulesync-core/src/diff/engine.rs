//! Diff engine
//!
//! "Managed" is decided purely by name membership in the desired list. A
//! rule that was managed by an earlier pass and is no longer desired is
//! deleted; a rule that was never managed and is not desired is foreign and
//! left alone.

use crate::diff::model::ChangeSet;
use crate::errors::Result;
use crate::model::{ManagedSet, RemoteSnapshot, RuleName};
use crate::policy::BodyEquality;
use std::collections::HashSet;

/// Compute the change-set for one pass.
///
/// Delete candidates that are already absent from the snapshot land in
/// `already_absent` instead of `to_delete`; deleting them would be a no-op.
/// Repeated names in `previously_managed` are collapsed.
///
/// # Errors
///
/// `DuplicateName` if `desired` names a rule twice.
pub fn compute_diff(
    desired: &ManagedSet,
    previously_managed: &[RuleName],
    snapshot: &RemoteSnapshot,
    equality: &dyn BodyEquality,
) -> Result<ChangeSet> {
    desired.validate()?;

    let mut change_set = ChangeSet {
        desired_order: desired.names(),
        ..ChangeSet::default()
    };

    for rule in desired.rules() {
        match snapshot.get(rule.name.as_str()) {
            None => change_set.to_create.push(rule.name.clone()),
            Some(remote) if !equality.same(&rule.body, &remote.body) => {
                change_set.to_update.push(rule.name.clone())
            }
            Some(_) => {}
        }
    }

    let wanted = desired.name_set();
    let mut seen = HashSet::new();
    for name in previously_managed {
        if wanted.contains(name.as_str()) || !seen.insert(name.as_str()) {
            continue;
        }
        if snapshot.contains(name.as_str()) {
            change_set.to_delete.push(name.clone());
        } else {
            change_set.already_absent.push(name.clone());
        }
    }

    Ok(change_set)
}
