//! Remote snapshot reader

use crate::client::RuleStoreClient;
use crate::errors::{ExErrorKind, Result, RuleSyncError};
use crate::model::{Location, RemoteSnapshot};

/// Fetch the full ordered rule list for `location`.
///
/// The listing is returned verbatim, in server order. A location the store
/// does not know yet (`NotFound`) reads as empty.
///
/// # Errors
///
/// - `RemoteUnavailable` for any other List failure; it is not retried
/// - `DuplicateRemoteName` if the listing names a rule twice
pub fn read_snapshot<C>(client: &C, location: &Location) -> Result<RemoteSnapshot>
where
    C: RuleStoreClient + ?Sized,
{
    match client.list(location) {
        Ok(entries) => RemoteSnapshot::new(location.clone(), entries),
        Err(err) if err.kind() == ExErrorKind::NotFound => {
            Ok(RemoteSnapshot::empty(location.clone()))
        }
        Err(err) => Err(RuleSyncError::RemoteUnavailable {
            op: "list".to_string(),
            message: err.to_string(),
        }),
    }
}
