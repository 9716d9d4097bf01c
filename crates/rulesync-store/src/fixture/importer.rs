//! Fixture import
//!
//! Replaces a location's rules in a [`SqliteRuleStore`] with the fixture's
//! and, when a state ledger is given, records the fixture's managed names.

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use crate::fixture::parser::{parse_fixture_file, Fixture};
use crate::rule_store::SqliteRuleStore;
use crate::state::ManagedStateStore;
use std::path::Path;

/// Import a parsed fixture, returning its digest
///
/// # Errors
///
/// `Persistence` on SQLite failures.
pub fn import_fixture(
    fixture: &Fixture,
    rules: &SqliteRuleStore,
    state: Option<&ManagedStateStore>,
) -> Result<String> {
    rules.replace_all(&fixture.location, &fixture.rules)?;
    if let Some(state) = state {
        state.save_managed(&fixture.location, &fixture.managed)?;
    }
    tracing::info!(
        location = %fixture.location,
        rules = fixture.rules.len(),
        managed = fixture.managed.len(),
        digest = %fixture.digest,
        "imported fixture"
    );
    Ok(fixture.digest.clone())
}

/// Parse and import a fixture file
///
/// # Errors
///
/// As [`parse_fixture_file`] and [`import_fixture`].
pub fn import_fixture_file(
    path: &Path,
    rules: &SqliteRuleStore,
    state: Option<&ManagedStateStore>,
) -> Result<String> {
    let fixture = parse_fixture_file(path)?;
    import_fixture(&fixture, rules, state)
}
