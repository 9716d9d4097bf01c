//! SQLite-backed rule store
//!
//! [`SqliteRuleStore`] implements `RuleStoreClient` over the `rules` table.
//! Each location keeps dense positions `0..n`; every mutation that changes
//! the order rewrites those positions inside a single transaction, so a
//! reader never sees a half-applied call.

#![allow(clippy::result_large_err)]

use crate::config::StoreConfig;
use crate::db::open_with_config;
use crate::errors::{corrupt_row, from_rusqlite, from_serde_json, lock_poisoned, Result};
use crate::migrations::apply_migrations;
use rulesync_core::client::{ClientResult, Placement, RuleStoreClient};
use rulesync_core::errors::{ExError, ExErrorKind};
use rulesync_core::model::{Location, Rule, RuleBody, RuleName, RuleSummary};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::sync::{Mutex, MutexGuard};

pub struct SqliteRuleStore {
    conn: Mutex<Connection>,
}

impl SqliteRuleStore {
    /// Open (and migrate) the database described by `config`
    ///
    /// # Errors
    ///
    /// `Persistence` or `MigrationFailed` if the database cannot be prepared.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_with_config(config)?),
        })
    }

    /// # Errors
    ///
    /// As [`SqliteRuleStore::open`].
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Wrap an existing connection, applying pending migrations
    ///
    /// # Errors
    ///
    /// `MigrationFailed` or `Persistence` from the migration runner.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned("rule_store"))
    }

    /// Replace the whole contents of `location` with `rules`, in order
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if `rules` repeats a name, `Persistence` on SQLite
    /// failures.
    pub fn replace_all(&self, location: &Location, rules: &[RuleSummary]) -> Result<()> {
        let key = location.key();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        tx.execute("DELETE FROM rules WHERE location_key = ?1", [&key])
            .map_err(from_rusqlite)?;
        for (position, rule) in rules.iter().enumerate() {
            if rule_exists(&tx, &key, rule.name.as_str())? {
                return Err(already_exists(location, &rule.name));
            }
            insert_rule(&tx, &key, position, &rule.name, &rule.body)?;
        }
        tx.commit().map_err(from_rusqlite)?;
        tracing::debug!(location = %key, count = rules.len(), "replaced rule list");
        Ok(())
    }

    /// Locations that hold at least one rule
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failures or when a stored key no longer parses.
    pub fn locations(&self) -> Result<Vec<Location>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT location_key FROM rules ORDER BY location_key")
            .map_err(from_rusqlite)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        keys.iter()
            .map(|key| Location::parse_key(key).map_err(|e| corrupt_row("locations", e)))
            .collect()
    }

    /// Stored digest of a rule body, if the rule exists
    ///
    /// # Errors
    ///
    /// `Persistence` on SQLite failures.
    pub fn body_digest(&self, location: &Location, name: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT body_digest FROM rules WHERE location_key = ?1 AND name = ?2",
            rusqlite::params![location.key(), name],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)
    }
}

impl RuleStoreClient for SqliteRuleStore {
    fn list(&self, location: &Location) -> ClientResult<Vec<RuleSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT name, body FROM rules WHERE location_key = ?1 ORDER BY position")
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([location.key()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter()
            .map(|(name, body)| {
                let name = RuleName::from_remote(name).map_err(|e| corrupt_row("list", e))?;
                let body: serde_json::Value = serde_json::from_str(&body).map_err(from_serde_json)?;
                Ok(RuleSummary::new(name, RuleBody::new(body)))
            })
            .collect()
    }

    fn create(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        let key = location.key();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        if rule_exists(&tx, &key, rule.name.as_str())? {
            return Err(already_exists(location, &rule.name));
        }
        let next: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM rules WHERE location_key = ?1",
                [&key],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        insert_rule(&tx, &key, next as usize, &rule.name, &rule.body)?;
        tx.commit().map_err(from_rusqlite)?;
        tracing::debug!(location = %key, rule = %rule.name, position = next, "created rule");
        Ok(())
    }

    fn update(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        let key = location.key();
        let body = serde_json::to_string(rule.body.as_value()).map_err(from_serde_json)?;
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE rules SET body = ?1, body_digest = ?2, updated_at = ?3
                 WHERE location_key = ?4 AND name = ?5",
                rusqlite::params![
                    body,
                    rule.body.digest(),
                    chrono::Utc::now().timestamp(),
                    key,
                    rule.name.as_str()
                ],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(not_found(location, "update", rule.name.as_str()));
        }
        tracing::debug!(location = %key, rule = %rule.name, "updated rule");
        Ok(())
    }

    fn delete(&self, location: &Location, names: &[RuleName]) -> ClientResult<()> {
        let key = location.key();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let mut first_absent = None;
        for name in names {
            let removed = tx
                .execute(
                    "DELETE FROM rules WHERE location_key = ?1 AND name = ?2",
                    rusqlite::params![key, name.as_str()],
                )
                .map_err(from_rusqlite)?;
            if removed == 0 && first_absent.is_none() {
                first_absent = Some(name.as_str());
            }
        }
        let order = load_order(&tx, &key)?;
        write_order(&tx, &key, &order)?;
        tx.commit().map_err(from_rusqlite)?;
        tracing::debug!(location = %key, count = names.len(), "deleted rules");

        match first_absent {
            Some(name) => Err(not_found(location, "delete", name)),
            None => Ok(()),
        }
    }

    fn move_rule(
        &self,
        location: &Location,
        name: &RuleName,
        placement: &Placement,
    ) -> ClientResult<()> {
        let key = location.key();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let mut order = load_order(&tx, &key)?;
        reposition(&mut order, location, name.as_str(), placement)?;
        write_order(&tx, &key, &order)?;
        tx.commit().map_err(from_rusqlite)?;
        tracing::debug!(location = %key, rule = %name, placement = %placement, "moved rule");
        Ok(())
    }
}

fn already_exists(location: &Location, name: &RuleName) -> ExError {
    ExError::new(ExErrorKind::AlreadyExists)
        .with_op("create")
        .with_location(location.key())
        .with_rule_name(name.as_str())
        .with_message(format!("rule '{}' already exists", name))
}

fn not_found(location: &Location, op: &str, name: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op.to_string())
        .with_location(location.key())
        .with_rule_name(name)
        .with_message(format!("rule '{}' not found", name))
}

fn rule_exists(tx: &Transaction<'_>, key: &str, name: &str) -> Result<bool> {
    tx.query_row(
        "SELECT 1 FROM rules WHERE location_key = ?1 AND name = ?2",
        rusqlite::params![key, name],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
    .map_err(from_rusqlite)
}

fn insert_rule(
    tx: &Transaction<'_>,
    key: &str,
    position: usize,
    name: &RuleName,
    body: &RuleBody,
) -> Result<()> {
    let json = serde_json::to_string(body.as_value()).map_err(from_serde_json)?;
    tx.execute(
        "INSERT INTO rules (location_key, name, position, body, body_digest, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            key,
            name.as_str(),
            position as i64,
            json,
            body.digest(),
            chrono::Utc::now().timestamp()
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

fn load_order(tx: &Transaction<'_>, key: &str) -> Result<Vec<String>> {
    let mut stmt = tx
        .prepare("SELECT name FROM rules WHERE location_key = ?1 ORDER BY position")
        .map_err(from_rusqlite)?;
    let names = stmt
        .query_map([key], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(from_rusqlite)?;
    Ok(names)
}

fn write_order(tx: &Transaction<'_>, key: &str, order: &[String]) -> Result<()> {
    let mut stmt = tx
        .prepare("UPDATE rules SET position = ?1 WHERE location_key = ?2 AND name = ?3")
        .map_err(from_rusqlite)?;
    for (position, name) in order.iter().enumerate() {
        stmt.execute(rusqlite::params![position as i64, key, name])
            .map_err(from_rusqlite)?;
    }
    Ok(())
}

fn reposition(
    order: &mut Vec<String>,
    location: &Location,
    name: &str,
    placement: &Placement,
) -> Result<()> {
    let from = order
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| not_found(location, "move", name))?;

    if let Some(pivot) = placement.pivot() {
        if pivot.as_str() == name {
            return Err(ExError::new(ExErrorKind::RemoteRejected)
                .with_op("move")
                .with_location(location.key())
                .with_rule_name(name)
                .with_message("a rule cannot be moved relative to itself"));
        }
        if !order.iter().any(|n| n == pivot.as_str()) {
            return Err(not_found(location, "move", pivot.as_str()));
        }
    }

    let moved = order.remove(from);
    let to = match placement {
        Placement::First => 0,
        Placement::Last => order.len(),
        Placement::Before(pivot) | Placement::After(pivot) => {
            let at = order
                .iter()
                .position(|n| n == pivot.as_str())
                .ok_or_else(|| not_found(location, "move", pivot.as_str()))?;
            if matches!(placement, Placement::After(_)) {
                at + 1
            } else {
                at
            }
        }
    };
    order.insert(to, moved);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesync_core::model::{RuleKind, Rulebase};
    use serde_json::json;

    fn location() -> Location {
        Location::new("vsys1", Rulebase::Pre, RuleKind::Security).unwrap()
    }

    fn rule(name: &str) -> Rule {
        Rule::new(RuleName::new(name).unwrap(), RuleBody::new(json!({ "action": "allow" })))
    }

    fn names(store: &SqliteRuleStore) -> Vec<String> {
        store
            .list(&location())
            .unwrap()
            .into_iter()
            .map(|r| r.name.to_string())
            .collect()
    }

    fn store_with(names: &[&str]) -> SqliteRuleStore {
        let store = SqliteRuleStore::open_in_memory().unwrap();
        for n in names {
            store.create(&location(), &rule(n)).unwrap();
        }
        store
    }

    #[test]
    fn test_create_appends() {
        let store = store_with(&["a", "b", "c"]);
        assert_eq!(names(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_create_duplicate_is_already_exists() {
        let store = store_with(&["a"]);
        let err = store.create(&location(), &rule("a")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::AlreadyExists);
    }

    #[test]
    fn test_update_keeps_position_and_changes_body() {
        let store = store_with(&["a", "b"]);
        let changed = Rule::new(RuleName::new("a").unwrap(), RuleBody::new(json!({ "action": "deny" })));
        store.update(&location(), &changed).unwrap();

        let listed = store.list(&location()).unwrap();
        assert_eq!(listed[0].name.as_str(), "a");
        assert_eq!(listed[0].body, changed.body);
        assert_eq!(
            store.body_digest(&location(), "a").unwrap(),
            Some(changed.body.digest())
        );
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = store_with(&[]);
        let err = store.update(&location(), &rule("ghost")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.rule_name(), Some("ghost"));
    }

    #[test]
    fn test_delete_renumbers_and_reports_absent() {
        let store = store_with(&["a", "b", "c"]);
        let err = store
            .delete(
                &location(),
                &[RuleName::new("b").unwrap(), RuleName::new("zz").unwrap()],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.rule_name(), Some("zz"));
        assert_eq!(names(&store), vec!["a", "c"]);

        store.create(&location(), &rule("d")).unwrap();
        assert_eq!(names(&store), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_move_placements() {
        let store = store_with(&["a", "b", "c", "d"]);
        let loc = location();
        let n = |s: &str| RuleName::new(s).unwrap();

        store.move_rule(&loc, &n("d"), &Placement::First).unwrap();
        assert_eq!(names(&store), vec!["d", "a", "b", "c"]);

        store.move_rule(&loc, &n("d"), &Placement::Last).unwrap();
        assert_eq!(names(&store), vec!["a", "b", "c", "d"]);

        store.move_rule(&loc, &n("a"), &Placement::After(n("c"))).unwrap();
        assert_eq!(names(&store), vec!["b", "c", "a", "d"]);

        store.move_rule(&loc, &n("d"), &Placement::Before(n("b"))).unwrap();
        assert_eq!(names(&store), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_move_errors_leave_order_untouched() {
        let store = store_with(&["a", "b"]);
        let loc = location();
        let n = |s: &str| RuleName::new(s).unwrap();

        let err = store.move_rule(&loc, &n("a"), &Placement::After(n("zz"))).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);

        let err = store.move_rule(&loc, &n("a"), &Placement::Before(n("a"))).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::RemoteRejected);

        assert_eq!(names(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_locations_are_isolated() {
        let store = store_with(&["a"]);
        let other = Location::new("vsys2", Rulebase::Pre, RuleKind::Security).unwrap();
        store.create(&other, &rule("a")).unwrap();

        assert_eq!(store.list(&other).unwrap().len(), 1);
        assert_eq!(store.locations().unwrap().len(), 2);
    }
}
