//! Fixture parser with validation

#![allow(clippy::result_large_err)]

use crate::errors::{fixture_validation, io_error, Result};
use crate::fixture::format_v0::FixtureV0;
use rulesync_core::model::{Location, RuleBody, RuleName, RuleSummary};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

/// A validated fixture
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub location: Location,
    pub rules: Vec<RuleSummary>,
    pub managed: Vec<RuleName>,
    /// SHA256 of the source text
    pub digest: String,
}

/// # Errors
///
/// `Io` if the file cannot be read, otherwise as [`parse_fixture_str`].
pub fn parse_fixture_file(path: &Path) -> Result<Fixture> {
    let content = std::fs::read_to_string(path).map_err(|e| io_error("read_fixture", e))?;
    parse_fixture_str(&content)
}

/// Parse and validate a v0 fixture
///
/// # Errors
///
/// `InvalidFixture` for malformed YAML, an unsupported schema version, an
/// invalid location or rule name, or a name listed twice.
pub fn parse_fixture_str(content: &str) -> Result<Fixture> {
    let raw: FixtureV0 = serde_yaml::from_str(content)
        .map_err(|e| fixture_validation(&format!("YAML parse error: {}", e)))?;

    if raw.schema_version != 0 {
        return Err(fixture_validation(&format!(
            "Unsupported schema_version: {}. Expected 0",
            raw.schema_version
        )));
    }

    let location = Location::new(raw.location.scope, raw.location.rulebase, raw.location.kind)
        .map_err(|e| fixture_validation(&e.to_string()))?;

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(raw.rules.len());
    for rule in raw.rules {
        let name =
            RuleName::from_remote(rule.name).map_err(|e| fixture_validation(&e.to_string()))?;
        if !seen.insert(name.clone()) {
            return Err(fixture_validation(&format!("Duplicate rule name '{}'", name)));
        }
        rules.push(RuleSummary::new(name, RuleBody::new(rule.body)));
    }

    let mut managed_seen = HashSet::new();
    let mut managed = Vec::with_capacity(raw.managed.len());
    for name in raw.managed {
        let name = RuleName::new(name).map_err(|e| fixture_validation(&e.to_string()))?;
        if !managed_seen.insert(name.clone()) {
            return Err(fixture_validation(&format!(
                "Duplicate managed name '{}'",
                name
            )));
        }
        managed.push(name);
    }

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());

    Ok(Fixture {
        location,
        rules,
        managed,
        digest: hex::encode(hasher.finalize()),
    })
}
