//! Rule identity and content

use crate::errors::{Result, RuleSyncError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Borrow;
use std::fmt;

/// Longest rule name accepted by the policy stores we target
pub const MAX_RULE_NAME_LEN: usize = 63;

/// Canonical identity of a rule within a location
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleName(String);

impl RuleName {
    /// Name for a rule this tool will write
    ///
    /// # Errors
    ///
    /// `InvalidRuleName` if the name is blank, has surrounding whitespace,
    /// contains control characters or exceeds [`MAX_RULE_NAME_LEN`].
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = Self::from_remote(name)?;
        name.validate_local()?;
        Ok(name)
    }

    /// Name as reported by the remote store
    ///
    /// Foreign rules are named by whoever created them, so only an empty
    /// name is refused.
    ///
    /// # Errors
    ///
    /// `InvalidRuleName` if the name is empty.
    pub fn from_remote(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RuleSyncError::InvalidRuleName {
                reason: "name cannot be empty".to_string(),
            });
        }
        Ok(Self(name))
    }

    /// # Errors
    ///
    /// `InvalidRuleName` when this name could not have come from
    /// [`RuleName::new`].
    pub fn validate_local(&self) -> Result<()> {
        let name = self.0.as_str();
        if name.trim().is_empty() {
            return Err(RuleSyncError::InvalidRuleName {
                reason: "name cannot be empty".to_string(),
            });
        }
        if name.trim() != name {
            return Err(RuleSyncError::InvalidRuleName {
                reason: format!("'{}' has leading or trailing whitespace", name),
            });
        }
        if name.chars().any(char::is_control) {
            return Err(RuleSyncError::InvalidRuleName {
                reason: format!("'{}' contains control characters", name.escape_debug()),
            });
        }
        if name.chars().count() > MAX_RULE_NAME_LEN {
            return Err(RuleSyncError::InvalidRuleName {
                reason: format!("'{}' is longer than {} characters", name, MAX_RULE_NAME_LEN),
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn remote_name<'de, D>(deserializer: D) -> std::result::Result<RuleName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    RuleName::from_remote(name).map_err(serde::de::Error::custom)
}

impl TryFrom<String> for RuleName {
    type Error = RuleSyncError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RuleName> for String {
    fn from(name: RuleName) -> Self {
        name.0
    }
}

impl Borrow<str> for RuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declared content of a rule
///
/// The body is an opaque JSON payload produced by the schema layer. The core
/// only compares bodies; it never looks inside them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleBody(serde_json::Value);

impl RuleBody {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Compact JSON with object keys in sorted order
    ///
    /// `serde_json::Map` is a `BTreeMap` without the `preserve_order`
    /// feature. Writing a `Value` into memory has no failure path: keys are
    /// strings and numbers are finite.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }

    /// Hex SHA-256 of [`RuleBody::canonical_bytes`]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        hex::encode(hasher.finalize())
    }
}

impl From<serde_json::Value> for RuleBody {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A desired rule: name plus declared body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: RuleName,
    pub body: RuleBody,
}

impl Rule {
    pub fn new(name: RuleName, body: RuleBody) -> Self {
        Self { name, body }
    }
}

/// A rule as reported by the remote store's List call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    #[serde(deserialize_with = "remote_name")]
    pub name: RuleName,
    #[serde(default)]
    pub body: RuleBody,
}

impl RuleSummary {
    pub fn new(name: RuleName, body: RuleBody) -> Self {
        Self { name, body }
    }
}

impl From<Rule> for RuleSummary {
    fn from(rule: Rule) -> Self {
        Self {
            name: rule.name,
            body: rule.body,
        }
    }
}

impl From<RuleSummary> for Rule {
    fn from(summary: RuleSummary) -> Self {
        Self {
            name: summary.name,
            body: summary.body,
        }
    }
}
