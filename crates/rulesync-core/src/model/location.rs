//! Location: the scope every reconciliation pass is bound to

use crate::errors::{Result, RuleSyncError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of rule held by a rulebase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Security,
    Nat,
    Qos,
    Authentication,
    Decryption,
    PolicyBasedForwarding,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Security => "security",
            RuleKind::Nat => "nat",
            RuleKind::Qos => "qos",
            RuleKind::Authentication => "authentication",
            RuleKind::Decryption => "decryption",
            RuleKind::PolicyBasedForwarding => "policy_based_forwarding",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "security" => Some(RuleKind::Security),
            "nat" => Some(RuleKind::Nat),
            "qos" => Some(RuleKind::Qos),
            "authentication" => Some(RuleKind::Authentication),
            "decryption" => Some(RuleKind::Decryption),
            "policy_based_forwarding" => Some(RuleKind::PolicyBasedForwarding),
            _ => None,
        }
    }
}

/// Which rulebase of a scope the rules live in
///
/// Shared (device-group style) scopes have pre and post rulebases; a local
/// scope such as a vsys has a single rulebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rulebase {
    Pre,
    Post,
    Local,
}

impl Rulebase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rulebase::Pre => "pre",
            Rulebase::Post => "post",
            Rulebase::Local => "local",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pre" => Some(Rulebase::Pre),
            "post" => Some(Rulebase::Post),
            "local" => Some(Rulebase::Local),
            _ => None,
        }
    }
}

/// Opaque scope key: `(scope, rulebase, kind)`
///
/// Rule names are unique within a location. Nothing in the core moves a rule
/// between locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    scope: String,
    rulebase: Rulebase,
    kind: RuleKind,
}

impl Location {
    /// # Errors
    ///
    /// `InvalidLocation` if `scope` is blank or contains `/`.
    pub fn new(scope: impl Into<String>, rulebase: Rulebase, kind: RuleKind) -> Result<Self> {
        let scope = scope.into();
        if scope.trim().is_empty() {
            return Err(RuleSyncError::InvalidLocation {
                reason: "scope cannot be empty".to_string(),
            });
        }
        if scope.contains('/') {
            return Err(RuleSyncError::InvalidLocation {
                reason: format!("scope '{}' cannot contain '/'", scope),
            });
        }
        Ok(Self {
            scope,
            rulebase,
            kind,
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn rulebase(&self) -> Rulebase {
        self.rulebase
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Stable string key, `scope/rulebase/kind`
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}",
            self.scope,
            self.rulebase.as_str(),
            self.kind.as_str()
        )
    }

    /// Parse a key produced by [`Location::key`]
    ///
    /// # Errors
    ///
    /// `InvalidLocation` if the key is not `scope/rulebase/kind` with known
    /// rulebase and kind values.
    pub fn parse_key(key: &str) -> Result<Self> {
        let parts: Vec<&str> = key.split('/').collect();
        let [scope, rulebase, kind] = parts.as_slice() else {
            return Err(RuleSyncError::InvalidLocation {
                reason: format!("expected scope/rulebase/kind, got '{}'", key),
            });
        };
        let rulebase = Rulebase::parse(rulebase).ok_or_else(|| RuleSyncError::InvalidLocation {
            reason: format!("unknown rulebase '{}'", rulebase),
        })?;
        let kind = RuleKind::parse(kind).ok_or_else(|| RuleSyncError::InvalidLocation {
            reason: format!("unknown rule kind '{}'", kind),
        })?;
        Self::new(*scope, rulebase, kind)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
