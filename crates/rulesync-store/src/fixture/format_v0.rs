//! Fixture format v0
//!
//! ```yaml
//! schema_version: 0
//! location:
//!   scope: vsys1
//!   rulebase: local
//!   kind: security
//! rules:
//!   - name: allow-dns
//!     body: { action: allow, service: [dns] }
//!   - name: deny-all
//! managed: [allow-dns]
//! ```

use rulesync_core::model::{RuleKind, Rulebase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureV0 {
    /// Must be 0 for this format
    pub schema_version: u32,

    pub location: FixtureLocation,

    /// Remote rules, in order
    #[serde(default)]
    pub rules: Vec<FixtureRule>,

    /// Names recorded as managed by a previous pass
    #[serde(default)]
    pub managed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureLocation {
    pub scope: String,
    pub rulebase: Rulebase,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureRule {
    pub name: String,

    /// Opaque body; null when omitted
    #[serde(default)]
    pub body: serde_json::Value,
}
