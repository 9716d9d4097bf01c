//! Body equality policy
//!
//! Decides whether a desired rule body and the body the remote store reports
//! are the same, and therefore whether a present rule needs an Update. The
//! policy is injected into the reconciler so that callers whose remote store
//! adds defaulted or server-managed fields can compare on their own terms.

use crate::model::RuleBody;
use std::collections::HashSet;

/// Policy trait for comparing rule bodies
pub trait BodyEquality: Send + Sync {
    /// `true` when no Update is needed
    fn same(&self, desired: &RuleBody, remote: &RuleBody) -> bool;
}

/// Structural JSON equality (object key order is irrelevant)
///
/// ```
/// use rulesync_core::model::RuleBody;
/// use rulesync_core::policy::{BodyEquality, ExactBodyEquality};
/// use serde_json::json;
///
/// let eq = ExactBodyEquality;
/// assert!(eq.same(&RuleBody::new(json!({"a": 1})), &RuleBody::new(json!({"a": 1}))));
/// assert!(!eq.same(&RuleBody::new(json!({"a": 1})), &RuleBody::new(json!({"a": 2}))));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactBodyEquality;

impl BodyEquality for ExactBodyEquality {
    fn same(&self, desired: &RuleBody, remote: &RuleBody) -> bool {
        desired == remote
    }
}

/// Compares bodies after dropping a set of top-level keys from both sides
///
/// Useful when the remote store stamps fields such as a uuid or a hit
/// counter onto every rule it returns.
///
/// ```
/// use rulesync_core::model::RuleBody;
/// use rulesync_core::policy::{BodyEquality, IgnoreKeysEquality};
/// use serde_json::json;
///
/// let eq = IgnoreKeysEquality::new(["uuid"]);
/// let desired = RuleBody::new(json!({"action": "allow"}));
/// let remote = RuleBody::new(json!({"action": "allow", "uuid": "5f1c"}));
/// assert!(eq.same(&desired, &remote));
/// ```
#[derive(Debug, Clone, Default)]
pub struct IgnoreKeysEquality {
    ignored: HashSet<String>,
}

impl IgnoreKeysEquality {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored: keys.into_iter().map(Into::into).collect(),
        }
    }

    fn stripped(&self, body: &RuleBody) -> serde_json::Value {
        match body.as_value() {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(k, _)| !self.ignored.contains(k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl BodyEquality for IgnoreKeysEquality {
    fn same(&self, desired: &RuleBody, remote: &RuleBody) -> bool {
        self.stripped(desired) == self.stripped(remote)
    }
}
