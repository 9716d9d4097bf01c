use rulesync_core::{
    InMemoryRuleStore, Location, ManagedSet, Rule, RuleBody, RuleKind, RuleName, RuleSummary,
    Rulebase,
};
use serde_json::json;

#[allow(dead_code)]
pub fn location() -> Location {
    Location::new("vsys1", Rulebase::Local, RuleKind::Security).unwrap()
}

#[allow(dead_code)]
pub fn name(n: &str) -> RuleName {
    RuleName::new(n).unwrap()
}

#[allow(dead_code)]
pub fn names(list: &[&str]) -> Vec<RuleName> {
    list.iter().map(|n| name(n)).collect()
}

/// Body that is distinct per rule name, so equal names mean equal bodies
#[allow(dead_code)]
pub fn body_for(n: &str) -> RuleBody {
    RuleBody::new(json!({ "description": format!("rule {}", n), "action": "allow" }))
}

#[allow(dead_code)]
pub fn desired(list: &[&str]) -> ManagedSet {
    list.iter()
        .map(|n| Rule::new(name(n), body_for(n)))
        .collect()
}

/// Store seeded with `list` at [`location`], bodies from [`body_for`]
#[allow(dead_code)]
pub fn store_with(list: &[&str]) -> InMemoryRuleStore {
    InMemoryRuleStore::new().with_rules(
        &location(),
        list.iter()
            .map(|n| RuleSummary::new(name(n), body_for(n)))
            .collect(),
    )
}
