use rulesync_core::client::{ClientResult, Placement};
use rulesync_core::{
    InMemoryRuleStore, Location, ManagedSet, Rule, RuleBody, RuleKind, RuleName, RuleStoreClient,
    RuleSummary, Rulebase,
};
use serde_json::json;

#[allow(dead_code)]
pub fn location() -> Location {
    Location::new("vsys1", Rulebase::Local, RuleKind::Security).unwrap()
}

#[allow(dead_code)]
pub fn location_for(scope: &str) -> Location {
    Location::new(scope, Rulebase::Pre, RuleKind::Security).unwrap()
}

#[allow(dead_code)]
pub fn name(n: &str) -> RuleName {
    RuleName::new(n).unwrap()
}

#[allow(dead_code)]
pub fn names(list: &[&str]) -> Vec<RuleName> {
    list.iter().map(|n| name(n)).collect()
}

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

#[allow(dead_code)]
pub fn seed(store: &InMemoryRuleStore, location: &Location, list: &[&str]) {
    store.seed(
        location,
        list.iter()
            .map(|n| RuleSummary::new(name(n), body_for(n)))
            .collect(),
    );
}

#[allow(dead_code)]
pub fn store_with(list: &[&str]) -> InMemoryRuleStore {
    let store = InMemoryRuleStore::new();
    seed(&store, &location(), list);
    store
}

/// Accepts every call but never reorders anything
#[allow(dead_code)]
pub struct IgnoresMoves(pub InMemoryRuleStore);

impl RuleStoreClient for IgnoresMoves {
    fn list(&self, location: &Location) -> ClientResult<Vec<RuleSummary>> {
        self.0.list(location)
    }

    fn create(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        self.0.create(location, rule)
    }

    fn update(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        self.0.update(location, rule)
    }

    fn delete(&self, location: &Location, names: &[RuleName]) -> ClientResult<()> {
        self.0.delete(location, names)
    }

    fn move_rule(&self, _: &Location, _: &RuleName, _: &Placement) -> ClientResult<()> {
        Ok(())
    }
}
