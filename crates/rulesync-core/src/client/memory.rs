//! In-memory rule store
//!
//! A thread-safe, multi-location ordered store that follows the client
//! contract exactly. Used as the reference remote in tests and for staging
//! plans without a real policy store. Besides the client calls it exposes
//! out-of-band mutation helpers (to simulate drift) and deterministic
//! failure injection.

use super::{ClientResult, Placement, RuleStoreClient};
use crate::errors::{ExError, ExErrorKind};
use crate::model::{Location, Rule, RuleName, RuleSummary};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy)]
struct InjectedFailure {
    /// 1-based index of the mutating call that fails
    at_call: usize,
    kind: ExErrorKind,
}

#[derive(Debug, Default)]
struct Inner {
    locations: HashMap<Location, Vec<RuleSummary>>,
    mutations: usize,
    failure: Option<InjectedFailure>,
    unavailable: bool,
}

impl Inner {
    fn rules_mut(&mut self, location: &Location) -> &mut Vec<RuleSummary> {
        self.locations.entry(location.clone()).or_default()
    }

    /// Count a mutating call and fail it if an injected failure is due
    fn begin_mutation(&mut self, op: &str, location: &Location) -> ClientResult<()> {
        if self.unavailable {
            return Err(unavailable(op, location));
        }
        self.mutations += 1;
        if let Some(failure) = self.failure {
            if failure.at_call == self.mutations {
                self.failure = None;
                return Err(ExError::new(failure.kind)
                    .with_op(op)
                    .with_location(location.key())
                    .with_message(format!("injected failure on mutating call {}", self.mutations)));
            }
        }
        Ok(())
    }
}

fn unavailable(op: &str, location: &Location) -> ExError {
    ExError::new(ExErrorKind::RemoteUnavailable)
        .with_op(op)
        .with_location(location.key())
        .with_message("store is unavailable")
}

fn not_found(op: &str, location: &Location, name: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op)
        .with_location(location.key())
        .with_rule_name(name)
        .with_message(format!("rule '{}' does not exist", name))
}

fn position(rules: &[RuleSummary], name: &str) -> Option<usize> {
    rules.iter().position(|r| r.name.as_str() == name)
}

/// Ordered, multi-location rule store held in memory
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    inner: Mutex<Inner>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the contents of `location` with `rules`, in order
    pub fn seed(&self, location: &Location, rules: Vec<RuleSummary>) {
        self.lock().locations.insert(location.clone(), rules);
    }

    /// Builder form of [`InMemoryRuleStore::seed`]
    pub fn with_rules(self, location: &Location, rules: Vec<RuleSummary>) -> Self {
        self.seed(location, rules);
        self
    }

    /// Current rules of `location`, in order
    pub fn rules(&self, location: &Location) -> Vec<RuleSummary> {
        self.lock()
            .locations
            .get(location)
            .cloned()
            .unwrap_or_default()
    }

    /// Current rule names of `location`, in order
    pub fn names(&self, location: &Location) -> Vec<String> {
        self.rules(location)
            .into_iter()
            .map(|r| r.name.to_string())
            .collect()
    }

    /// Delete a rule behind the reconciler's back. Returns whether it existed.
    pub fn remove_out_of_band(&self, location: &Location, name: &str) -> bool {
        let mut inner = self.lock();
        let rules = inner.rules_mut(location);
        match position(rules, name) {
            Some(idx) => {
                rules.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Move a rule to index `to` behind the reconciler's back
    pub fn reposition_out_of_band(&self, location: &Location, name: &str, to: usize) -> bool {
        let mut inner = self.lock();
        let rules = inner.rules_mut(location);
        let Some(idx) = position(rules, name) else {
            return false;
        };
        let rule = rules.remove(idx);
        let to = to.min(rules.len());
        rules.insert(to, rule);
        true
    }

    /// Make the `nth` mutating call from now fail with `kind` (1-based)
    pub fn fail_mutation(&self, nth: usize, kind: ExErrorKind) {
        let mut inner = self.lock();
        let at_call = inner.mutations + nth;
        inner.failure = Some(InjectedFailure { at_call, kind });
    }

    /// Make every call fail with `RemoteUnavailable` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Number of mutating calls received so far, failed ones included
    pub fn mutation_count(&self) -> usize {
        self.lock().mutations
    }
}

impl RuleStoreClient for InMemoryRuleStore {
    fn list(&self, location: &Location) -> ClientResult<Vec<RuleSummary>> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(unavailable("list", location));
        }
        Ok(inner.locations.get(location).cloned().unwrap_or_default())
    }

    fn create(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        let mut inner = self.lock();
        inner.begin_mutation("create", location)?;
        let rules = inner.rules_mut(location);
        if position(rules, rule.name.as_str()).is_some() {
            return Err(ExError::new(ExErrorKind::AlreadyExists)
                .with_op("create")
                .with_location(location.key())
                .with_rule_name(rule.name.as_str())
                .with_message(format!("rule '{}' already exists", rule.name)));
        }
        rules.push(RuleSummary::from(rule.clone()));
        Ok(())
    }

    fn update(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        let mut inner = self.lock();
        inner.begin_mutation("update", location)?;
        let rules = inner.rules_mut(location);
        let idx = position(rules, rule.name.as_str())
            .ok_or_else(|| not_found("update", location, rule.name.as_str()))?;
        rules[idx].body = rule.body.clone();
        Ok(())
    }

    fn delete(&self, location: &Location, names: &[RuleName]) -> ClientResult<()> {
        let mut inner = self.lock();
        inner.begin_mutation("delete", location)?;
        let rules = inner.rules_mut(location);
        let mut absent = Vec::new();
        for name in names {
            match position(rules, name.as_str()) {
                Some(idx) => {
                    rules.remove(idx);
                }
                None => absent.push(name.as_str()),
            }
        }
        match absent.first() {
            None => Ok(()),
            Some(first) => Err(not_found("delete", location, first)
                .with_message(format!("rules not found: {}", absent.join(", ")))),
        }
    }

    fn move_rule(
        &self,
        location: &Location,
        name: &RuleName,
        placement: &Placement,
    ) -> ClientResult<()> {
        let mut inner = self.lock();
        inner.begin_mutation("move", location)?;
        let rules = inner.rules_mut(location);
        let idx = position(rules, name.as_str())
            .ok_or_else(|| not_found("move", location, name.as_str()))?;
        if let Some(pivot) = placement.pivot() {
            if pivot == name {
                return Err(ExError::new(ExErrorKind::RemoteRejected)
                    .with_op("move")
                    .with_location(location.key())
                    .with_rule_name(name.as_str())
                    .with_message("cannot move a rule relative to itself"));
            }
            if position(rules, pivot.as_str()).is_none() {
                return Err(not_found("move", location, pivot.as_str()));
            }
        }

        let rule = rules.remove(idx);
        let target = match placement {
            Placement::First => 0,
            Placement::Last => rules.len(),
            Placement::Before(pivot) => position(rules, pivot.as_str()).unwrap_or(rules.len()),
            Placement::After(pivot) => {
                position(rules, pivot.as_str()).map_or(rules.len(), |p| p + 1)
            }
        };
        rules.insert(target, rule);
        Ok(())
    }
}
