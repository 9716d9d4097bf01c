//! Client wrapper that records every call it forwards

use super::{ClientResult, Placement, RuleStoreClient};
use crate::model::{Location, Rule, RuleName, RuleSummary};
use std::sync::Mutex;

/// One call observed by [`RecordingClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    List {
        location: Location,
    },
    Create {
        location: Location,
        name: RuleName,
    },
    Update {
        location: Location,
        name: RuleName,
    },
    Delete {
        location: Location,
        names: Vec<RuleName>,
    },
    Move {
        location: Location,
        name: RuleName,
        placement: Placement,
    },
}

impl RecordedCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RecordedCall::List { .. })
    }

    pub fn location(&self) -> &Location {
        match self {
            RecordedCall::List { location }
            | RecordedCall::Create { location, .. }
            | RecordedCall::Update { location, .. }
            | RecordedCall::Delete { location, .. }
            | RecordedCall::Move { location, .. } => location,
        }
    }
}

/// Forwards to an inner client and keeps a log of every call, successful or not
#[derive(Debug)]
pub struct RecordingClient<C> {
    inner: C,
    calls: Mutex<Vec<RecordedCall>>,
}

impl<C> RecordingClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_mutation()).count()
    }

    pub fn move_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RecordedCall::Move { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().map(|mut c| c.clear()).ok();
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().map(|mut c| c.push(call)).ok();
    }
}

impl<C: RuleStoreClient> RuleStoreClient for RecordingClient<C> {
    fn list(&self, location: &Location) -> ClientResult<Vec<RuleSummary>> {
        self.record(RecordedCall::List {
            location: location.clone(),
        });
        self.inner.list(location)
    }

    fn create(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        self.record(RecordedCall::Create {
            location: location.clone(),
            name: rule.name.clone(),
        });
        self.inner.create(location, rule)
    }

    fn update(&self, location: &Location, rule: &Rule) -> ClientResult<()> {
        self.record(RecordedCall::Update {
            location: location.clone(),
            name: rule.name.clone(),
        });
        self.inner.update(location, rule)
    }

    fn delete(&self, location: &Location, names: &[RuleName]) -> ClientResult<()> {
        self.record(RecordedCall::Delete {
            location: location.clone(),
            names: names.to_vec(),
        });
        self.inner.delete(location, names)
    }

    fn move_rule(
        &self,
        location: &Location,
        name: &RuleName,
        placement: &Placement,
    ) -> ClientResult<()> {
        self.record(RecordedCall::Move {
            location: location.clone(),
            name: name.clone(),
            placement: placement.clone(),
        });
        self.inner.move_rule(location, name, placement)
    }
}
