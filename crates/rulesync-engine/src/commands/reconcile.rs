//! Reconciliation pass orchestration.
//!
//! ## Pipeline (in order):
//! 1. Pre-flight: duplicate desired names, pivot inside the desired set
//!    (no remote call is made if either fails)
//! 2. Read the remote snapshot
//! 3. Diff against desired and previously managed names
//! 4. Resolve the position directive to an anchor
//! 5. Plan deletes, creates, updates and moves
//! 6. dry_run short-circuit (no mutating call)
//! 7. Apply in order, stopping at the first failure
//! 8. Optional verification re-read: order, contiguity and anchor

#![allow(clippy::result_large_err)]

use crate::commands::options::{ReconcileOptions, ReconcileRequest};
use rulesync_core::apply::apply;
use rulesync_core::client::RuleStoreClient;
use rulesync_core::diff::{compute_diff, render_human_summary, ChangeSet};
use rulesync_core::errors::{ExError, RuleSyncError};
use rulesync_core::model::{Location, ManagedSet, RuleName};
use rulesync_core::planner::{block_in_place, plan, project, RemoteOp};
use rulesync_core::policy::{BodyEquality, ExactBodyEquality};
use rulesync_core::position::{resolve, PositionDirective};
use rulesync_core::reader::read_snapshot;
use rulesync_core::{log_op_end, log_op_error, log_op_start};
use rulesync_core_types::correlation::{RequestContext, RequestId};
use rulesync_store::errors::Result;
use serde::Serialize;

/// Result of one pass
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub location: Location,
    pub request_id: RequestId,
    pub change_set: ChangeSet,
    pub ops: Vec<RemoteOp>,
    /// Remote order expected once every op has been applied
    pub projected_order: Vec<RuleName>,
    /// Ops applied; 0 in dry-run
    pub applied: usize,
    pub dry_run: bool,
    pub verified: bool,
}

impl ReconcileOutcome {
    /// The remote already matched
    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn move_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_move()).count()
    }

    /// Reviewable plain-text rendering of the plan
    pub fn summary(&self) -> String {
        render_human_summary(&self.location, &self.change_set, &self.ops)
    }
}

/// Converges one location at a time to a desired ordered rule list
///
/// The client is injected and never shared through global state. A
/// `Reconciler` holds no per-pass state, so distinct locations can be
/// reconciled from several threads at once.
pub struct Reconciler<C> {
    client: C,
    equality: Box<dyn BodyEquality>,
}

impl<C: RuleStoreClient> Reconciler<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            equality: Box::new(ExactBodyEquality),
        }
    }

    /// Replace the body comparison used to decide updates
    pub fn with_equality(mut self, equality: impl BodyEquality + 'static) -> Self {
        self.equality = Box::new(equality);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    /// Converge `location` and return the number of applied operations
    ///
    /// # Errors
    ///
    /// - `DuplicateName`, `PivotIsManaged`: pre-flight, nothing was called
    /// - `PivotNotFound`, `PivotScheduledForDeletion`: after the read,
    ///   nothing was mutated
    /// - the remote error itself when the first operation fails
    /// - `PartialApplication` with the applied count when a later one fails
    pub fn reconcile(
        &self,
        location: &Location,
        desired: &ManagedSet,
        previously_managed: &[RuleName],
        position: &PositionDirective,
    ) -> Result<usize> {
        let request = ReconcileRequest::new(
            location.clone(),
            desired.clone(),
            previously_managed.to_vec(),
            position.clone(),
        );
        self.execute(&request, &ReconcileOptions::default())
            .map(|outcome| outcome.applied)
    }

    /// Compute the plan for `request` without mutating the remote
    ///
    /// # Errors
    ///
    /// Every pre-apply error of [`Reconciler::reconcile`].
    pub fn plan(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome> {
        let ctx = &request.context;
        log_op_start!(
            "reconcile_plan",
            location = %request.location,
            request_id = %ctx.request_id,
            desired_len = request.desired.len()
        );
        let start = std::time::Instant::now();

        let outcome = self
            .run(request, &ReconcileOptions::dry_run())
            .map_err(|e| {
                log_op_error!(
                    "reconcile_plan",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %ctx.request_id
                );
                e
            })?;

        log_op_end!(
            "reconcile_plan",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %ctx.request_id,
            ops_total = outcome.ops.len()
        );
        Ok(outcome)
    }

    /// Run one pass with explicit options
    ///
    /// # Errors
    ///
    /// As [`Reconciler::reconcile`], plus `ConvergenceFailed` when
    /// `options.verify` finds the managed block out of order, split up or
    /// away from its anchor. That error carries the applied and total op
    /// counts.
    pub fn execute(
        &self,
        request: &ReconcileRequest,
        options: &ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let ctx = &request.context;
        log_op_start!(
            "reconcile",
            location = %request.location,
            request_id = %ctx.request_id,
            desired_len = request.desired.len(),
            dry_run = options.dry_run
        );
        let start = std::time::Instant::now();

        let outcome = self.run(request, options).map_err(|e| {
            log_op_error!(
                "reconcile",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = %ctx.request_id,
                ops_applied = e.applied().unwrap_or(0)
            );
            e
        })?;

        log_op_end!(
            "reconcile",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %ctx.request_id,
            ops_total = outcome.ops.len(),
            ops_applied = outcome.applied
        );
        Ok(outcome)
    }

    /// The unlogged pass, errors carrying location and correlation ids
    pub(crate) fn run(
        &self,
        request: &ReconcileRequest,
        options: &ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        self.run_pass(request, options)
            .map_err(|e| with_context(e, &request.location, &request.context))
    }

    fn run_pass(
        &self,
        request: &ReconcileRequest,
        options: &ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let location = &request.location;

        request.desired.validate()?;
        if let Some(pivot) = request.position.pivot() {
            if request.desired.contains(pivot.as_str()) {
                return Err(RuleSyncError::PivotIsManaged {
                    pivot: pivot.to_string(),
                }
                .into());
            }
        }

        let snapshot = read_snapshot(&self.client, location)?;
        let change_set = compute_diff(
            &request.desired,
            &request.previously_managed,
            &snapshot,
            self.equality.as_ref(),
        )?;
        let anchor = resolve(&request.position, &snapshot)?;
        let ops = plan(&request.desired, &change_set, &anchor, &snapshot)?;
        let projected_order = project(&snapshot, &ops)?;

        let mut outcome = ReconcileOutcome {
            location: location.clone(),
            request_id: request.context.request_id.clone(),
            change_set,
            ops,
            projected_order,
            applied: 0,
            dry_run: options.dry_run,
            verified: false,
        };
        if options.dry_run {
            return Ok(outcome);
        }

        outcome.applied = apply(&self.client, location, &outcome.ops)?.applied;

        if options.verify {
            self.verify(location, &request.desired, &request.position)
                .map_err(|e| ExError::from(e).with_applied(outcome.applied, outcome.ops.len()))?;
            outcome.verified = true;
        }
        Ok(outcome)
    }

    /// Re-read the remote and check the managed block is contiguous, in
    /// desired order and at the directive's anchor
    fn verify(
        &self,
        location: &Location,
        desired: &ManagedSet,
        position: &PositionDirective,
    ) -> std::result::Result<(), RuleSyncError> {
        let snapshot = read_snapshot(&self.client, location)?;
        let anchor = resolve(position, &snapshot)?;
        if !block_in_place(&snapshot, desired, &anchor)? {
            return Err(RuleSyncError::ConvergenceFailed {
                expected: desired.names().iter().map(ToString::to_string).collect(),
                actual: snapshot.names().iter().map(ToString::to_string).collect(),
            });
        }
        Ok(())
    }
}

pub(crate) fn with_context(
    err: impl Into<ExError>,
    location: &Location,
    ctx: &RequestContext,
) -> ExError {
    let err = err
        .into()
        .with_location(location.key())
        .with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesync_core::client::{InMemoryRuleStore, RecordingClient};
    use rulesync_core::errors::ExErrorKind;
    use rulesync_core::model::{Rule, RuleBody, RuleKind, RuleSummary, Rulebase};
    use rulesync_core::policy::IgnoreKeysEquality;
    use serde_json::json;

    fn loc() -> Location {
        Location::new("vsys1", Rulebase::Local, RuleKind::Security).unwrap()
    }

    fn n(s: &str) -> RuleName {
        RuleName::new(s).unwrap()
    }

    fn rule(name: &str, body: serde_json::Value) -> Rule {
        Rule::new(n(name), RuleBody::new(body))
    }

    #[test]
    fn test_pivot_in_desired_set_is_rejected_before_any_call() {
        let reconciler = Reconciler::new(RecordingClient::new(InMemoryRuleStore::new()));
        let desired: ManagedSet = vec![rule("a", json!({}))].into_iter().collect();

        let err = reconciler
            .reconcile(&loc(), &desired, &[], &PositionDirective::after(n("a"), false))
            .unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::InvalidPosition);
        assert_eq!(reconciler.client().call_count(), 0);
    }

    #[test]
    fn test_errors_carry_location_and_request_id() {
        let store = InMemoryRuleStore::new();
        let reconciler = Reconciler::new(&store);
        let desired: ManagedSet = vec![rule("a", json!({}))].into_iter().collect();
        let request = ReconcileRequest::new(
            loc(),
            desired,
            vec![],
            PositionDirective::before(n("missing"), true),
        );

        let err = reconciler
            .execute(&request, &ReconcileOptions::default())
            .unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::PivotNotFound);
        assert_eq!(err.location(), Some("vsys1/local/security"));
        assert_eq!(err.request_id(), Some(&request.context.request_id));
    }

    #[test]
    fn test_injected_equality_suppresses_updates() {
        let store = InMemoryRuleStore::new().with_rules(
            &loc(),
            vec![RuleSummary::new(
                n("a"),
                RuleBody::new(json!({ "action": "allow", "uuid": "remote-1" })),
            )],
        );
        let reconciler = Reconciler::new(&store).with_equality(IgnoreKeysEquality::new(["uuid"]));
        let desired: ManagedSet = vec![rule("a", json!({ "action": "allow" }))]
            .into_iter()
            .collect();

        let applied = reconciler
            .reconcile(&loc(), &desired, &[], &PositionDirective::First)
            .unwrap();

        assert_eq!(applied, 0);
    }

    #[test]
    fn test_dry_run_reports_plan_and_leaves_remote_untouched() {
        let store = InMemoryRuleStore::new().with_rules(
            &loc(),
            vec![RuleSummary::new(n("x"), RuleBody::default())],
        );
        let reconciler = Reconciler::new(RecordingClient::new(&store));
        let desired: ManagedSet = vec![rule("a", json!({}))].into_iter().collect();
        let request = ReconcileRequest::new(loc(), desired, vec![], PositionDirective::First);

        let outcome = reconciler.plan(&request).unwrap();

        assert!(outcome.dry_run);
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.projected_order, vec![n("a"), n("x")]);
        assert_eq!(reconciler.client().mutation_count(), 0);
        assert_eq!(store.names(&loc()), vec!["x"]);
        assert!(outcome.summary().contains("Create"));
    }
}
