//! Tracked reconciliation against the managed-state ledger.
//!
//! The ledger supplies the previously managed names and receives the
//! outcome:
//! - success: the desired names become the managed set
//! - an error after at least one applied op (partial application, failed
//!   verification): `previous ∪ desired`, so a later pass can still delete
//!   anything this one created
//! - an error before any mutation or a dry run: the managed set is left alone
//!
//! Every pass gets a `reconcile_runs` row.

#![allow(clippy::result_large_err)]

use crate::commands::options::{ReconcileOptions, ReconcileRequest};
use crate::commands::reconcile::{with_context, ReconcileOutcome, Reconciler};
use chrono::Utc;
use rulesync_core::client::RuleStoreClient;
use rulesync_core::errors::{ExError, ExErrorKind};
use rulesync_core::model::{Location, ManagedSet, RuleName};
use rulesync_core::position::PositionDirective;
use rulesync_core::{log_op_end, log_op_error, log_op_start};
use rulesync_core_types::correlation::RequestContext;
use rulesync_store::errors::Result;
use rulesync_store::state::{ManagedStateStore, RunRecord, RunStatus};
use std::collections::HashSet;

impl<C: RuleStoreClient> Reconciler<C> {
    /// Reconcile `location` using the ledger for previously managed names
    ///
    /// # Errors
    ///
    /// Ledger read or write failures, and every error of
    /// [`Reconciler::execute`]. A pass that failed remotely is still
    /// recorded before its error is returned.
    pub fn reconcile_tracked(
        &self,
        state: &ManagedStateStore,
        location: &Location,
        desired: &ManagedSet,
        position: &PositionDirective,
        options: &ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let ctx = RequestContext::new();
        log_op_start!(
            "reconcile_tracked",
            location = %location,
            request_id = %ctx.request_id,
            desired_len = desired.len(),
            dry_run = options.dry_run
        );
        let start = std::time::Instant::now();

        let result = self.tracked_impl(state, location, desired, position, options, ctx.clone());

        match &result {
            Ok(outcome) => {
                log_op_end!(
                    "reconcile_tracked",
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %ctx.request_id,
                    ops_total = outcome.ops.len(),
                    ops_applied = outcome.applied
                );
            }
            Err(e) => {
                log_op_error!(
                    "reconcile_tracked",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %ctx.request_id
                );
            }
        }
        result
    }

    fn tracked_impl(
        &self,
        state: &ManagedStateStore,
        location: &Location,
        desired: &ManagedSet,
        position: &PositionDirective,
        options: &ReconcileOptions,
        ctx: RequestContext,
    ) -> Result<ReconcileOutcome> {
        let started_at = Utc::now();
        let previously = state
            .load_managed(location)
            .map_err(|e| with_context(e, location, &ctx))?;

        let request = ReconcileRequest::new(
            location.clone(),
            desired.clone(),
            previously.clone(),
            position.clone(),
        )
        .with_context(ctx);

        match self.run(&request, options) {
            Ok(outcome) => {
                let total = outcome.ops.len();
                if outcome.dry_run {
                    let run = RunRecord::new(location.clone(), RunStatus::DryRun, started_at)
                        .with_counts(0, total);
                    state.record_outcome(&run, None)?;
                } else {
                    let run = RunRecord::new(location.clone(), RunStatus::Succeeded, started_at)
                        .with_counts(outcome.applied, total);
                    state.record_outcome(&run, Some(&desired.names()))?;
                }
                Ok(outcome)
            }
            Err(err) => {
                let applied = err.applied().unwrap_or(0);
                let status = if err.kind() == ExErrorKind::PartialApplication {
                    RunStatus::Partial
                } else {
                    RunStatus::Failed
                };
                let managed = (applied > 0).then(|| union(desired, &previously));
                let run = RunRecord::new(location.clone(), status, started_at)
                    .with_counts(applied, err.total().unwrap_or(0))
                    .with_error(&err);
                record_failure(state, &run, managed.as_deref(), &err);
                Err(err)
            }
        }
    }
}

/// Desired names first, then previously managed names not desired
fn union(desired: &ManagedSet, previously: &[RuleName]) -> Vec<RuleName> {
    let mut names = desired.names();
    let mut seen: HashSet<RuleName> = names.iter().cloned().collect();
    for name in previously {
        if seen.insert(name.clone()) {
            names.push(name.clone());
        }
    }
    names
}

fn record_failure(
    state: &ManagedStateStore,
    run: &RunRecord,
    managed: Option<&[RuleName]>,
    cause: &ExError,
) {
    // The pass error is what the caller needs; a ledger failure is logged only
    if let Err(e) = state.record_outcome(run, managed) {
        tracing::warn!(
            location = %run.location,
            run_id = %run.id,
            cause = cause.code(),
            err.code = e.code(),
            "failed to record reconcile outcome"
        );
    }
}
