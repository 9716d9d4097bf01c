#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end reconciliation scenarios through the `Reconciler`

mod common;

use common::{body_for, desired, location, name, names, store_with, IgnoresMoves};
use rulesync_core::client::RecordingClient;
use rulesync_core::{ExErrorKind, PositionDirective, Rule, RuleBody};
use rulesync_core_types::correlation::{RequestContext, RequestId, TraceId};
use rulesync_engine::{ReconcileOptions, ReconcileRequest, Reconciler};
use serde_json::json;

#[test]
fn test_reorder_to_end_uses_two_moves() {
    // GIVEN remote [f1, a, b, f2] with a, b managed
    let store = store_with(&["f1", "a", "b", "f2"]);
    let reconciler = Reconciler::new(&store);

    // WHEN desired is [b, a] at Last
    let applied = reconciler
        .reconcile(
            &location(),
            &desired(&["b", "a"]),
            &names(&["a", "b"]),
            &PositionDirective::Last,
        )
        .unwrap();

    // THEN the order is [f1, f2, b, a] after exactly two operations
    assert_eq!(applied, 2);
    assert_eq!(store.names(&location()), vec!["f1", "f2", "b", "a"]);
}

#[test]
fn test_directly_before_pivot() {
    // GIVEN remote [x, y, z]
    let store = store_with(&["x", "y", "z"]);
    let reconciler = Reconciler::new(&store);

    // WHEN [m1, m2] is desired directly before y
    reconciler
        .reconcile(
            &location(),
            &desired(&["m1", "m2"]),
            &[],
            &PositionDirective::before(name("y"), true),
        )
        .unwrap();

    // THEN the new block sits between x and y
    assert_eq!(store.names(&location()), vec!["x", "m1", "m2", "y", "z"]);
}

#[test]
fn test_second_pass_is_idempotent() {
    // GIVEN a location converged by a first pass
    let store = store_with(&["f1", "a", "f2", "b"]);
    let reconciler = Reconciler::new(RecordingClient::new(&store));
    let want = desired(&["b", "c", "a"]);
    let directive = PositionDirective::after(name("f1"), true);
    reconciler
        .reconcile(&location(), &want, &names(&["a", "b"]), &directive)
        .unwrap();
    reconciler.client().clear();

    // WHEN the same inputs are reconciled again
    let applied = reconciler
        .reconcile(&location(), &want, &names(&["a", "b", "c"]), &directive)
        .unwrap();

    // THEN nothing is issued beyond the List
    assert_eq!(applied, 0);
    assert_eq!(reconciler.client().mutation_count(), 0);
    assert_eq!(store.names(&location()), vec!["f1", "b", "c", "a", "f2"]);
}

#[test]
fn test_duplicate_desired_name_makes_no_remote_call() {
    // GIVEN a desired list naming a twice
    let store = store_with(&["x"]);
    let reconciler = Reconciler::new(RecordingClient::new(&store));
    let want = vec![
        Rule::new(name("a"), body_for("a")),
        Rule::new(name("a"), body_for("a")),
    ]
    .into_iter()
    .collect();

    // WHEN reconciling
    let err = reconciler
        .reconcile(&location(), &want, &[], &PositionDirective::First)
        .unwrap_err();

    // THEN DuplicateName is reported and the client was never called
    assert_eq!(err.kind(), ExErrorKind::DuplicateName);
    assert_eq!(reconciler.client().call_count(), 0);
}

#[test]
fn test_drift_deleted_rule_is_not_an_error() {
    // GIVEN [a, b, c] all managed and b removed out-of-band
    let store = store_with(&["a", "b", "c"]);
    assert!(store.remove_out_of_band(&location(), "b"));
    let reconciler = Reconciler::new(RecordingClient::new(&store));

    // WHEN reconciling to nothing
    let outcome = reconciler
        .execute(
            &ReconcileRequest::new(
                location(),
                desired(&[]),
                names(&["a", "b", "c"]),
                PositionDirective::Last,
            ),
            &ReconcileOptions::default(),
        )
        .unwrap();

    // THEN only a and c are deleted
    assert_eq!(outcome.change_set.to_delete, names(&["a", "c"]));
    assert_eq!(outcome.change_set.already_absent, names(&["b"]));
    assert_eq!(reconciler.client().mutation_count(), 1);
    assert!(store.names(&location()).is_empty());
}

#[test]
fn test_foreign_rules_keep_relative_order() {
    // GIVEN foreign rules interleaved with managed ones
    let store = store_with(&["f1", "a", "f2", "f3", "b", "f4"]);
    let reconciler = Reconciler::new(&store);

    // WHEN the managed block is rebuilt at First
    reconciler
        .reconcile(
            &location(),
            &desired(&["b", "n", "a"]),
            &names(&["a", "b"]),
            &PositionDirective::First,
        )
        .unwrap();

    // THEN foreign rules keep their order after the block
    assert_eq!(
        store.names(&location()),
        vec!["b", "n", "a", "f1", "f2", "f3", "f4"]
    );
}

#[test]
fn test_changed_body_is_updated_in_place() {
    let store = store_with(&["a", "b"]);
    let reconciler = Reconciler::new(RecordingClient::new(&store));
    let want = vec![
        Rule::new(name("a"), RuleBody::new(json!({ "action": "deny" }))),
        Rule::new(name("b"), body_for("b")),
    ]
    .into_iter()
    .collect();

    let applied = reconciler
        .reconcile(&location(), &want, &names(&["a", "b"]), &PositionDirective::First)
        .unwrap();

    assert_eq!(applied, 1);
    assert_eq!(reconciler.client().move_count(), 0);
    assert_eq!(store.rules(&location())[0].body, RuleBody::new(json!({ "action": "deny" })));
}

#[test]
fn test_missing_pivot_fails_without_mutation() {
    let store = store_with(&["x"]);
    let reconciler = Reconciler::new(RecordingClient::new(&store));

    let err = reconciler
        .reconcile(
            &location(),
            &desired(&["a"]),
            &[],
            &PositionDirective::after(name("ghost"), false),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::PivotNotFound);
    assert_eq!(reconciler.client().mutation_count(), 0);
}

#[test]
fn test_pivot_scheduled_for_deletion_is_rejected() {
    let store = store_with(&["x", "old"]);
    let reconciler = Reconciler::new(RecordingClient::new(&store));

    let err = reconciler
        .reconcile(
            &location(),
            &desired(&["a"]),
            &names(&["old"]),
            &PositionDirective::before(name("old"), true),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidPosition);
    assert_eq!(reconciler.client().mutation_count(), 0);
}

#[test]
fn test_remote_unavailable_is_surfaced_unchanged() {
    let store = store_with(&["x"]);
    store.set_unavailable(true);
    let reconciler = Reconciler::new(&store);

    let err = reconciler
        .reconcile(&location(), &desired(&["a"]), &[], &PositionDirective::Last)
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::RemoteUnavailable);
    assert_eq!(err.code(), "ERR_REMOTE_UNAVAILABLE");
}

#[test]
fn test_first_operation_failure_is_not_partial() {
    // GIVEN the very first mutating call will be rejected
    let store = store_with(&["x"]);
    store.fail_mutation(1, ExErrorKind::RemoteRejected);
    let reconciler = Reconciler::new(&store);

    // WHEN reconciling
    let err = reconciler
        .reconcile(&location(), &desired(&["a"]), &[], &PositionDirective::Last)
        .unwrap_err();

    // THEN the remote classification is surfaced, not PartialApplication
    assert_eq!(err.kind(), ExErrorKind::RemoteRejected);
}

#[test]
fn test_partial_application_carries_applied_count() {
    // GIVEN the second mutating call will fail
    let store = store_with(&["x"]);
    store.fail_mutation(2, ExErrorKind::RemoteUnavailable);
    let reconciler = Reconciler::new(&store);

    // WHEN two creates are needed
    let err = reconciler
        .reconcile(&location(), &desired(&["a", "b"]), &[], &PositionDirective::Last)
        .unwrap_err();

    // THEN one op is reported applied and the cause is kept
    assert_eq!(err.kind(), ExErrorKind::PartialApplication);
    assert_eq!(err.applied(), Some(1));
    assert!(err.total().unwrap() >= 2);
    assert_eq!(
        err.source_error().map(|e| e.kind()),
        Some(ExErrorKind::RemoteUnavailable)
    );
    assert_eq!(err.location(), Some("vsys1/local/security"));
}

#[test]
fn test_request_context_is_attached_to_errors() {
    let store = store_with(&[]);
    store.set_unavailable(true);
    let reconciler = Reconciler::new(&store);
    let trace = TraceId::from("trace-7");
    let request = ReconcileRequest::new(location(), desired(&["a"]), vec![], PositionDirective::Last)
        .with_context(
            RequestContext::for_request(RequestId::from("req-7"))
                .with_trace_id(trace.clone()),
        );

    let err = reconciler
        .execute(&request, &ReconcileOptions::default())
        .unwrap_err();

    assert_eq!(err.request_id().map(|r| r.as_str()), Some("req-7"));
    assert_eq!(err.trace_id(), Some(&trace));
}

#[test]
fn test_verify_detects_non_convergence() {
    // GIVEN a store that silently drops moves
    let reconciler = Reconciler::new(IgnoresMoves(store_with(&["a", "b"])));
    let request = ReconcileRequest::new(
        location(),
        desired(&["b", "a"]),
        names(&["a", "b"]),
        PositionDirective::First,
    );

    // WHEN reconciling with verification
    let err = reconciler
        .execute(&request, &ReconcileOptions::verified())
        .unwrap_err();

    // THEN the re-read exposes the unconverged order
    assert_eq!(err.kind(), ExErrorKind::ConvergenceFailed);
    assert!(err.message().contains("\"b\", \"a\""));
}

#[test]
fn test_verify_rejects_block_in_order_but_away_from_anchor() {
    // GIVEN a store that drops moves, so created rules stay appended
    let reconciler = Reconciler::new(IgnoresMoves(store_with(&["f"])));
    let request = ReconcileRequest::new(
        location(),
        desired(&["a", "b"]),
        vec![],
        PositionDirective::First,
    );

    // WHEN the block is wanted first and verified
    let err = reconciler
        .execute(&request, &ReconcileOptions::verified())
        .unwrap_err();

    // THEN [f, a, b] fails verification although a, b are in order
    assert_eq!(err.kind(), ExErrorKind::ConvergenceFailed);
    assert!(err.message().contains("[\"f\", \"a\", \"b\"]"));
    assert_eq!(err.applied(), err.total());
    assert!(err.applied().unwrap_or(0) > 0);
    assert_eq!(reconciler.client().0.names(&location()), vec!["f", "a", "b"]);
}

#[test]
fn test_verify_rejects_split_block() {
    // GIVEN a foreign rule sitting between the two managed rules
    let reconciler = Reconciler::new(IgnoresMoves(store_with(&["a", "f", "b"])));
    let request = ReconcileRequest::new(
        location(),
        desired(&["a", "b"]),
        names(&["a", "b"]),
        PositionDirective::First,
    );

    // WHEN the pass is verified
    let err = reconciler
        .execute(&request, &ReconcileOptions::verified())
        .unwrap_err();

    // THEN the gap is reported
    assert_eq!(err.kind(), ExErrorKind::ConvergenceFailed);
}

#[test]
fn test_verify_passes_after_convergence() {
    let store = store_with(&["f", "a", "b"]);
    let reconciler = Reconciler::new(&store);
    let request = ReconcileRequest::new(
        location(),
        desired(&["b", "a"]),
        names(&["a", "b"]),
        PositionDirective::First,
    );

    let outcome = reconciler
        .execute(&request, &ReconcileOptions::verified())
        .unwrap();

    assert!(outcome.verified);
    assert_eq!(outcome.applied, outcome.ops.len());
    assert_eq!(
        outcome.projected_order,
        names(&["b", "a", "f"])
    );
    assert_eq!(store.names(&location()), vec!["b", "a", "f"]);
}

#[test]
fn test_outcome_serializes_for_review() {
    let store = store_with(&["x"]);
    let reconciler = Reconciler::new(&store);
    let request = ReconcileRequest::new(location(), desired(&["a"]), vec![], PositionDirective::First);

    let outcome = reconciler.plan(&request).unwrap();
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["dry_run"], json!(true));
    assert_eq!(value["ops"][0]["op"], json!("create"));
    assert_eq!(outcome.move_count(), 1);
}
