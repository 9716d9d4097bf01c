#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Lifecycle logging emitted by the engine

mod common;

use common::{desired, location, store_with};
use rulesync_core::logging_facility::test_capture::init_test_capture;
use rulesync_core::PositionDirective;
use rulesync_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_OPS_TOTAL, FIELD_REQUEST_ID,
};
use rulesync_engine::{ReconcileOptions, ReconcileRequest, Reconciler};

fn events_for(
    capture: &rulesync_core::logging_facility::test_capture::TestCapture,
    request_id: &str,
) -> Vec<rulesync_core::logging_facility::test_capture::CapturedEvent> {
    capture
        .events()
        .into_iter()
        .filter(|e| e.field(FIELD_REQUEST_ID) == Some(request_id))
        .collect()
}

#[test]
fn test_successful_pass_logs_start_and_end() {
    // GIVEN log capture and a reconcilable location
    let capture = init_test_capture();
    let store = store_with(&["x"]);
    let reconciler = Reconciler::new(&store);
    let request = ReconcileRequest::new(location(), desired(&["a"]), vec![], PositionDirective::First);

    // WHEN the pass succeeds
    let outcome = reconciler
        .execute(&request, &ReconcileOptions::default())
        .unwrap();

    // THEN one start and one end event carry the request id
    let events = events_for(&capture, request.context.request_id.as_str());
    let start = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_START))
        .expect("start event");
    assert_eq!(start.op.as_deref(), Some("reconcile"));
    assert_eq!(start.field("location"), Some("vsys1/local/security"));
    let end = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END))
        .expect("end event");
    assert_eq!(
        end.field(FIELD_OPS_TOTAL),
        Some(outcome.ops.len().to_string().as_str())
    );
    assert!(end.field("duration_ms").is_some());
}

#[test]
fn test_failed_pass_logs_error_code() {
    let capture = init_test_capture();
    let store = store_with(&["x"]);
    let reconciler = Reconciler::new(&store);
    let request = ReconcileRequest::new(
        location(),
        desired(&["a"]),
        vec![],
        PositionDirective::before(rulesync_core::RuleName::new("nope").unwrap(), false),
    );

    reconciler
        .execute(&request, &ReconcileOptions::default())
        .unwrap_err();

    let events = events_for(&capture, request.context.request_id.as_str());
    let error = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("error event");
    assert_eq!(error.field(FIELD_ERR_CODE), Some("ERR_PIVOT_NOT_FOUND"));
    assert_eq!(error.level, tracing::Level::ERROR);
}

#[test]
fn test_plan_logs_under_its_own_op() {
    let capture = init_test_capture();
    let store = store_with(&["x"]);
    let reconciler = Reconciler::new(&store);
    let request = ReconcileRequest::new(location(), desired(&["a"]), vec![], PositionDirective::Last);

    reconciler.plan(&request).unwrap();

    let events = events_for(&capture, request.context.request_id.as_str());
    assert!(events
        .iter()
        .all(|e| e.op.as_deref() == Some("reconcile_plan")));
    assert_eq!(events.len(), 2);
}
