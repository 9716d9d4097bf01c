#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Read → Diff → Resolve → Plan → Apply, driven by hand against the
//! in-memory store.

mod common;

use common::{body_for, desired, location, name, names, store_with};
use rulesync_core::{
    apply, compute_diff, plan, read_snapshot, resolve, ExactBodyEquality, InMemoryRuleStore,
    ManagedSet, PositionDirective, RemoteOp, Result, Rule, RuleName, RuleSyncError,
};
use serde_json::json;

fn run_pass(
    store: &InMemoryRuleStore,
    want: &ManagedSet,
    previously: &[RuleName],
    directive: &PositionDirective,
) -> Result<Vec<RemoteOp>> {
    let snapshot = read_snapshot(store, &location())?;
    let change_set = compute_diff(want, previously, &snapshot, &ExactBodyEquality)?;
    let anchor = resolve(directive, &snapshot)?;
    let ops = plan(want, &change_set, &anchor, &snapshot)?;
    apply(store, &location(), &ops)?;
    Ok(ops)
}

#[test]
fn test_reorder_managed_block_to_end() {
    // GIVEN remote [f1, a, b, f2] where a and b were managed
    let store = store_with(&["f1", "a", "b", "f2"]);

    // WHEN reconciling desired [b, a] at Last
    let ops = run_pass(
        &store,
        &desired(&["b", "a"]),
        &names(&["a", "b"]),
        &PositionDirective::Last,
    )
    .unwrap();

    // THEN the block ends up last in desired order with exactly two moves
    assert_eq!(store.names(&location()), vec!["f1", "f2", "b", "a"]);
    assert_eq!(ops.iter().filter(|op| op.is_move()).count(), 2);
    assert_eq!(ops.len(), 2);
}

#[test]
fn test_new_rules_directly_before_pivot() {
    // GIVEN remote [x, y, z]
    let store = store_with(&["x", "y", "z"]);

    // WHEN creating [m1, m2] directly before y
    run_pass(
        &store,
        &desired(&["m1", "m2"]),
        &[],
        &PositionDirective::before(name("y"), true),
    )
    .unwrap();

    // THEN the new rules sit between x and y
    assert_eq!(store.names(&location()), vec!["x", "m1", "m2", "y", "z"]);
}

#[test]
fn test_drift_deleted_rule_is_tolerated() {
    // GIVEN remote [a, b, c] all managed, and b deleted out-of-band
    let store = store_with(&["a", "b", "c"]);
    assert!(store.remove_out_of_band(&location(), "b"));

    // WHEN reconciling to an empty desired list
    let ops = run_pass(
        &store,
        &ManagedSet::default(),
        &names(&["a", "b", "c"]),
        &PositionDirective::Last,
    )
    .unwrap();

    // THEN only a and c are deleted and nothing fails
    assert_eq!(
        ops,
        vec![RemoteOp::Delete {
            names: names(&["a", "c"])
        }]
    );
    assert!(store.names(&location()).is_empty());
}

#[test]
fn test_drift_between_read_and_apply_delete() {
    // GIVEN a planned delete of a and c
    let store = store_with(&["a", "c", "f"]);
    let snapshot = read_snapshot(&store, &location()).unwrap();
    let want = ManagedSet::default();
    let previously = names(&["a", "c"]);
    let cs = compute_diff(&want, &previously, &snapshot, &ExactBodyEquality).unwrap();
    let anchor = resolve(&PositionDirective::Last, &snapshot).unwrap();
    let ops = plan(&want, &cs, &anchor, &snapshot).unwrap();

    // WHEN c vanishes after the read
    store.remove_out_of_band(&location(), "c");
    let report = apply(&store, &location(), &ops).unwrap();

    // THEN the delete still succeeds
    assert_eq!(report.applied, 1);
    assert_eq!(store.names(&location()), vec!["f"]);
}

#[test]
fn test_update_changes_body_without_moving() {
    // GIVEN remote [f, a, b] with a's body stale
    let store = store_with(&["f", "a", "b"]);
    let changed = json!({"description": "rule a", "action": "deny"});
    let want: ManagedSet = vec![
        Rule::new(name("a"), changed.clone().into()),
        Rule::new(name("b"), body_for("b")),
    ]
    .into_iter()
    .collect();

    // WHEN reconciling after f, not necessarily adjacent
    let ops = run_pass(
        &store,
        &want,
        &names(&["a", "b"]),
        &PositionDirective::after(name("f"), false),
    )
    .unwrap();

    // THEN a single update is issued
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].op_name(), "update");
    let rules = store.rules(&location());
    assert_eq!(rules[1].body.as_value(), &changed);
}

#[test]
fn test_second_pass_is_noop() {
    // GIVEN a converged location
    let store = store_with(&["f1", "f2"]);
    let want = desired(&["c", "a", "b"]);
    let directive = PositionDirective::after(name("f1"), true);
    run_pass(&store, &want, &[], &directive).unwrap();
    let mutations = store.mutation_count();

    // WHEN the same pass runs again
    let ops = run_pass(&store, &want, &names(&["c", "a", "b"]), &directive).unwrap();

    // THEN nothing is planned or sent
    assert!(ops.is_empty());
    assert_eq!(store.mutation_count(), mutations);
    assert_eq!(store.names(&location()), vec!["f1", "c", "a", "b", "f2"]);
}

#[test]
fn test_missing_pivot_stops_before_mutation() {
    // GIVEN a remote without the pivot
    let store = store_with(&["x"]);

    // WHEN positioning before a missing rule
    let err = run_pass(
        &store,
        &desired(&["m"]),
        &[],
        &PositionDirective::before(name("nope"), false),
    )
    .unwrap_err();

    // THEN PivotNotFound and no mutation
    assert_eq!(
        err,
        RuleSyncError::PivotNotFound {
            pivot: "nope".to_string()
        }
    );
    assert_eq!(store.mutation_count(), 0);
}
