//! Plain-text rendering of a planned pass, for dry-run review

use crate::diff::model::ChangeSet;
use crate::model::{Location, RuleName};
use crate::planner::RemoteOp;

fn joined(names: &[RuleName]) -> String {
    names
        .iter()
        .map(RuleName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn section(out: &mut String, label: &str, names: &[RuleName]) {
    if !names.is_empty() {
        out.push_str(&format!("- **{}** ({}): {}\n", label, names.len(), joined(names)));
    }
}

/// Render the change-set and its planned operations.
///
/// Output is deterministic for identical inputs. It is informational only.
pub fn render_human_summary(location: &Location, change_set: &ChangeSet, ops: &[RemoteOp]) -> String {
    let mut out = String::new();
    out.push_str(&format!("## Reconcile plan: {}\n\n", location));

    if ops.is_empty() {
        out.push_str("_No changes: remote already matches the desired state._\n");
        if !change_set.already_absent.is_empty() {
            out.push('\n');
            section(&mut out, "Already absent", &change_set.already_absent);
        }
        return out;
    }

    section(&mut out, "Create", &change_set.to_create);
    section(&mut out, "Update", &change_set.to_update);
    section(&mut out, "Delete", &change_set.to_delete);
    section(&mut out, "Already absent", &change_set.already_absent);
    let moves = ops.iter().filter(|op| op.is_move()).count();
    if moves > 0 {
        out.push_str(&format!("- **Moves**: {}\n", moves));
    }
    out.push_str(&format!(
        "- **Desired order**: {}\n\n",
        if change_set.desired_order.is_empty() {
            "(empty)".to_string()
        } else {
            joined(&change_set.desired_order)
        }
    ));

    out.push_str(&format!("### Operations ({})\n\n", ops.len()));
    for (idx, op) in ops.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, op));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Placement;
    use crate::model::{Rule, RuleBody, RuleKind, Rulebase};

    fn n(s: &str) -> RuleName {
        RuleName::new(s).unwrap()
    }

    fn loc() -> Location {
        Location::new("vsys1", Rulebase::Local, RuleKind::Security).unwrap()
    }

    #[test]
    fn test_no_changes_message() {
        let out = render_human_summary(&loc(), &ChangeSet::default(), &[]);
        assert!(out.starts_with("## Reconcile plan: vsys1/local/security"));
        assert!(out.contains("_No changes"));
    }

    #[test]
    fn test_lists_sections_and_numbered_ops() {
        let cs = ChangeSet {
            to_create: vec![n("m1")],
            to_delete: vec![n("old")],
            desired_order: vec![n("m1"), n("a")],
            ..ChangeSet::default()
        };
        let ops = vec![
            RemoteOp::Delete {
                names: vec![n("old")],
            },
            RemoteOp::Create {
                rule: Rule::new(n("m1"), RuleBody::default()),
            },
            RemoteOp::Move {
                name: n("m1"),
                placement: Placement::Before(n("a")),
            },
        ];

        let out = render_human_summary(&loc(), &cs, &ops);

        assert!(out.contains("- **Create** (1): m1\n"));
        assert!(out.contains("- **Delete** (1): old\n"));
        assert!(!out.contains("**Update**"));
        assert!(out.contains("- **Moves**: 1\n"));
        assert!(out.contains("- **Desired order**: m1, a\n"));
        assert!(out.contains("### Operations (3)"));
        assert!(out.contains("3. move m1 before a\n"));
    }

    #[test]
    fn test_deterministic() {
        let cs = ChangeSet {
            to_update: vec![n("b"), n("a")],
            ..ChangeSet::default()
        };
        let ops = vec![RemoteOp::Update {
            rule: Rule::new(n("b"), RuleBody::default()),
        }];
        assert_eq!(
            render_human_summary(&loc(), &cs, &ops),
            render_human_summary(&loc(), &cs, &ops)
        );
    }
}
