pub mod location;
pub mod managed_set;
pub mod rule;
pub mod snapshot;

pub use location::{Location, RuleKind, Rulebase};
pub use managed_set::ManagedSet;
pub use rule::{Rule, RuleBody, RuleName, RuleSummary};
pub use snapshot::{Partition, RemoteSnapshot};
