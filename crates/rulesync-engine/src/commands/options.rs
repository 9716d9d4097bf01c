//! Reconcile inputs

use rulesync_core::model::{Location, ManagedSet, RuleName};
use rulesync_core::position::PositionDirective;
use rulesync_core_types::correlation::RequestContext;
use serde::{Deserialize, Serialize};

/// Per-pass switches
///
/// ```
/// use rulesync_engine::ReconcileOptions;
///
/// let options: ReconcileOptions = serde_json::from_str(r#"{ "verify": true }"#).unwrap();
/// assert!(options.verify);
/// assert!(!options.dry_run);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileOptions {
    /// Plan only; no mutating remote call is made
    pub dry_run: bool,
    /// Re-read after apply and fail unless the managed block sits at its anchor in desired order
    pub verify: bool,
}

impl ReconcileOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            verify: false,
        }
    }

    pub fn verified() -> Self {
        Self {
            dry_run: false,
            verify: true,
        }
    }
}

/// Everything one pass needs
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub location: Location,
    pub desired: ManagedSet,
    pub previously_managed: Vec<RuleName>,
    pub position: PositionDirective,
    pub context: RequestContext,
}

impl ReconcileRequest {
    /// Request with a fresh [`RequestContext`]
    pub fn new(
        location: Location,
        desired: ManagedSet,
        previously_managed: Vec<RuleName>,
        position: PositionDirective,
    ) -> Self {
        Self {
            location,
            desired,
            previously_managed,
            position,
            context: RequestContext::new(),
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}
