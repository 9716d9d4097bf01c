use rulesync_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using RuleSyncError
pub type Result<T> = std::result::Result<T, RuleSyncError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure that crosses a crate boundary is classified by one of these
/// kinds. Each kind maps to a stable `ERR_*` code used in logs, tests and
/// by callers that branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,
    InvalidRuleName,
    InvalidLocation,
    DuplicateName,

    // Position
    PivotNotFound,
    InvalidPosition,

    // Remote state
    NotFound,
    AlreadyExists,
    InvalidSnapshot,

    // Remote execution
    RemoteUnavailable,
    RemoteRejected,
    PartialApplication,
    ConvergenceFailed,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    InvalidFixture,
    MigrationFailed,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidRuleName => "ERR_INVALID_RULE_NAME",
            ExErrorKind::InvalidLocation => "ERR_INVALID_LOCATION",
            ExErrorKind::DuplicateName => "ERR_DUPLICATE_NAME",
            ExErrorKind::PivotNotFound => "ERR_PIVOT_NOT_FOUND",
            ExErrorKind::InvalidPosition => "ERR_INVALID_POSITION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::InvalidSnapshot => "ERR_INVALID_SNAPSHOT",
            ExErrorKind::RemoteUnavailable => "ERR_REMOTE_UNAVAILABLE",
            ExErrorKind::RemoteRejected => "ERR_REMOTE_REJECTED",
            ExErrorKind::PartialApplication => "ERR_PARTIAL_APPLICATION",
            ExErrorKind::ConvergenceFailed => "ERR_CONVERGENCE_FAILED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::InvalidFixture => "ERR_INVALID_FIXTURE",
            ExErrorKind::MigrationFailed => "ERR_MIGRATION_FAILED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a failure of this kind happened before any remote mutation
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::InvalidRuleName
                | ExErrorKind::InvalidLocation
                | ExErrorKind::DuplicateName
                | ExErrorKind::PivotNotFound
                | ExErrorKind::InvalidPosition
                | ExErrorKind::InvalidSnapshot
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification plus enough context (location, rule name,
/// progress counters, correlation ids) to diagnose a failed pass from the
/// error value alone.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    location: Option<String>,
    rule_name: Option<String>,
    applied: Option<usize>,
    total: Option<usize>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            location: None,
            rule_name: None,
            applied: None,
            total: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add location context
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add rule name context
    pub fn with_rule_name(mut self, name: impl Into<String>) -> Self {
        self.rule_name = Some(name.into());
        self
    }

    /// Record how many planned operations were applied out of how many
    pub fn with_applied(mut self, applied: usize, total: usize) -> Self {
        self.applied = Some(applied);
        self.total = Some(total);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the error that caused this one
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn rule_name(&self) -> Option<&str> {
        self.rule_name.as_deref()
    }

    /// Operations applied before the failure, if the error came from an apply
    pub fn applied(&self) -> Option<usize> {
        self.applied
    }

    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(location) = &self.location {
            write!(f, " (location: {})", location)?;
        }
        if let Some(name) = &self.rule_name {
            write!(f, " (rule: {})", name)?;
        }
        if let (Some(applied), Some(total)) = (self.applied, self.total) {
            write!(f, " (applied: {}/{})", applied, total)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for the reconciliation core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleSyncError {
    // ===== Validation Errors =====
    /// Desired list names the same rule twice
    #[error("Duplicate rule name in desired list: {name}")]
    DuplicateName { name: String },

    /// Rule name rejected by local validation
    #[error("Invalid rule name: {reason}")]
    InvalidRuleName { reason: String },

    /// Location key could not be built or parsed
    #[error("Invalid location: {reason}")]
    InvalidLocation { reason: String },

    // ===== Position Errors =====
    /// Position pivot does not exist remotely
    #[error("Pivot rule not found: {pivot}")]
    PivotNotFound { pivot: String },

    /// Position pivot is itself one of the desired rules
    #[error("Pivot rule {pivot} is part of the managed set")]
    PivotIsManaged { pivot: String },

    /// Position pivot is about to be deleted by the same pass
    #[error("Pivot rule {pivot} is scheduled for deletion")]
    PivotScheduledForDeletion { pivot: String },

    // ===== Snapshot Errors =====
    /// List returned the same name twice
    #[error("Remote listing contains duplicate rule name: {name}")]
    DuplicateRemoteName { name: String },

    // ===== Remote Errors =====
    /// Remote store reported a rule as absent
    #[error("Rule not found on remote: {name}")]
    RuleNotFound { name: String },

    /// Remote store already holds a rule with this name
    #[error("Rule already exists on remote: {name}")]
    RuleAlreadyExists { name: String },

    /// Transport, session or availability failure
    #[error("Remote unavailable during {op}: {message}")]
    RemoteUnavailable { op: String, message: String },

    /// Remote refused the request
    #[error("Remote rejected {op}: {message}")]
    RemoteRejected { op: String, message: String },

    /// Some planned operations succeeded before one failed
    #[error("Partial application: {applied} of {total} operations applied, {failed_op} failed: {message}")]
    PartialApplication {
        applied: usize,
        total: usize,
        failed_op: String,
        cause: ExErrorKind,
        message: String,
    },

    /// Remote order after apply does not hold the desired block at its anchor
    #[error("Managed block did not converge: expected {expected:?}, found {actual:?}")]
    ConvergenceFailed {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    // ===== Generic Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RuleSyncError {
    /// Classify an error returned by a rule store client call.
    ///
    /// `NotFound` and `AlreadyExists` keep their identity; input or rejection
    /// kinds become `RemoteRejected`; everything else is treated as the
    /// remote being unavailable.
    pub fn from_remote(op: &str, err: &ExError) -> Self {
        let subject = err
            .rule_name()
            .map(str::to_string)
            .unwrap_or_else(|| err.message().to_string());
        match err.kind() {
            ExErrorKind::NotFound => RuleSyncError::RuleNotFound { name: subject },
            ExErrorKind::AlreadyExists => RuleSyncError::RuleAlreadyExists { name: subject },
            ExErrorKind::RemoteRejected
            | ExErrorKind::InvalidInput
            | ExErrorKind::InvalidRuleName
            | ExErrorKind::InvalidPosition => RuleSyncError::RemoteRejected {
                op: op.to_string(),
                message: err.to_string(),
            },
            _ => RuleSyncError::RemoteUnavailable {
                op: op.to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl From<RuleSyncError> for ExError {
    fn from(err: RuleSyncError) -> Self {
        match err {
            RuleSyncError::DuplicateName { name } => ExError::new(ExErrorKind::DuplicateName)
                .with_rule_name(name)
                .with_message("Duplicate rule name in desired list"),

            RuleSyncError::InvalidRuleName { reason } => {
                ExError::new(ExErrorKind::InvalidRuleName)
                    .with_message(format!("Invalid rule name: {}", reason))
            }

            RuleSyncError::InvalidLocation { reason } => {
                ExError::new(ExErrorKind::InvalidLocation)
                    .with_message(format!("Invalid location: {}", reason))
            }

            RuleSyncError::PivotNotFound { pivot } => ExError::new(ExErrorKind::PivotNotFound)
                .with_rule_name(pivot)
                .with_message("Pivot rule not found in remote order"),

            RuleSyncError::PivotIsManaged { pivot } => ExError::new(ExErrorKind::InvalidPosition)
                .with_rule_name(pivot)
                .with_message("Pivot rule is part of the managed set"),

            RuleSyncError::PivotScheduledForDeletion { pivot } => {
                ExError::new(ExErrorKind::InvalidPosition)
                    .with_rule_name(pivot)
                    .with_message("Pivot rule is scheduled for deletion")
            }

            RuleSyncError::DuplicateRemoteName { name } => {
                ExError::new(ExErrorKind::InvalidSnapshot)
                    .with_op("list")
                    .with_rule_name(name)
                    .with_message("Remote listing contains a duplicate rule name")
            }

            RuleSyncError::RuleNotFound { name } => ExError::new(ExErrorKind::NotFound)
                .with_rule_name(name)
                .with_message("Rule not found on remote"),

            RuleSyncError::RuleAlreadyExists { name } => ExError::new(ExErrorKind::AlreadyExists)
                .with_rule_name(name)
                .with_message("Rule already exists on remote"),

            RuleSyncError::RemoteUnavailable { op, message } => {
                ExError::new(ExErrorKind::RemoteUnavailable)
                    .with_op(op)
                    .with_message(message)
            }

            RuleSyncError::RemoteRejected { op, message } => {
                ExError::new(ExErrorKind::RemoteRejected)
                    .with_op(op)
                    .with_message(message)
            }

            RuleSyncError::PartialApplication {
                applied,
                total,
                failed_op,
                cause,
                message,
            } => ExError::new(ExErrorKind::PartialApplication)
                .with_op("apply")
                .with_applied(applied, total)
                .with_message(format!("Operation '{}' failed", failed_op))
                .with_source(ExError::new(cause).with_message(message)),

            RuleSyncError::ConvergenceFailed { expected, actual } => {
                ExError::new(ExErrorKind::ConvergenceFailed)
                    .with_op("verify")
                    .with_message(format!("expected {:?}, found {:?}", expected, actual))
            }

            RuleSyncError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            RuleSyncError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for RuleSyncError {
    fn from(err: serde_json::Error) -> Self {
        RuleSyncError::Serialization {
            message: err.to_string(),
        }
    }
}
