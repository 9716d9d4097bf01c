//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent between the logging macros,
//! the engine's boundary logs and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_LOCATION: &str = "location";
pub const FIELD_RULE_NAME: &str = "rule_name";
pub const FIELD_PIVOT: &str = "pivot";

// Plan sizes
pub const FIELD_DESIRED_LEN: &str = "desired_len";
pub const FIELD_OPS_TOTAL: &str = "ops_total";
pub const FIELD_OPS_APPLIED: &str = "ops_applied";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
