use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// SQL text handed to the executor.
    pub sql: String,
    /// Number of bound arguments.
    pub arg_count: usize,
    /// Optional query name/tag for identification.
    pub tag: Option<String>,
    /// Optional structured fields for observability (low-cardinality).
    pub fields: BTreeMap<String, String>,
}

impl QueryContext {
    pub fn new(sql: &str, arg_count: usize) -> Self {
        Self {
            sql: sql.to_string(),
            arg_count,
            tag: None,
            fields: BTreeMap::new(),
        }
    }

    /// Add a tag to identify this query.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add a structured field (low-cardinality).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Maximum length for error messages in `QueryOutcome::Error`.
const MAX_ERROR_LEN: usize = 512;

/// How an execution ended, as seen by hooks and monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Success,
    /// Executor failure, message truncated to 512 bytes.
    Error(String),
}

impl QueryOutcome {
    /// Create an error outcome, truncating the message on a UTF-8 boundary.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Success => f.write_str("ok"),
            QueryOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Trait for monitoring statement execution.
///
/// Monitors only receive events when monitoring is enabled in
/// [`MonitorConfig`](super::MonitorConfig).
pub trait QueryMonitor: Send + Sync {
    /// Called before a statement is executed.
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes (success or failure).
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome);

    /// Called when execution took longer than the configured threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}

/// Trait for observing the execution lifecycle.
///
/// Hooks run whether or not monitoring is enabled. They see the statement
/// but cannot change it or its result.
pub trait QueryHook: Send + Sync {
    /// Called before a statement is executed.
    fn before_query(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes, before monitors are notified.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _outcome: &QueryOutcome) {}
}
