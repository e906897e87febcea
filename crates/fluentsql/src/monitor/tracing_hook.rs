use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryHook, QueryOutcome};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based hook that emits each statement before it runs.
///
/// Being a hook, it works even when monitoring is disabled. Failures are
/// reported after execution at `WARN`.
///
/// Enable via the crate feature: `fluentsql = { features = ["tracing"] }` (on by default).
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($field)*)
        } else if level == Level::WARN {
            tracing::warn!($($field)*)
        } else if level == Level::INFO {
            tracing::info!($($field)*)
        } else if level == Level::DEBUG {
            tracing::debug!($($field)*)
        } else {
            tracing::trace!($($field)*)
        }
    }};
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) {
        let sql = self.truncate_sql(&ctx.sql);
        let tag = ctx.tag.as_deref().unwrap_or("-");
        emit_at_level!(
            self.level,
            target: "fluentsql.sql",
            tag,
            arg_count = ctx.arg_count,
            sql = %sql,
            fields = ?ctx.fields,
        );
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome) {
        if let QueryOutcome::Error(message) = outcome {
            tracing::warn!(
                target: "fluentsql.sql",
                tag = ctx.tag.as_deref().unwrap_or("-"),
                elapsed_ms = duration.as_millis() as u64,
                error = %message,
                "query failed"
            );
        }
    }
}
