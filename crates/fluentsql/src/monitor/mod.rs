//! Execution monitoring and hooks.
//!
//! This module provides:
//! - [`InstrumentedExecutor`], wrapping any [`Executor`](crate::Executor) with timing
//! - [`QueryHook`] for observing each statement before and after it runs
//! - [`QueryMonitor`] for metrics, gated by [`MonitorConfig`]
//! - [`TracingSqlHook`] for `tracing` output (feature `tracing`)
//!
//! # Example
//!
//! ```rust,ignore
//! use fluentsql::monitor::{InstrumentedExecutor, MonitorConfig, StatsMonitor, TracingSqlHook};
//! use std::time::Duration;
//!
//! let exec = InstrumentedExecutor::new(|sql: &str, args: &[String]| db.raw_query(sql, args))
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_query_threshold(Duration::from_millis(50))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor(StatsMonitor::new())
//!     .add_hook(TracingSqlHook::new());
//!
//! let rows = select().from("users").build()?.perform(&exec)?;
//! ```

mod config;
mod instrumented;
mod monitors;
mod types;

#[cfg(feature = "tracing")]
mod tracing_hook;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedExecutor;
pub use monitors::{CompositeHook, CompositeMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use types::{QueryContext, QueryHook, QueryMonitor, QueryOutcome};

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingSqlHook;

/// Longest prefix of `sql` within `max_bytes` that ends on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
