use super::types::{QueryContext, QueryHook, QueryMonitor, QueryOutcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A no-op monitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _outcome: &QueryOutcome) {}
}

/// Collected execution statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub slow_queries: u64,
    /// Total execution time, saturating at `u64::MAX` nanoseconds.
    pub total_duration: Duration,
    pub max_duration: Duration,
    /// SQL of the slowest execution seen.
    pub slowest_query: Option<String>,
}

/// A monitor that tracks execution statistics.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    slow_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            slow_queries: self.slow_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self
                .slowest_query
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.total_queries.store(0, Ordering::Relaxed);
        self.failed_queries.store(0, Ordering::Relaxed);
        self.slow_queries.store(0, Ordering::Relaxed);
        self.total_duration_nanos.store(0, Ordering::Relaxed);
        self.max_duration_nanos.store(0, Ordering::Relaxed);
        *self
            .slowest_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome) {
        let nanos = saturating_nanos(duration);

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        let prev_total = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev_total.checked_add(nanos).is_none() {
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }

        if outcome.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }

        // Only the thread that installs the new maximum records its SQL.
        let mut current_max = self.max_duration_nanos.load(Ordering::Relaxed);
        while nanos > current_max {
            match self.max_duration_nanos.compare_exchange_weak(
                current_max,
                nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    *self
                        .slowest_query
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = Some(ctx.sql.clone());
                    break;
                }
                Err(updated) => current_max = updated,
            }
        }
    }

    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {
        self.slow_queries.fetch_add(1, Ordering::Relaxed);
    }
}

/// A composite monitor that delegates to multiple monitors.
#[derive(Default)]
pub struct CompositeMonitor {
    monitors: Vec<Arc<dyn QueryMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    pub fn add_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }
}

impl QueryMonitor for CompositeMonitor {
    fn on_query_start(&self, ctx: &QueryContext) {
        for monitor in &self.monitors {
            monitor.on_query_start(ctx);
        }
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome) {
        for monitor in &self.monitors {
            monitor.on_query_complete(ctx, duration, outcome);
        }
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        for monitor in &self.monitors {
            monitor.on_slow_query(ctx, duration);
        }
    }
}

/// A composite hook that runs multiple hooks in insertion order.
#[derive(Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn add_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl QueryHook for CompositeHook {
    fn before_query(&self, ctx: &QueryContext) {
        for hook in &self.hooks {
            hook.before_query(ctx);
        }
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome) {
        for hook in &self.hooks {
            hook.after_query(ctx, duration, outcome);
        }
    }
}
