use super::config::MonitorConfig;
use super::monitors::{CompositeHook, NoopMonitor};
use super::types::{QueryContext, QueryHook, QueryMonitor, QueryOutcome};
use crate::executor::Executor;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An executor wrapper that reports each execution to hooks and monitors.
///
/// The wrapped executor's result is returned unchanged. Monitoring must be
/// explicitly enabled via `MonitorConfig::enable_monitoring()`; hooks always run.
pub struct InstrumentedExecutor<E> {
    inner: E,
    monitor: Arc<dyn QueryMonitor>,
    hook: Option<Arc<dyn QueryHook>>,
    config: MonitorConfig,
    tag: Option<String>,
}

impl<E> InstrumentedExecutor<E> {
    /// Wrap an executor with no monitoring.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
            tag: None,
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Set the hook, replacing any existing one.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Add a hook, composing it after any existing one.
    pub fn add_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_hook_arc(Arc::new(hook))
    }

    pub fn add_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    /// Tag every context produced by this executor.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = false;
        self
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn context(&self, sql: &str, arg_count: usize) -> QueryContext {
        let ctx = QueryContext::new(sql, arg_count);
        match &self.tag {
            Some(tag) => ctx.with_tag(tag.clone()),
            None => ctx,
        }
    }
}

impl<E> Executor for InstrumentedExecutor<E>
where
    E: Executor,
    E::Error: fmt::Display,
{
    type Rows = E::Rows;
    type Error = E::Error;

    fn execute(&self, sql: &str, args: &[String]) -> Result<E::Rows, E::Error> {
        let ctx = self.context(sql, args.len());
        let monitoring = self.config.monitoring_enabled;

        if let Some(hook) = &self.hook {
            hook.before_query(&ctx);
        }
        if monitoring {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.inner.execute(sql, args);
        let duration = start.elapsed();

        let outcome = match &result {
            Ok(_) => QueryOutcome::Success,
            Err(e) => QueryOutcome::error(e.to_string()),
        };

        if let Some(hook) = &self.hook {
            hook.after_query(&ctx, duration, &outcome);
        }
        if monitoring {
            self.monitor.on_query_complete(&ctx, duration, &outcome);
            if self.config.is_slow(duration) {
                self.monitor.on_slow_query(&ctx, duration);
            }
        }

        result
    }
}
