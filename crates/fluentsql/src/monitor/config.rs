use std::time::Duration;

/// Settings for [`InstrumentedExecutor`](super::InstrumentedExecutor).
///
/// Monitors stay silent until monitoring is switched on; hooks ignore this.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Executions taking longer than this are reported via `on_slow_query`.
    pub slow_query_threshold: Option<Duration>,
    pub monitoring_enabled: bool,
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Switch monitoring on or off.
    pub fn monitoring(mut self, enabled: bool) -> Self {
        self.monitoring_enabled = enabled;
        self
    }

    pub fn enable_monitoring(self) -> Self {
        self.monitoring(true)
    }

    pub fn disable_monitoring(self) -> Self {
        self.monitoring(false)
    }

    pub(crate) fn is_slow(&self, elapsed: Duration) -> bool {
        matches!(self.slow_query_threshold, Some(limit) if elapsed > limit)
    }
}
