use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use atlas_config::MetricsSettings;

use crate::sync::runner::ModuleOutcome;

/// Collaborator receiving per-module timing events.
///
/// The transport (statsd or otherwise) lives outside this crate; the
/// orchestrator only guarantees one event per executed module.
pub trait MetricsSink: Send + Sync + fmt::Debug {
    fn module_timing(&self, module: &str, duration: Duration, outcome: ModuleOutcome);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn module_timing(&self, _module: &str, _duration: Duration, _outcome: ModuleOutcome) {}
}

/// Emits timing events as structured log records, optionally under a
/// configured prefix. Used when metrics are enabled without a transport.
#[derive(Debug, Default, Clone)]
pub struct LogSink {
    prefix: Option<String>,
}

impl LogSink {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }
}

impl MetricsSink for LogSink {
    fn module_timing(&self, module: &str, duration: Duration, outcome: ModuleOutcome) {
        tracing::info!(
            prefix = self.prefix.as_deref().unwrap_or("atlas"),
            module,
            duration_ms = duration.as_millis() as u64,
            outcome = %outcome,
            "module timing"
        );
    }
}

/// Sink selection from configuration: disabled metrics cost nothing.
pub fn sink_from_settings(settings: &MetricsSettings) -> Arc<dyn MetricsSink> {
    if settings.enabled {
        Arc::new(LogSink::new(settings.prefix.clone()))
    } else {
        Arc::new(NoopSink)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// Captures emitted events for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<(String, ModuleOutcome)>>,
    }

    impl MetricsSink for RecordingSink {
        fn module_timing(
            &self,
            module: &str,
            _duration: Duration,
            outcome: ModuleOutcome,
        ) {
            self.events
                .lock()
                .unwrap()
                .push((module.to_string(), outcome));
        }
    }
}
