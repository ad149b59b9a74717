use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info_span};

use atlas_model::UpdateTag;

use crate::error::{Result, SyncError};
use crate::graph::session::GraphSession;
use crate::metrics::MetricsSink;
use crate::sync::module::SyncModule;

/// How the run treats a module failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// First failure ends the run.
    Strict,
    /// Failures are recorded and the run continues; an aggregate error is
    /// raised after the last module.
    BestEffort,
}

impl FailurePolicy {
    pub fn from_best_effort(best_effort: bool) -> Self {
        if best_effort {
            FailurePolicy::BestEffort
        } else {
            FailurePolicy::Strict
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleOutcome {
    Success,
    Failed,
    Skipped,
}

impl ModuleOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ModuleOutcome::Failed)
    }
}

impl fmt::Display for ModuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleOutcome::Success => write!(f, "success"),
            ModuleOutcome::Failed => write!(f, "failed"),
            ModuleOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-module outcome, consumed only by the orchestrator's final
/// aggregation.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub module: String,
    pub outcome: ModuleOutcome,
    pub duration: Duration,
    pub error: Option<String>,
}

impl RunResult {
    pub fn success(module: &str, duration: Duration) -> Self {
        Self {
            module: module.to_string(),
            outcome: ModuleOutcome::Success,
            duration,
            error: None,
        }
    }

    pub fn failed(module: &str, duration: Duration, error: &SyncError) -> Self {
        Self {
            module: module.to_string(),
            outcome: ModuleOutcome::Failed,
            duration,
            error: Some(error.to_string()),
        }
    }

    pub fn skipped(module: &str) -> Self {
        Self {
            module: module.to_string(),
            outcome: ModuleOutcome::Skipped,
            duration: Duration::ZERO,
            error: None,
        }
    }
}

/// Executes one module under the run's failure policy.
///
/// Timing and the `(module, duration, outcome)` metric event are emitted
/// for every executed module. Cancellation is never intercepted: an
/// interrupt surfaces as [`SyncError::Interrupted`] under either policy.
/// A graph-write failure likewise always aborts the module that raised
/// it — under best-effort it is then recorded instead of ending the run.
#[derive(Debug)]
pub struct ModuleRunner {
    policy: FailurePolicy,
    metrics: Arc<dyn MetricsSink>,
    cancel: CancellationToken,
}

impl ModuleRunner {
    pub fn new(
        policy: FailurePolicy,
        metrics: Arc<dyn MetricsSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            policy,
            metrics,
            cancel,
        }
    }

    pub async fn run(
        &self,
        name: &str,
        module: &dyn SyncModule,
        session: &dyn GraphSession,
        tag: UpdateTag,
    ) -> Result<RunResult> {
        let span = info_span!("module_sync", module = name, %tag);
        let started = Instant::now();
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(SyncError::Interrupted),
            result = module.sync(session, tag).instrument(span) => result,
        };
        let duration = started.elapsed();

        match outcome {
            Ok(()) => {
                self.metrics
                    .module_timing(name, duration, ModuleOutcome::Success);
                Ok(RunResult::success(name, duration))
            }
            Err(SyncError::Interrupted) => {
                self.metrics
                    .module_timing(name, duration, ModuleOutcome::Failed);
                Err(SyncError::Interrupted)
            }
            Err(err) => {
                self.metrics
                    .module_timing(name, duration, ModuleOutcome::Failed);
                error!(module = name, error = %err, "module sync failed");
                match self.policy {
                    FailurePolicy::Strict => Err(err),
                    FailurePolicy::BestEffort => {
                        Ok(RunResult::failed(name, duration, &err))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::graph::memory::MemoryStore;
    use crate::graph::session::GraphStore;
    use crate::metrics::test_support::RecordingSink;

    struct Succeeding;

    #[async_trait]
    impl SyncModule for Succeeding {
        async fn sync(&self, _: &dyn GraphSession, _: UpdateTag) -> Result<()> {
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl SyncModule for Failing {
        async fn sync(&self, _: &dyn GraphSession, _: UpdateTag) -> Result<()> {
            Err(SyncError::provider("api quota exceeded"))
        }
    }

    struct Hanging;

    #[async_trait]
    impl SyncModule for Hanging {
        async fn sync(&self, _: &dyn GraphSession, _: UpdateTag) -> Result<()> {
            futures_pending().await;
            Ok(())
        }
    }

    async fn futures_pending() {
        std::future::pending::<()>().await;
    }

    async fn run_one(
        policy: FailurePolicy,
        module: &dyn SyncModule,
        cancel: CancellationToken,
    ) -> (Result<RunResult>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let runner = ModuleRunner::new(policy, sink.clone(), cancel);
        let store = MemoryStore::new();
        let session = store.session().await.unwrap();
        let result = runner
            .run("m", module, session.as_ref(), UpdateTag(1))
            .await;
        (result, sink)
    }

    #[tokio::test]
    async fn success_is_timed_and_reported() {
        let (result, sink) =
            run_one(FailurePolicy::Strict, &Succeeding, CancellationToken::new()).await;
        let result = result.unwrap();
        assert_eq!(result.outcome, ModuleOutcome::Success);
        assert_eq!(
            sink.events.lock().unwrap().as_slice(),
            &[("m".to_string(), ModuleOutcome::Success)]
        );
    }

    #[tokio::test]
    async fn strict_policy_propagates_the_error() {
        let (result, sink) =
            run_one(FailurePolicy::Strict, &Failing, CancellationToken::new()).await;
        assert!(matches!(result, Err(SyncError::Provider { .. })));
        assert_eq!(
            sink.events.lock().unwrap().as_slice(),
            &[("m".to_string(), ModuleOutcome::Failed)]
        );
    }

    #[tokio::test]
    async fn best_effort_converts_the_error_into_a_result() {
        let (result, _) =
            run_one(FailurePolicy::BestEffort, &Failing, CancellationToken::new())
                .await;
        let result = result.unwrap();
        assert_eq!(result.outcome, ModuleOutcome::Failed);
        assert!(result.error.as_deref().unwrap().contains("api quota"));
    }

    #[tokio::test]
    async fn cancellation_aborts_even_under_best_effort() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (result, _) = run_one(FailurePolicy::BestEffort, &Hanging, cancel).await;
        assert!(matches!(result, Err(SyncError::Interrupted)));
    }
}
