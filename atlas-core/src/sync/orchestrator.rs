use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use atlas_config::Config;
use atlas_model::UpdateTag;

use crate::error::{Result, SyncError};
use crate::graph::session::{GraphSession, GraphStore};
use crate::metrics::{MetricsSink, NoopSink};
use crate::sync::module::{ModuleRegistry, SyncModule};
use crate::sync::runner::{FailurePolicy, ModuleRunner, RunResult};
use crate::sync::tag::TagSource;

/// Orchestrator run states, surfaced through structured logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Pending,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => write!(f, "pending"),
            RunState::Running => write!(f, "running"),
            RunState::Completed => write!(f, "completed"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Successful run report: the tag that stamped the run plus per-module
/// results, in execution order.
#[derive(Debug)]
pub struct RunSummary {
    pub tag: UpdateTag,
    pub results: Vec<RunResult>,
}

/// Drives one sync run: computes the update tag, applies module
/// selection, executes the selected modules strictly sequentially in
/// registry declaration order, and aggregates their outcomes.
///
/// The store session is released on every exit path, including abort.
/// Single-writer is an external precondition: nothing here guards
/// against a concurrent run on the same store.
#[derive(Debug)]
pub struct SyncOrchestrator {
    registry: ModuleRegistry,
    tags: TagSource,
    metrics: Arc<dyn MetricsSink>,
    cancel: CancellationToken,
}

impl SyncOrchestrator {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            tags: TagSource::default(),
            metrics: Arc::new(NoopSink),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_tag_source(mut self, tags: TagSource) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub async fn run(
        &self,
        store: &dyn GraphStore,
        config: &Config,
    ) -> Result<RunSummary> {
        let run_id = Uuid::now_v7();
        let span = info_span!("sync_run", %run_id);
        self.run_inner(store, config).instrument(span).await
    }

    async fn run_inner(
        &self,
        store: &dyn GraphStore,
        config: &Config,
    ) -> Result<RunSummary> {
        let tag = self.tags.resolve(&config.sync);
        let policy = FailurePolicy::from_best_effort(config.sync.best_effort);
        info!(state = %RunState::Pending, %tag, ?policy, "sync run prepared");

        // Pre-run phase: selection and view construction. Any error here
        // is fatal before a single module executes.
        let selection = self
            .registry
            .select(config.sync.requested_modules.as_deref())?;
        let mut prepared: Vec<(&'static str, Option<Arc<dyn SyncModule>>)> =
            Vec::with_capacity(selection.len());
        for spec in selection {
            if spec.is_enabled(config) {
                prepared.push((spec.name(), Some(spec.build(config)?)));
            } else {
                prepared.push((spec.name(), None));
            }
        }

        let session = store.session().await.map_err(SyncError::GraphWrite)?;
        let result = self
            .run_modules(&prepared, session.as_ref(), tag, policy)
            .await;
        // Release the session on every exit path.
        if let Err(close_err) = session.close().await {
            warn!(error = %close_err, "failed to release store session");
        }
        result
    }

    async fn run_modules(
        &self,
        prepared: &[(&'static str, Option<Arc<dyn SyncModule>>)],
        session: &dyn GraphSession,
        tag: UpdateTag,
        policy: FailurePolicy,
    ) -> Result<RunSummary> {
        let runner =
            ModuleRunner::new(policy, Arc::clone(&self.metrics), self.cancel.clone());
        let mut results = Vec::with_capacity(prepared.len());

        for (name, module) in prepared {
            if self.cancel.is_cancelled() {
                info!(state = %RunState::Aborted, module = name, "interrupt observed");
                return Err(SyncError::Interrupted);
            }
            match module {
                None => {
                    info!(module = name, "module disabled by configuration; skipping");
                    results.push(RunResult::skipped(name));
                }
                Some(module) => {
                    info!(state = %RunState::Running, module = name, "running module");
                    let result = runner
                        .run(name, module.as_ref(), session, tag)
                        .await
                        .inspect_err(|err| {
                            if matches!(err, SyncError::Interrupted) {
                                info!(state = %RunState::Aborted, module = name, "run aborted");
                            } else {
                                error!(state = %RunState::Aborted, module = name, error = %err, "run halted");
                            }
                        })?;
                    results.push(result);
                }
            }
        }

        let failed: Vec<String> = results
            .iter()
            .filter(|result| result.outcome.is_failed())
            .map(|result| result.module.clone())
            .collect();
        if failed.is_empty() {
            info!(state = %RunState::Completed, modules = results.len(), "sync run completed");
            Ok(RunSummary { tag, results })
        } else {
            error!(
                state = %RunState::Completed,
                failed = ?failed,
                "sync run completed with module failures"
            );
            Err(SyncError::Aggregate { failed })
        }
    }
}
