//! Generational cleanup: turns a sub-graph ownership spec into an
//! ordered, bounded sequence of deletion statements.

use thiserror::Error;

use atlas_model::{NodeRef, UpdateTag};

use crate::graph::job::{GraphJob, JobStatement};
use crate::graph::op::{GraphOp, Hop, StaleScope};

#[derive(Error, Debug)]
pub enum CleanupSpecError {
    #[error("cleanup spec {name:?} declares no paths; label-only sweeps are not allowed")]
    NoPaths { name: String },

    #[error("cleanup spec {name:?} contains a path with no hops")]
    EmptyPath { name: String },
}

/// One relationship path from the anchor to an owned resource type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanupPath {
    pub hops: Vec<Hop>,
}

impl CleanupPath {
    pub fn new(hops: Vec<Hop>) -> Self {
        Self { hops }
    }

    pub fn single(hop: Hop) -> Self {
        Self { hops: vec![hop] }
    }
}

/// Declares the sub-graph a module owns under one parent instance.
///
/// Every generated deletion joins back to the anchor, so sweeping one
/// tenant never touches another tenant's data even when absolute tag
/// values interleave across runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanupSpec {
    /// Data-domain name used for job naming and logs.
    pub name: String,
    /// Parent instance every deletion is qualified by.
    pub anchor: NodeRef,
    pub paths: Vec<CleanupPath>,
}

impl CleanupSpec {
    pub fn new(name: impl Into<String>, anchor: NodeRef, paths: Vec<CleanupPath>) -> Self {
        Self {
            name: name.into(),
            anchor,
            paths,
        }
    }
}

/// Builds the ordered cleanup job for a spec and the current run's tag.
///
/// Ordering contract: leaf sub-resources before anchor-adjacent ones
/// (deeper paths first), and within each path stale relationships before
/// stale nodes. All deletions are iterative with the configured batch
/// bound, so no single transaction exceeds it.
#[derive(Clone, Copy, Debug)]
pub struct CleanupJobBuilder {
    batch_size: u64,
}

impl Default for CleanupJobBuilder {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}

impl CleanupJobBuilder {
    pub const DEFAULT_BATCH_SIZE: u64 = 100;

    pub fn new(batch_size: u64) -> Self {
        Self { batch_size }
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn build(
        &self,
        spec: &CleanupSpec,
        tag: UpdateTag,
    ) -> Result<GraphJob, CleanupSpecError> {
        if spec.paths.is_empty() {
            return Err(CleanupSpecError::NoPaths {
                name: spec.name.clone(),
            });
        }
        if spec.paths.iter().any(|path| path.hops.is_empty()) {
            return Err(CleanupSpecError::EmptyPath {
                name: spec.name.clone(),
            });
        }

        // Stable sort: deeper paths first, declaration order as tie-break.
        let mut ordered: Vec<&CleanupPath> = spec.paths.iter().collect();
        ordered.sort_by_key(|path| std::cmp::Reverse(path.hops.len()));

        let mut job = GraphJob::new(format!("cleanup_{}", spec.name));
        for path in ordered {
            let scope = StaleScope {
                anchor: spec.anchor.clone(),
                hops: path.hops.clone(),
            };
            job.push(JobStatement::iterative(
                GraphOp::DeleteStaleRelationships {
                    scope: scope.clone(),
                    tag,
                    limit: self.batch_size,
                },
            ));
            job.push(JobStatement::iterative(GraphOp::DeleteStaleNodes {
                scope,
                tag,
                limit: self.batch_size,
            }));
        }
        Ok(job)
    }
}
