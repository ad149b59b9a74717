use tracing::debug;

use crate::error::Result;
use crate::graph::op::GraphOp;
use crate::graph::session::GraphSession;

/// One statement of a [`GraphJob`].
///
/// Iterative statements are re-run until a pass affects zero records;
/// each pass is its own transaction, so a mid-sweep failure leaves the
/// remainder for the next run's sweep rather than rolling anything back.
#[derive(Clone, Debug, PartialEq)]
pub struct JobStatement {
    pub op: GraphOp,
    pub iterative: bool,
}

impl JobStatement {
    pub fn once(op: GraphOp) -> Self {
        Self {
            op,
            iterative: false,
        }
    }

    pub fn iterative(op: GraphOp) -> Self {
        Self {
            op,
            iterative: true,
        }
    }
}

/// Ordered unit of idempotent graph work issued by one module.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphJob {
    pub name: String,
    pub statements: Vec<JobStatement>,
}

impl GraphJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: JobStatement) {
        self.statements.push(statement);
    }

    /// Executes every statement in declared order.
    ///
    /// A store failure aborts the job at the failing statement; completed
    /// statements are individually committed and stay committed.
    pub async fn run(&self, session: &dyn GraphSession) -> Result<()> {
        for statement in &self.statements {
            if statement.iterative {
                let mut batches = 0u64;
                let mut total = 0u64;
                loop {
                    let affected = session.run(&statement.op).await?;
                    if affected == 0 {
                        break;
                    }
                    batches += 1;
                    total += affected;
                }
                debug!(
                    job = %self.name,
                    op = statement.op.kind(),
                    batches,
                    affected = total,
                    "iterative statement drained"
                );
            } else {
                let affected = session.run(&statement.op).await?;
                debug!(
                    job = %self.name,
                    op = statement.op.kind(),
                    affected,
                    "statement applied"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use atlas_model::{NodeRef, UpdateTag};

    use super::*;
    use crate::graph::op::{Hop, MergeNode, StaleScope};
    use crate::graph::session::StoreError;

    /// Session returning a scripted sequence of affected counts.
    struct ScriptedSession {
        affected: Mutex<Vec<u64>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedSession {
        fn new(affected: Vec<u64>) -> Self {
            Self {
                affected: Mutex::new(affected),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GraphSession for ScriptedSession {
        async fn run(&self, op: &GraphOp) -> std::result::Result<u64, StoreError> {
            self.calls.lock().unwrap().push(op.kind());
            let mut affected = self.affected.lock().unwrap();
            if affected.is_empty() {
                Ok(0)
            } else {
                Ok(affected.remove(0))
            }
        }

        async fn close(&self) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    fn sweep_op(limit: u64) -> GraphOp {
        GraphOp::DeleteStaleNodes {
            scope: StaleScope {
                anchor: NodeRef::with_id("Account", "a-1"),
                hops: vec![Hop::outgoing("RESOURCE", "Server")],
            },
            tag: UpdateTag(200),
            limit,
        }
    }

    #[tokio::test]
    async fn iterative_statement_loops_until_zero_affected() {
        // 7 stale entities, batch bound 3: three non-empty batches plus the
        // terminating zero-affected pass.
        let session = ScriptedSession::new(vec![3, 3, 1, 0]);
        let mut job = GraphJob::new("cleanup_servers");
        job.push(JobStatement::iterative(sweep_op(3)));

        job.run(&session).await.unwrap();
        assert_eq!(session.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn plain_statement_runs_once() {
        let session = ScriptedSession::new(vec![1]);
        let mut job = GraphJob::new("write_servers");
        job.push(JobStatement::once(GraphOp::MergeNode(MergeNode {
            node: NodeRef::with_id("Server", "web-1"),
            properties: BTreeMap::new(),
            tag: UpdateTag(200),
        })));

        job.run(&session).await.unwrap();
        assert_eq!(
            session.calls.lock().unwrap().as_slice(),
            &["merge_node"]
        );
    }
}
