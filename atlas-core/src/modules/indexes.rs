//! Index creation module.
//!
//! Runs first in every registry: installs the key-uniqueness constraints
//! that make merge-by-key idempotent. Always enabled.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use atlas_model::UpdateTag;

use crate::error::Result;
use crate::graph::op::GraphOp;
use crate::graph::session::GraphSession;
use crate::sync::module::{ModuleSpec, SyncModule};

pub const MODULE_NAME: &str = "indexes";

#[derive(Debug)]
pub struct IndexesModule {
    labels: Vec<(String, String)>,
}

impl IndexesModule {
    pub fn new(labels: Vec<(String, String)>) -> Self {
        Self { labels }
    }
}

#[async_trait]
impl SyncModule for IndexesModule {
    async fn sync(&self, session: &dyn GraphSession, _tag: UpdateTag) -> Result<()> {
        for (label, key_property) in &self.labels {
            session
                .run(&GraphOp::EnsureUniqueConstraint {
                    label: label.clone(),
                    key_property: key_property.clone(),
                })
                .await?;
            debug!(label, key_property, "unique constraint ensured");
        }
        Ok(())
    }
}

/// Descriptor for the index module over the registry's declared labels.
pub fn spec(labels: Vec<(String, String)>) -> ModuleSpec {
    ModuleSpec::new(MODULE_NAME, move |_| {
        Ok(Arc::new(IndexesModule::new(labels.clone())) as Arc<dyn SyncModule>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::memory::MemoryStore;
    use crate::graph::session::GraphStore;

    #[tokio::test]
    async fn installs_one_constraint_per_label() {
        let store = MemoryStore::new();
        let session = store.session().await.unwrap();
        let module = IndexesModule::new(vec![
            ("Server".to_string(), "id".to_string()),
            ("Bucket".to_string(), "arn".to_string()),
        ]);

        module.sync(session.as_ref(), UpdateTag(1)).await.unwrap();

        assert_eq!(
            store.constraints().await,
            vec![
                ("Bucket".to_string(), "arn".to_string()),
                ("Server".to_string(), "id".to_string()),
            ]
        );
    }
}
