//! Built-in sync modules.

pub mod indexes;

use std::collections::HashSet;

use crate::sync::module::{ModuleRegistry, ModuleSpec};

/// Builds the run registry: the index module first, then the provider
/// modules in the declared order.
///
/// Index creation must precede every provider sync, since merge-by-key
/// relies on the uniqueness constraints it installs.
pub fn registry_with(providers: Vec<ModuleSpec>) -> ModuleRegistry {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for spec in &providers {
        for pair in spec.labels() {
            if seen.insert(pair.clone()) {
                labels.push(pair.clone());
            }
        }
    }

    let mut specs = Vec::with_capacity(providers.len() + 1);
    specs.push(indexes::spec(labels));
    specs.extend(providers);
    ModuleRegistry::new(specs)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use atlas_model::UpdateTag;

    use super::*;
    use crate::error::Result;
    use crate::graph::session::GraphSession;
    use crate::sync::module::SyncModule;

    struct Inert;

    #[async_trait]
    impl SyncModule for Inert {
        async fn sync(&self, _: &dyn GraphSession, _: UpdateTag) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn index_module_runs_first() {
        let provider = ModuleSpec::new("compute", |_| {
            Ok(Arc::new(Inert) as Arc<dyn SyncModule>)
        })
        .with_labels([("Server", "id")]);

        let registry = registry_with(vec![provider]);
        assert_eq!(registry.names(), vec!["indexes", "compute"]);
    }
}
