use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use atlas_config::Config;
use atlas_model::UpdateTag;

use crate::error::{Result, SyncError};
use crate::graph::session::GraphSession;

/// One provider sync module.
///
/// A module receives the shared session and the run's tag; its
/// configuration view was carved out of the full [`Config`] when the
/// registry built it, so the module never reads shared config at run
/// time. Modules issue their writes first and their scoped cleanup jobs
/// last, and should parallelize only their external data collection.
#[async_trait]
pub trait SyncModule: Send + Sync {
    async fn sync(&self, session: &dyn GraphSession, tag: UpdateTag) -> Result<()>;
}

type ModuleBuilder =
    Box<dyn Fn(&Config) -> Result<Arc<dyn SyncModule>> + Send + Sync>;

/// Static descriptor of a registered module: name, enablement predicate,
/// and a builder that extracts the module's configuration view.
///
/// Descriptors are resolved at startup; there is no runtime discovery.
pub struct ModuleSpec {
    name: &'static str,
    enabled: fn(&Config) -> bool,
    builder: ModuleBuilder,
    /// (label, key property) pairs this module merges by. Feeds the
    /// built-in index module.
    labels: Vec<(String, String)>,
}

fn always_enabled(_: &Config) -> bool {
    true
}

impl ModuleSpec {
    pub fn new(
        name: &'static str,
        builder: impl Fn(&Config) -> Result<Arc<dyn SyncModule>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            enabled: always_enabled,
            builder: Box::new(builder),
            labels: Vec::new(),
        }
    }

    pub fn with_enablement(mut self, enabled: fn(&Config) -> bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_labels(
        mut self,
        labels: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.labels = labels
            .into_iter()
            .map(|(label, key)| (label.into(), key.into()))
            .collect();
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self, config: &Config) -> bool {
        (self.enabled)(config)
    }

    pub fn build(&self, config: &Config) -> Result<Arc<dyn SyncModule>> {
        (self.builder)(config)
    }

    pub fn labels(&self) -> &[(String, String)] {
        &self.labels
    }
}

impl fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSpec")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .finish()
    }
}

/// Ordered module table.
///
/// Declaration order is semantic: it encodes inter-module dependencies
/// (account discovery before per-service inventory), and selection never
/// reorders it.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    specs: Vec<ModuleSpec>,
}

impl ModuleRegistry {
    pub fn new(specs: Vec<ModuleSpec>) -> Self {
        Self { specs }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(ModuleSpec::name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Every (label, key property) pair declared across the registry,
    /// deduplicated, in declaration order.
    pub fn declared_labels(&self) -> Vec<(String, String)> {
        let mut seen = std::collections::HashSet::new();
        let mut labels = Vec::new();
        for spec in &self.specs {
            for pair in spec.labels() {
                if seen.insert(pair.clone()) {
                    labels.push(pair.clone());
                }
            }
        }
        labels
    }

    /// Applies the requested-module filter.
    ///
    /// Returns the selected descriptors in registry declaration order,
    /// whatever order the request listed them in. Any unknown name fails
    /// the whole selection before anything runs.
    pub fn select(&self, requested: Option<&[String]>) -> Result<Vec<&ModuleSpec>> {
        let Some(requested) = requested else {
            return Ok(self.specs.iter().collect());
        };

        let unknown: Vec<String> = requested
            .iter()
            .filter(|name| !self.specs.iter().any(|spec| spec.name() == name.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SyncError::Selection { names: unknown });
        }

        Ok(self
            .specs
            .iter()
            .filter(|spec| requested.iter().any(|name| name == spec.name()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use atlas_config::{MetricsSettings, StoreSettings, SyncSettings};

    use super::*;

    struct Inert;

    #[async_trait]
    impl SyncModule for Inert {
        async fn sync(&self, _: &dyn GraphSession, _: UpdateTag) -> Result<()> {
            Ok(())
        }
    }

    fn spec(name: &'static str) -> ModuleSpec {
        ModuleSpec::new(name, |_| Ok(Arc::new(Inert) as Arc<dyn SyncModule>))
    }

    fn registry() -> ModuleRegistry {
        ModuleRegistry::new(vec![spec("accounts"), spec("compute"), spec("storage")])
    }

    fn config() -> Config {
        Config {
            store: StoreSettings::default(),
            sync: SyncSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }

    fn names(selection: &[&ModuleSpec]) -> Vec<&'static str> {
        selection.iter().map(|spec| spec.name()).collect()
    }

    #[test]
    fn no_filter_selects_everything_in_order() {
        let registry = registry();
        let selection = registry.select(None).unwrap();
        assert_eq!(names(&selection), vec!["accounts", "compute", "storage"]);
    }

    #[test]
    fn selection_keeps_registry_order_not_request_order() {
        let registry = registry();
        let requested = vec!["storage".to_string(), "accounts".to_string()];
        let selection = registry.select(Some(&requested)).unwrap();
        assert_eq!(names(&selection), vec!["accounts", "storage"]);
    }

    #[test]
    fn unknown_name_fails_the_whole_selection() {
        let registry = registry();
        let requested = vec!["compute".to_string(), "gibberish".to_string()];
        match registry.select(Some(&requested)) {
            Err(SyncError::Selection { names }) => {
                assert_eq!(names, vec!["gibberish".to_string()]);
            }
            other => panic!("expected selection error, got {:?}", other.map(|s| names(&s))),
        }
    }

    #[test]
    fn duplicate_requests_do_not_duplicate_modules() {
        let registry = registry();
        let requested = vec!["compute".to_string(), "compute".to_string()];
        let selection = registry.select(Some(&requested)).unwrap();
        assert_eq!(names(&selection), vec!["compute"]);
    }

    #[test]
    fn enablement_predicate_reads_config() {
        let spec = spec("aws").with_enablement(|config| config.sync.best_effort);
        let mut config = config();
        assert!(!spec.is_enabled(&config));
        config.sync.best_effort = true;
        assert!(spec.is_enabled(&config));
    }

    #[test]
    fn declared_labels_deduplicate_across_modules() {
        let registry = ModuleRegistry::new(vec![
            spec("a").with_labels([("Server", "id"), ("Account", "id")]),
            spec("b").with_labels([("Server", "id"), ("Bucket", "arn")]),
        ]);
        assert_eq!(
            registry.declared_labels(),
            vec![
                ("Server".to_string(), "id".to_string()),
                ("Account".to_string(), "id".to_string()),
                ("Bucket".to_string(), "arn".to_string()),
            ]
        );
    }
}
