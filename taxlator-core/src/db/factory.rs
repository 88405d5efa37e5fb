use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{HistoryRepository, RepositoryError};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is handed to that factory as-is.
///
/// | backend    | connection_string examples             |
/// |------------|----------------------------------------|
/// | `sqlite`   | `taxlator.db`, `:memory:`              |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

/// Opens a history store for one backend. Backend crates export a unit
/// struct implementing this and register it with a [`RepositoryRegistry`].
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Opens (or creates) the store. Migrations run here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError>;
}

/// [`RepositoryFactory`] instances keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A factory with the same backend name replaces the earlier one.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory is registered
    ///   for `config.backend`.
    /// * Whatever the chosen factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
        let factory = self.factories.get(config.backend.as_str()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            ))
        })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
