//! Database: the session object that hands out collection handles
//!
//! There is no global registry. Callers create a `Database` and pass its
//! collection handles around explicitly.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::errors::{StoreError, StoreResult};
use crate::observability::{MetricsRegistry, MetricsSnapshot};

/// Max namespace length (`database.collection`) in bytes
pub const MAX_NAMESPACE_BYTES: usize = 120;

pub struct Database {
    name: String,
    config: Arc<StoreConfig>,
    metrics: Arc<MetricsRegistry>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl Database {
    /// Create a database with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(StoreConfig::default()),
            metrics: Arc::new(MetricsRegistry::new()),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Create a database with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `DOCSTORE_CONFIG_ERROR` if the configuration is out of range
    /// or the name is not a valid database name.
    pub fn with_config(name: impl Into<String>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let name = name.into();
        check_database_name(&name)?;

        Ok(Self {
            name,
            config: Arc::new(config),
            metrics: Arc::new(MetricsRegistry::new()),
            collections: RwLock::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Returns the handle for `name`, creating the collection on first use.
    ///
    /// Repeated calls return handles to the same collection.
    ///
    /// # Errors
    ///
    /// Returns `DOCSTORE_INVALID_NAMESPACE` if the name is empty, contains
    /// `$` or NUL, or the namespace exceeds `MAX_NAMESPACE_BYTES`.
    pub fn collection(&self, name: &str) -> StoreResult<Collection> {
        let ns = self.namespace(name)?;

        if let Some(existing) = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(existing.clone());
        }

        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let handle = collections.entry(name.to_string()).or_insert_with(|| {
            Collection::new(ns, Arc::clone(&self.config), Arc::clone(&self.metrics))
        });

        Ok(handle.clone())
    }

    /// Names of collections created so far, sorted
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Drops a collection and forgets it.
    ///
    /// Outstanding handles see an empty collection. Returns whether the
    /// collection existed.
    pub fn drop_collection(&self, name: &str) -> bool {
        let removed = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);

        match removed {
            Some(collection) => {
                collection.drop();
                true
            }
            None => false,
        }
    }

    fn namespace(&self, name: &str) -> StoreResult<String> {
        if name.is_empty() {
            return Err(StoreError::InvalidNamespace(
                "collection name is empty".into(),
            ));
        }
        if name.contains('$') || name.contains('\0') {
            return Err(StoreError::InvalidNamespace(format!(
                "collection name '{}' contains '$' or NUL",
                name.escape_default()
            )));
        }

        let ns = format!("{}.{}", self.name, name);
        if ns.len() > MAX_NAMESPACE_BYTES {
            return Err(StoreError::InvalidNamespace(format!(
                "namespace is {} bytes, max is {}",
                ns.len(),
                MAX_NAMESPACE_BYTES
            )));
        }

        Ok(ns)
    }
}

fn check_database_name(name: &str) -> StoreResult<()> {
    let forbidden = ['/', '\\', '.', ' ', '"', '$', '\0'];
    if name.is_empty() || name.contains(forbidden) {
        return Err(StoreError::Config(format!(
            "invalid database name '{}'",
            name.escape_default()
        )));
    }
    Ok(())
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("collections", &self.collection_names())
            .finish()
    }
}
