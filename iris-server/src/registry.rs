//! Index registry for resolving per-index state managers

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use iris_core::{Error, IndexStateManager, JsonSettingsStore, Result, SettingsStore};

/// Registry of all known indices, keyed by name.
///
/// Each index gets exactly one `IndexStateManager`, so updates to the same
/// index always contend on the same lock and updates to different indices
/// never do.
pub struct IndexRegistry {
    /// Single map: name → state manager
    managers: RwLock<HashMap<String, Arc<IndexStateManager>>>,
    data_dir: PathBuf,
    store: Arc<dyn SettingsStore>,
}

impl IndexRegistry {
    pub fn new(data_dir: PathBuf) -> Self {
        let store = Arc::new(JsonSettingsStore::new(data_dir.clone()));
        Self::with_store(data_dir, store)
    }

    /// Registry with a caller-supplied settings store.
    pub fn with_store(data_dir: PathBuf, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            managers: RwLock::new(HashMap::new()),
            data_dir,
            store,
        }
    }

    /// Register a new index with no explicit settings.
    pub fn create_index(&self, name: &str) -> Result<Arc<IndexStateManager>> {
        let index_path = self.data_dir.join(name);
        if index_path.exists() {
            return Err(Error::IndexExists(name.to_string()));
        }
        std::fs::create_dir_all(&index_path)?;

        let manager = Arc::new(IndexStateManager::new(name, Arc::clone(&self.store)));
        self.managers
            .write()
            .insert(name.to_string(), Arc::clone(&manager));
        Ok(manager)
    }

    /// Resolve the state manager for an index, opening it from disk if it is
    /// not in memory yet. `IndexNotFound` if the index does not exist.
    pub fn state_manager(&self, name: &str) -> Result<Arc<IndexStateManager>> {
        if let Some(manager) = self.managers.read().get(name) {
            return Ok(Arc::clone(manager));
        }

        // Open from disk
        let index_path = self.data_dir.join(name);
        if !index_path.exists() {
            return Err(Error::IndexNotFound(name.to_string()));
        }
        let manager = Arc::new(IndexStateManager::open(name, Arc::clone(&self.store))?);

        let mut managers = self.managers.write();
        // Double-check after acquiring write lock
        if let Some(existing) = managers.get(name) {
            return Ok(Arc::clone(existing));
        }
        managers.insert(name.to_string(), Arc::clone(&manager));
        Ok(manager)
    }

    /// List all indices on disk
    pub fn list_indexes(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.data_dir)
            .into_iter()
            .flatten()
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if entry.file_type().ok()?.is_dir() {
                    entry.file_name().into_string().ok()
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IndexRegistry::new(dir.path().to_path_buf());

        registry.create_index("books").unwrap();
        let manager = registry.state_manager("books").unwrap();
        assert_eq!(manager.name(), "books");
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IndexRegistry::new(dir.path().to_path_buf());

        registry.create_index("books").unwrap();
        let err = registry.create_index("books").unwrap_err();
        assert!(matches!(err, Error::IndexExists(_)));
    }

    #[test]
    fn test_unknown_index_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IndexRegistry::new(dir.path().to_path_buf());

        let err = registry.state_manager("missing").unwrap_err();
        assert!(matches!(err, Error::IndexNotFound(_)));
    }

    #[test]
    fn test_resolve_returns_same_manager() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IndexRegistry::new(dir.path().to_path_buf());

        registry.create_index("books").unwrap();
        let a = registry.state_manager("books").unwrap();
        let b = registry.state_manager("books").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_reopen_from_disk_after_eviction() {
        let dir = tempfile::tempdir().unwrap();
        {
            let registry = IndexRegistry::new(dir.path().to_path_buf());
            registry.create_index("books").unwrap();
        }

        // Fresh registry, same data dir: index is discovered on disk
        let registry = IndexRegistry::new(dir.path().to_path_buf());
        assert!(registry.state_manager("books").is_ok());
        assert_eq!(registry.list_indexes(), vec!["books".to_string()]);
    }
}
