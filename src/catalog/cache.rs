use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

use crate::catalog::loader::{load_catalog, LoadedCatalog};

#[derive(Debug, Clone)]
pub struct CachedCatalog {
    pub loaded_at: DateTime<Utc>,
    pub loaded: Arc<LoadedCatalog>,
}

static CATALOG_CACHE: Lazy<Mutex<HashMap<Option<PathBuf>, CachedCatalog>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Normalization is a pure function of the dataset, so each source is loaded
/// once per process.
pub fn get_or_load(path: Option<&Path>) -> Result<Arc<LoadedCatalog>> {
    let key = path.map(Path::to_path_buf);
    if let Some(hit) = get(key.as_deref()) {
        return Ok(hit.loaded);
    }
    let loaded = Arc::new(load_catalog(path)?);
    let mut guard = CATALOG_CACHE.lock().expect("catalog cache mutex poisoned");
    let entry = guard.entry(key).or_insert_with(|| CachedCatalog {
        loaded_at: Utc::now(),
        loaded,
    });
    Ok(entry.loaded.clone())
}

pub fn get(path: Option<&Path>) -> Option<CachedCatalog> {
    let guard = CATALOG_CACHE.lock().expect("catalog cache mutex poisoned");
    guard.get(&path.map(Path::to_path_buf)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memoizes_per_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.csv");
        let first = get_or_load(Some(&path)).expect("load");
        let second = get_or_load(Some(&path)).expect("load");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(get(Some(&path)).is_some());
    }
}
