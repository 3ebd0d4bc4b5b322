use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::loader::{load_file, LoadError, Loaded};
use super::model::Dataset;

/// A loaded dataset shared read-only between views.
#[derive(Debug, Clone)]
pub struct SharedDataset {
    pub dataset: Arc<Dataset>,
    pub source_name: String,
}

impl From<Loaded> for SharedDataset {
    fn from(loaded: Loaded) -> Self {
        SharedDataset {
            dataset: Arc::new(loaded.dataset),
            source_name: loaded.source_name,
        }
    }
}

/// Loads the dataset at `path` at most once and hands out the same `Arc`.
///
/// `reload` swaps in a fresh copy only when loading succeeds; holders of the
/// previous `Arc` keep reading the old, complete dataset.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    slot: Mutex<Option<SharedDataset>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DatasetCache {
            path: path.into(),
            slot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached dataset, loading it on first use. A failed load leaves the
    /// cache empty so the next call retries.
    pub fn get(&self) -> Result<SharedDataset, LoadError> {
        let mut slot = self.lock();
        if let Some(shared) = slot.as_ref() {
            return Ok(shared.clone());
        }
        let shared = SharedDataset::from(load_file(&self.path)?);
        *slot = Some(shared.clone());
        Ok(shared)
    }

    /// Load a fresh copy and replace the cached one.
    pub fn reload(&self) -> Result<SharedDataset, LoadError> {
        let shared = SharedDataset::from(load_file(&self.path)?);
        *self.lock() = Some(shared.clone());
        log::info!("Reloaded {}", self.path.display());
        Ok(shared)
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<SharedDataset>> {
        // the slot is only ever replaced wholesale, so a poisoned value is intact
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const HEADER: &str = "UF,Município Instituição,Descrição CATMAT,Fornecedor,Fabricante,Ano,Preço Total,Preço Unitário,Qtd Itens Comprados";

    #[test]
    fn loads_once_and_shares() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bps.csv");
        fs::write(&path, format!("{HEADER}\nSP,Santos,Luva,Alfa,Lab,2021,10,1,10\n")).unwrap();

        let cache = DatasetCache::new(&path);
        assert!(!cache.is_loaded());
        let first = cache.get().unwrap();
        assert!(cache.is_loaded());

        // later edits on disk are invisible until reload
        fs::write(
            &path,
            format!("{HEADER}\nSP,Santos,Luva,Alfa,Lab,2021,10,1,10\nRJ,Rio,Luva,Beta,Lab,2022,5,1,5\n"),
        )
        .unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first.dataset, &second.dataset));
        assert_eq!(second.dataset.len(), 1);

        let reloaded = cache.reload().unwrap();
        assert_eq!(reloaded.dataset.len(), 2);
        assert_eq!(first.dataset.len(), 1);
        assert!(Arc::ptr_eq(&reloaded.dataset, &cache.get().unwrap().dataset));
    }

    #[test]
    fn failed_reload_keeps_previous_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bps.csv");
        fs::write(&path, format!("{HEADER}\nSP,Santos,Luva,Alfa,Lab,2021,10,1,10\n")).unwrap();

        let cache = DatasetCache::new(&path);
        let first = cache.get().unwrap();
        fs::remove_file(&path).unwrap();

        assert!(matches!(cache.reload(), Err(LoadError::Io { .. })));
        assert!(Arc::ptr_eq(&first.dataset, &cache.get().unwrap().dataset));
    }

    #[test]
    fn failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bps.csv");
        let cache = DatasetCache::new(&path);
        assert!(cache.get().is_err());
        assert!(!cache.is_loaded());

        fs::write(&path, format!("{HEADER}\nMG,BH,Luva,Alfa,Lab,2020,1,1,1\n")).unwrap();
        assert_eq!(cache.get().unwrap().dataset.len(), 1);
    }
}
