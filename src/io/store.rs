use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::foundation::error::{RenderError, RenderResult};

/// Object storage capability (one bucket).
///
/// Failures surface as [`RenderError::Storage`]; nothing is retried.
pub trait ObjectStore: Send + Sync {
    /// Fetch an object body.
    fn get(&self, key: &str) -> RenderResult<Vec<u8>>;
    /// Create or overwrite an object.
    fn put(&self, key: &str, body: &[u8]) -> RenderResult<()>;
    /// Keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> RenderResult<Vec<String>>;
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> RenderResult<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.objects
            .lock()
            .map_err(|_| RenderError::storage("memory store lock poisoned"))
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, key: &str) -> RenderResult<Vec<u8>> {
        self.objects()?
            .get(key)
            .cloned()
            .ok_or_else(|| RenderError::storage(format!("no object '{key}'")))
    }

    fn put(&self, key: &str, body: &[u8]) -> RenderResult<()> {
        self.objects()?.insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn list(&self, prefix: &str) -> RenderResult<Vec<String>> {
        Ok(self
            .objects()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Store backed by a flat directory: one file per key.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> RenderResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(RenderError::validation(format!(
                "object key '{key}' is not a flat file name"
            )));
        }
        Ok(self.root.join(key))
    }
}

impl ObjectStore for DirStore {
    fn get(&self, key: &str) -> RenderResult<Vec<u8>> {
        let path = self.path_for(key)?;
        std::fs::read(&path)
            .map_err(|e| RenderError::storage(format!("read '{}': {e}", path.display())))
    }

    fn put(&self, key: &str, body: &[u8]) -> RenderResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root).map_err(|e| {
            RenderError::storage(format!("create store dir '{}': {e}", self.root.display()))
        })?;
        std::fs::write(&path, body)
            .map_err(|e| RenderError::storage(format!("write '{}': {e}", path.display())))
    }

    fn list(&self, prefix: &str) -> RenderResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RenderError::storage(format!(
                    "list '{}': {e}",
                    self.root.display()
                )));
            }
        };
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                RenderError::storage(format!("list '{}': {e}", self.root.display()))
            })?;
            if let Some(name) = entry.file_name().to_str()
                && name.starts_with(prefix)
            {
                keys.push(name.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/store.rs"]
mod tests;
