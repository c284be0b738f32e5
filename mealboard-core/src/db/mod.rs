//! Whole-document persistence for the recipe and meal-plan stores.
//!
//! A store owns exactly one [`Document`]. Every mutation is a locked
//! read-modify-write of the entire document, so concurrent callers of the same
//! store are strictly ordered. Backends only ever swap in a complete body.

mod schema;
mod sqlite;

use std::fs::File;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

pub use sqlite::{Database, SqliteBackend};

pub const RECIPES_DOCUMENT: &str = "recipes";
pub const MEAL_PLAN_DOCUMENT: &str = "meal_plan";

pub const RECIPES_FILE: &str = "recipes.json";
pub const MEAL_PLAN_FILE: &str = "meals_data.json";

/// Raw storage for a single document.
pub trait DocumentBackend: Send + Sync {
    /// Returns the stored body, or `None` if nothing was ever written.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replaces the stored body. A crash must leave either the old or the new
    /// body behind, never a mix.
    fn store(&self, body: &str) -> Result<(), StoreError>;
}

/// In-process backend, used by tests and throwaway planners.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    body: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the backend with an arbitrary body, valid or not.
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Mutex::new(Some(body.into())),
        }
    }

    pub fn contents(&self) -> Result<Option<String>, StoreError> {
        self.lock().map(|body| body.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<String>>, StoreError> {
        self.body
            .lock()
            .map_err(|_| StoreError::Poisoned("memory backend"))
    }
}

impl DocumentBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        self.contents()
    }

    fn store(&self, body: &str) -> Result<(), StoreError> {
        *self.lock()? = Some(body.to_string());
        Ok(())
    }
}

/// One pretty-printed JSON file per document.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn store(&self, body: &str) -> Result<(), StoreError> {
        write_atomic(&self.path, body.as_bytes())
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(io_err(parent))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    let tmp = parent.join(format!(".{file_name}.tmp-{}", std::process::id()));

    {
        let mut file = File::create(&tmp).map_err(io_err(&tmp))?;
        file.write_all(bytes).map_err(io_err(&tmp))?;
        file.sync_all().map_err(io_err(&tmp))?;
    }

    std::fs::rename(&tmp, path).map_err(io_err(path))
}

/// A typed, lock-guarded view over one backend.
///
/// Clones share the backend and the lock.
pub struct Document<T> {
    name: &'static str,
    backend: Arc<dyn DocumentBackend>,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Document<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            backend: self.backend.clone(),
            lock: self.lock.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(name: &'static str, backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            name,
            backend,
            lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Loads a snapshot of the document.
    pub fn read(&self) -> Result<T, StoreError> {
        let _guard = self.lock()?;
        self.load()
    }

    /// Runs one read-modify-write cycle under the document lock.
    ///
    /// Nothing is written when `mutate` fails, so validation errors raised
    /// inside it leave the stored document untouched.
    pub fn update<R, E>(&self, mutate: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.lock()?;
        let mut document = self.load()?;
        let outcome = mutate(&mut document)?;

        let body = serde_json::to_string_pretty(&document).map_err(|source| {
            StoreError::Encode {
                document: self.name.to_string(),
                source,
            }
        })?;
        self.backend.store(&body)?;
        Ok(outcome)
    }

    fn load(&self) -> Result<T, StoreError> {
        let Some(body) = self.backend.load()? else {
            return Ok(T::default());
        };

        serde_json::from_str(&body).map_err(|err| {
            tracing::error!(
                document = self.name,
                error = %err,
                "Persisted document is corrupt; refusing to read or write it"
            );
            StoreError::Corrupt {
                document: self.name.to_string(),
                message: err.to_string(),
            }
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock.lock().map_err(|_| StoreError::Poisoned(self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Counts = BTreeMap<String, u32>;

    fn memory_document(backend: Arc<MemoryBackend>) -> Document<Counts> {
        Document::new("counts", backend)
    }

    #[test]
    fn missing_document_reads_as_default() {
        let document = memory_document(Arc::new(MemoryBackend::new()));
        assert!(document.read().unwrap().is_empty());
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let document = memory_document(backend.clone());

        let result: Result<(), StoreError> = document.update(|counts| {
            counts.insert("a".to_string(), 1);
            Err(StoreError::Poisoned("test"))
        });

        assert!(result.is_err());
        assert!(backend.contents().unwrap().is_none());
    }

    #[test]
    fn corrupt_body_is_reported_and_kept() {
        let backend = Arc::new(MemoryBackend::with_body("{not json"));
        let document = memory_document(backend.clone());

        assert!(matches!(document.read(), Err(StoreError::Corrupt { .. })));

        let result: Result<(), StoreError> = document.update(|counts| {
            counts.clear();
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        assert_eq!(backend.contents().unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn json_file_backend_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("counts.json");
        let document: Document<Counts> =
            Document::new("counts", Arc::new(JsonFileBackend::new(&path)));

        document
            .update(|counts| {
                counts.insert("a".to_string(), 1);
                Ok::<_, StoreError>(())
            })
            .unwrap();
        document
            .update(|counts| {
                counts.insert("b".to_string(), 2);
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let on_disk: Counts =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
