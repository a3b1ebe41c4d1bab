//! File-Backed Backend
//!
//! Keeps the working set in a [`MemoryBackend`] and rewrites a JSON object file
//! after every mutation, giving `localStorage`-like persistence across runs.
//! Each rewrite goes to a temporary file in the same directory which is then
//! renamed over the original, so a crash mid-write leaves the previous
//! contents intact. Write failures are logged and absorbed: the in-memory state stays
//! authoritative for the lifetime of the process.

use crate::backend::{Backend, MemoryBackend};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error};

/// A [`Backend`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    memory: MemoryBackend,
    /// False when the file existed but could not be loaded
    available: bool,
}

impl FileBackend {
    /// Opens the backend at `path`.
    ///
    /// A missing file starts empty. A file that cannot be read or is not a JSON
    /// object of strings leaves the backend unavailable, so a store will refuse
    /// to bind to it rather than overwrite the file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (memory, available) = match load(&path) {
            Ok(memory) => (memory, true),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load storage file");
                (MemoryBackend::new(), false)
            }
        };

        debug!(path = %path.display(), keys = memory.len(), "File backend opened");

        Self {
            path,
            memory,
            available,
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        let mut object = Map::new();
        for key in self.memory.keys() {
            if let Some(value) = self.memory.get(&key) {
                object.insert(key, Value::String(value));
            }
        }

        let result = serde_json::to_vec_pretty(&Value::Object(object))
            .map_err(io::Error::from)
            .and_then(|bytes| self.replace_file(&bytes));

        if let Err(e) = result {
            error!(path = %self.path.display(), error = %e, "Failed to write storage file");
        }
    }

    fn replace_file(&self, bytes: &[u8]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn load(path: &Path) -> anyhow::Result<MemoryBackend> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MemoryBackend::new()),
        Err(e) => return Err(e.into()),
    };

    let object: Map<String, Value> = serde_json::from_slice(&bytes)?;
    let memory = MemoryBackend::new();
    for (key, value) in object {
        match value {
            Value::String(s) => memory.set(&key, s),
            other => anyhow::bail!("entry {:?} is not a string: {}", key, other),
        }
    }
    Ok(memory)
}

impl Backend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.memory.get(key)
    }

    fn set(&self, key: &str, value: String) {
        self.memory.set(key, value);
        self.persist();
    }

    fn remove(&self, key: &str) {
        if self.memory.get(key).is_some() {
            self.memory.remove(key);
            self.persist();
        }
    }

    fn clear(&self) {
        self.memory.clear();
        self.persist();
    }

    fn keys(&self) -> Vec<String> {
        self.memory.keys()
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}
