//! Key/value slot storage holding the claimed súmula between navigations.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use dashmap::DashMap;

use crate::dao::storage::{SlotAction, StorageError, StorageResult};

/// Slot under which the currently claimed súmula is kept.
pub const CURRENT_SUMULA_SLOT: &str = "current_sumula";

/// Abstraction over the local persisted state of the client.
pub trait LocalStore: Send + Sync {
    /// Value stored under `key`, or `None` when the slot is empty.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Overwrite the slot.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Empty the slot. Removing an empty slot succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Store keeping one `<key>.json` file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        if let Err(source) = fs::create_dir_all(&root) {
            return Err(StorageError::Open { path: root, source });
        }
        Ok(Self { root })
    }

    /// Directory holding the slot files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::slot(key, SlotAction::Read, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::write(self.slot_path(key), value)
            .map_err(|source| StorageError::slot(key, SlotAction::Write, source))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.slot_path(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                Err(StorageError::slot(key, SlotAction::Remove, err))
            }
            _ => Ok(()),
        }
    }
}

/// Process-local store, used by tests and by callers that do not need the
/// súmula to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: DashMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).map(|value| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}
