use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Result alias for local store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Operation attempted on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    /// Reading the slot.
    Read,
    /// Writing the slot.
    Write,
    /// Emptying the slot.
    Remove,
}

impl fmt::Display for SlotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotAction::Read => "read",
            SlotAction::Write => "write",
            SlotAction::Remove => "remove",
        })
    }
}

/// Failure of the local slot store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store directory could not be created.
    #[error("cannot open local store at `{}`", .path.display())]
    Open {
        /// Requested store directory.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// A slot operation failed.
    #[error("failed to {action} slot `{key}`")]
    Slot {
        /// Slot name.
        key: String,
        /// Operation that failed.
        action: SlotAction,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub(crate) fn slot(key: &str, action: SlotAction, source: io::Error) -> Self {
        StorageError::Slot {
            key: key.to_string(),
            action,
            source,
        }
    }
}
