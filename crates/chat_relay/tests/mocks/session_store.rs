use std::{
    io,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chat_memory::{Exchange, SessionTracker, StorageError, TranscriptStore};

/// A store whose every operation fails, as with an unwritable data directory.
#[derive(Clone, Default)]
pub struct BrokenSessionStore {
    pub attempts: Arc<AtomicUsize>,
}

impl BrokenSessionStore {
    fn fail<T>(&self) -> Result<T, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Io {
            path: PathBuf::from("/unwritable/conversation_history.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        })
    }
}

impl SessionTracker for BrokenSessionStore {
    async fn current_identifier(&self) -> Result<Option<String>, StorageError> {
        self.fail()
    }

    async fn commit(&self, _candidate: &str) -> Result<(), StorageError> {
        self.fail()
    }
}

impl TranscriptStore for BrokenSessionStore {
    async fn read_all(&self) -> Result<String, StorageError> {
        self.fail()
    }

    async fn append(&self, _exchange: &Exchange) -> Result<(), StorageError> {
        self.fail()
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.fail()
    }
}
