use std::{future::Future, path::PathBuf};

use crate::Exchange;

pub mod file;
pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Session store lock poisoned")]
    Poisoned,
}

/// Reset rule for a candidate identifier against the stored one.
///
/// Only a present, non-blank candidate that differs from the stored value
/// triggers a reset. A request without an identifier never does.
pub fn needs_reset(current: Option<&str>, candidate: Option<&str>) -> bool {
    match candidate.map(str::trim) {
        Some(candidate) if !candidate.is_empty() => current != Some(candidate),
        _ => false,
    }
}

/// Single-slot holder of the last seen resource identifier.
pub trait SessionTracker {
    fn current_identifier(
        &self,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn commit(&self, candidate: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn should_reset(
        &self,
        candidate: Option<&str>,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send
    where
        Self: Sync,
    {
        async move {
            let current = self.current_identifier().await?;
            Ok(needs_reset(current.as_deref(), candidate))
        }
    }
}

/// Append-only log of exchanges, cleared as a whole.
pub trait TranscriptStore {
    fn read_all(&self) -> impl Future<Output = Result<String, StorageError>> + Send;

    fn append(&self, exchange: &Exchange)
        -> impl Future<Output = Result<(), StorageError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Everything a chat session needs from persistence.
pub trait SessionStore: SessionTracker + TranscriptStore {}

impl<T: SessionTracker + TranscriptStore> SessionStore for T {}

impl<T: SessionTracker + Send + Sync> SessionTracker for &T {
    async fn current_identifier(&self) -> Result<Option<String>, StorageError> {
        (**self).current_identifier().await
    }

    async fn commit(&self, candidate: &str) -> Result<(), StorageError> {
        (**self).commit(candidate).await
    }
}

impl<T: TranscriptStore + Send + Sync> TranscriptStore for &T {
    async fn read_all(&self) -> Result<String, StorageError> {
        (**self).read_all().await
    }

    async fn append(&self, exchange: &Exchange) -> Result<(), StorageError> {
        (**self).append(exchange).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        (**self).clear().await
    }
}
