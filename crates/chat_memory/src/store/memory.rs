use std::sync::{Mutex, MutexGuard};

use crate::{
    store::{SessionTracker, StorageError, TranscriptStore},
    Exchange,
};

/// Process-local session store, lost on shutdown.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    identifier: Option<String>,
    transcript: Vec<Exchange>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl SessionTracker for InMemorySessionStore {
    async fn current_identifier(&self) -> Result<Option<String>, StorageError> {
        Ok(self.state()?.identifier.clone())
    }

    async fn commit(&self, candidate: &str) -> Result<(), StorageError> {
        self.state()?.identifier = Some(candidate.to_string());
        Ok(())
    }
}

impl TranscriptStore for InMemorySessionStore {
    async fn read_all(&self) -> Result<String, StorageError> {
        Ok(self
            .state()?
            .transcript
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    async fn append(&self, exchange: &Exchange) -> Result<(), StorageError> {
        self.state()?.transcript.push(exchange.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.state()?.transcript.clear();
        Ok(())
    }
}
