use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};

use crate::{
    store::{SessionTracker, StorageError, TranscriptStore},
    Exchange,
};

/// Session store backed by two plain text files in a data directory.
///
/// Writes are last-write-wins; callers serialize access.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    identifier_path: PathBuf,
    transcript_path: PathBuf,
}

impl FileSessionStore {
    pub const IDENTIFIER_FILE: &str = "last_video_url.txt";
    pub const TRANSCRIPT_FILE: &str = "conversation_history.txt";

    /// Creates the data directory if needed and points the store at it
    pub async fn init(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();

        fs::create_dir_all(data_dir)
            .await
            .map_err(io_error(data_dir))
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to create data directory"))?;

        Ok(FileSessionStore {
            identifier_path: data_dir.join(Self::IDENTIFIER_FILE),
            transcript_path: data_dir.join(Self::TRANSCRIPT_FILE),
        })
    }

    pub fn identifier_path(&self) -> &Path {
        &self.identifier_path
    }

    pub fn transcript_path(&self) -> &Path {
        &self.transcript_path
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads a file, treating a missing one as empty.
async fn read_or_empty(path: &Path) -> Result<String, StorageError> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(io_error(path)(e)),
    }
}

impl SessionTracker for FileSessionStore {
    #[tracing::instrument(skip(self))]
    async fn current_identifier(&self) -> Result<Option<String>, StorageError> {
        let contents = read_or_empty(&self.identifier_path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to load last video url"))?;

        let identifier = contents.trim();
        Ok((!identifier.is_empty()).then(|| identifier.to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn commit(&self, candidate: &str) -> Result<(), StorageError> {
        fs::write(&self.identifier_path, candidate)
            .await
            .map_err(io_error(&self.identifier_path))
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to save video url"))?;

        tracing::info!("Saved new video url");
        Ok(())
    }
}

impl TranscriptStore for FileSessionStore {
    #[tracing::instrument(skip(self))]
    async fn read_all(&self) -> Result<String, StorageError> {
        let history = read_or_empty(&self.transcript_path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to load conversation history"))?;

        tracing::debug!(chars = history.len(), "Loaded conversation history");
        Ok(history)
    }

    #[tracing::instrument(skip_all)]
    async fn append(&self, exchange: &Exchange) -> Result<(), StorageError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.transcript_path)
            .await
            .map_err(io_error(&self.transcript_path))?;

        file.write_all(exchange.to_string().as_bytes())
            .await
            .map_err(io_error(&self.transcript_path))?;
        file.flush()
            .await
            .map_err(io_error(&self.transcript_path))
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to save conversation"))?;

        tracing::debug!("Conversation saved to memory");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn clear(&self) -> Result<(), StorageError> {
        fs::write(&self.transcript_path, "")
            .await
            .map_err(io_error(&self.transcript_path))
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to clear conversation history"))?;

        tracing::info!("Conversation history cleared");
        Ok(())
    }
}
