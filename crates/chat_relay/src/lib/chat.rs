pub mod builder;

use chat_memory::{needs_reset, Exchange, SessionStore};
use tokio::sync::Mutex;

use crate::{GenerationConfig, TextGenerator};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("I'm sorry, I encountered an error: {cause}")]
    Generation { cause: String },
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub prompt: String,
    /// Identifier of the resource the conversation is about (a video URL).
    pub active_resource_id: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            active_resource_id: None,
        }
    }

    pub fn with_active_resource(mut self, id: impl Into<String>) -> Self {
        self.active_resource_id = Some(id.into());
        self
    }
}

// Conversation orchestrator: session reset, context, generation and transcript
#[derive(Debug)]
pub struct ChatService<S, G>
where
    S: SessionStore + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    store: S,
    generator: G,
    generation_config: GenerationConfig,
    /// Held from the reset check until the exchange is appended, so concurrent
    /// requests cannot interleave a clear with another request's append.
    session_lock: Mutex<()>,
}

impl<S, G> ChatService<S, G>
where
    S: SessionStore + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    const INSTRUCTION: &str = include_str!("./llm/prompts/chat_0.txt");

    pub fn new(store: S, generator: G) -> Self {
        ChatService {
            store,
            generator,
            generation_config: GenerationConfig::default(),
            session_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }

    /// Builds the prompt sent to the generator from prior exchanges and the new question
    pub fn build_prompt(history: &str, prompt: &str) -> String {
        format!(
            "Previous conversation:\n{}\n\nUser's new question: {prompt}\n\n{}",
            history.trim_end(),
            Self::INSTRUCTION.trim_end()
        )
    }

    /// Clears the transcript and records `candidate` when the active resource changed.
    ///
    /// Storage failures are logged and treated as an empty store.
    #[tracing::instrument(skip(self))]
    async fn sync_session(&self, candidate: Option<&str>) -> bool {
        let current = self.store.current_identifier().await.unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "Failed to load session identifier, treating as absent");
            None
        });

        let Some(candidate) = candidate else {
            return false;
        };
        if !needs_reset(current.as_deref(), Some(candidate)) {
            return false;
        }

        tracing::info!("Active video changed, clearing conversation history");
        if let Err(e) = self.store.clear().await {
            tracing::error!(error = ?e, "Failed to clear conversation history");
        }
        if let Err(e) = self.store.commit(candidate).await {
            tracing::error!(error = ?e, "Failed to save session identifier");
        }

        true
    }

    #[tracing::instrument(skip_all, fields(prompt = %preview(&request.prompt, 50)))]
    pub async fn chat(&self, request: ChatRequest) -> Result<String, ChatError> {
        if request.prompt.trim().is_empty() {
            return Err(ChatError::Validation("Prompt not provided"));
        }

        let active = request
            .active_resource_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let _session = self.session_lock.lock().await;

        self.sync_session(active).await;

        let history = self.store.read_all().await.unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "Failed to load conversation history, continuing without context");
            String::new()
        });

        tracing::info!(history_chars = history.len(), "Generating reply");
        let reply = self
            .generator
            .generate(
                &Self::build_prompt(&history, &request.prompt),
                &self.generation_config,
            )
            .await
            .map_err(|e| ChatError::Generation {
                cause: e.to_string(),
            })
            .inspect_err(|e| tracing::error!(error = %e, "Failed to generate reply"))?;

        tracing::info!(reply = %preview(&reply, 50), "Reply generated");

        if let Err(e) = self
            .store
            .append(&Exchange::new(request.prompt, reply.as_str()))
            .await
        {
            tracing::error!(error = ?e, "Failed to save conversation");
        }

        Ok(reply)
    }
}

/// First `max_chars` characters of `text`, for log lines
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
