use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chat_relay::{GenerationConfig, TextGenerator};

/// Answers `Answer to: <question>` unless a fixed reply or failure is set.
#[derive(Clone, Default)]
pub struct MockGenerator {
    pub reply: Option<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
    pub delay: Option<Duration>,
}

impl MockGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    pub fn answering() -> Self {
        Self::default()
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// The question embedded in a prompt built by the chat service.
pub fn question_of(prompt: &str) -> &str {
    prompt
        .split("User's new question: ")
        .nth(1)
        .and_then(|rest| rest.split("\n\n").next())
        .unwrap_or_default()
}

impl TextGenerator for MockGenerator {
    type Error = anyhow::Error;

    async fn generate(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String, Self::Error> {
        self.calls.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        Ok(match &self.reply {
            Some(reply) => reply.clone(),
            None => format!("Answer to: {}", question_of(prompt)),
        })
    }
}
