use chat_memory::SessionStore;
use tokio::sync::Mutex;

use crate::{ChatService, GenerationConfig, TextGenerator};

pub struct ChatServiceBuilder<S = (), G = ()> {
    store: S,
    generator: G,
    generation_config: GenerationConfig,
}

impl ChatServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: (),
            generator: (),
            generation_config: GenerationConfig::default(),
        }
    }
}

impl Default for ChatServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, G> ChatServiceBuilder<S, G> {
    pub fn store<S2: SessionStore + Send + Sync>(self, store: S2) -> ChatServiceBuilder<S2, G> {
        ChatServiceBuilder {
            store,
            generator: self.generator,
            generation_config: self.generation_config,
        }
    }

    pub fn generator<G2: TextGenerator + Send + Sync>(
        self,
        generator: G2,
    ) -> ChatServiceBuilder<S, G2> {
        ChatServiceBuilder {
            store: self.store,
            generator,
            generation_config: self.generation_config,
        }
    }

    pub fn generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = generation_config;
        self
    }
}

impl<S, G> ChatServiceBuilder<S, G>
where
    S: SessionStore + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    pub fn build(self) -> ChatService<S, G> {
        ChatService {
            store: self.store,
            generator: self.generator,
            generation_config: self.generation_config,
            session_lock: Mutex::new(()),
        }
    }
}
