mod chat;
pub mod document;
mod error;
mod llm;
pub mod parser;
pub mod server;
pub mod tracing;
pub mod types;
pub mod yt;

pub use chat::{builder::ChatServiceBuilder, ChatError, ChatRequest, ChatService};
pub use error::Error;
pub use llm::gemini;
pub use llm::{
    generator::{GenerationConfig, TextGenerator},
    summarizer::{Summarizer, SummaryResponse},
};
