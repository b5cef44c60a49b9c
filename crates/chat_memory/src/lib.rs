//! # Chat Memory
//!
//! Persistence for conversation sessions: a single-slot session identifier
//! (the last active video URL) and an append-only transcript of exchanges
//! used as prompt context.
//!
//! Two stores share one contract: [`FileSessionStore`] writes plain text files
//! in a data directory, [`InMemorySessionStore`] keeps everything in process.

mod domain;
mod store;

pub use domain::Exchange;
pub use store::file::FileSessionStore;
pub use store::memory::InMemorySessionStore;
pub use store::{needs_reset, SessionStore, SessionTracker, StorageError, TranscriptStore};
