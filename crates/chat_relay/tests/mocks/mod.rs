pub mod caption_fetcher;
pub mod generator;
pub mod session_store;
pub mod summarizer;
