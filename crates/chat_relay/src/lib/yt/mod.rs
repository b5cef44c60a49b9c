pub mod scraper;

use std::future::Future;

use crate::types::CaptionSnippet;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("No captions available for video {video_id}: {reason}")]
    NotFound { video_id: String, reason: String },
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Caption provider responded with status {status}")]
    Api { status: u16 },
    #[error(transparent)]
    Parse(#[from] crate::error::Error),
}

/// Source of caption text for a video.
pub trait CaptionFetcher {
    fn fetch(
        &self,
        video_id: &str,
    ) -> impl Future<Output = Result<Vec<CaptionSnippet>, ProviderError>> + Send;
}
