use std::ops::Deref;

use crate::{
    parser::{parse_timed_text, select_caption_track, YtHtmlDocument},
    types::{CaptionSnippet, PlayerResponse},
    yt::{CaptionFetcher, ProviderError},
};

/// Fetches captions by scraping the watch page for its caption tracks.
#[derive(Debug, Clone)]
pub struct YtCaptionScraper {
    client: reqwest::Client,
    watch_url: String,
    language: String,
}

impl Default for YtCaptionScraper {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Deref for YtCaptionScraper {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl YtCaptionScraper {
    const WATCH_URL: &str = "https://www.youtube.com/watch";

    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            watch_url: Self::WATCH_URL.into(),
            language: "en".into(),
        }
    }

    pub fn with_watch_url(mut self, url: impl Into<String>) -> Self {
        self.watch_url = url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Loads the watch page html document
    #[tracing::instrument(skip(self))]
    async fn fetch_watch_page(&self, video_id: &str) -> Result<YtHtmlDocument, ProviderError> {
        let resp = self
            .get(&self.watch_url)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch watch page"))?;

        if !resp.status().is_success() {
            return Err(ProviderError::Api {
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.text().await?.into())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_timed_text(&self, base_url: &str) -> Result<String, ProviderError> {
        let separator = if base_url.contains('?') { '&' } else { '?' };

        let resp = self
            .get(format!("{base_url}{separator}fmt=json3"))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch timed text"))?;

        if !resp.status().is_success() {
            return Err(ProviderError::Api {
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.text().await?)
    }
}

impl CaptionFetcher for YtCaptionScraper {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionSnippet>, ProviderError> {
        let not_found = |reason: &str| ProviderError::NotFound {
            video_id: video_id.to_string(),
            reason: reason.to_string(),
        };

        let doc = self.fetch_watch_page(video_id).await?;
        let player = doc.to_json::<PlayerResponse>()?;

        if let Some(status) = player.playability_status.as_ref() {
            if status.status != "OK" {
                return Err(not_found(status.reason.as_deref().unwrap_or(&status.status)));
            }
        }

        let tracks = player
            .captions
            .map(|c| c.tracklist.caption_tracks)
            .unwrap_or_default();
        let track = select_caption_track(&tracks, &self.language)
            .ok_or_else(|| not_found("captions are disabled"))?;

        tracing::debug!(language = %track.language_code, generated = track.is_generated(), "Selected caption track");

        let body = self.fetch_timed_text(&track.base_url).await?;
        if body.trim().is_empty() {
            return Err(not_found("caption track is empty"));
        }

        let snippets = parse_timed_text(&body)?;
        tracing::info!(count = snippets.len(), "Fetched captions");

        Ok(snippets)
    }
}
