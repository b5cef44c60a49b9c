use std::sync::{Arc, Mutex};

use chat_relay::{
    types::CaptionSnippet,
    yt::{CaptionFetcher, ProviderError},
};

#[derive(Clone, Default)]
pub struct MockCaptionFetcher {
    pub snippets: Vec<CaptionSnippet>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub missing: bool,
    pub upstream_status: Option<u16>,
}

impl MockCaptionFetcher {
    pub fn with_lines(lines: &[&str]) -> Self {
        let snippets = lines
            .iter()
            .enumerate()
            .map(|(i, text)| CaptionSnippet {
                start: Some(i as f64 * 2.0),
                duration: Some(2.0),
                text: text.to_string(),
            })
            .collect();

        Self {
            snippets,
            ..Default::default()
        }
    }

    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Default::default()
        }
    }

    pub fn upstream_error(status: u16) -> Self {
        Self {
            upstream_status: Some(status),
            ..Default::default()
        }
    }
}

impl CaptionFetcher for MockCaptionFetcher {
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionSnippet>, ProviderError> {
        self.calls.lock().unwrap().push(video_id.to_string());

        if self.missing {
            return Err(ProviderError::NotFound {
                video_id: video_id.to_string(),
                reason: "captions disabled".into(),
            });
        }
        if let Some(status) = self.upstream_status {
            return Err(ProviderError::Api { status });
        }

        Ok(self.snippets.clone())
    }
}
