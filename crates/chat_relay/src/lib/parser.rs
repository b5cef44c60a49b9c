//! # Yt Parser
//!
//! This module extracts caption metadata from a YouTube watch page and turns the
//! `json3` timed text feed into caption snippets.

use std::{ops::Deref, sync::LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{
    error::Error,
    types::{CaptionSnippet, CaptionTrack, TimedText},
};

static YT_PLAYER_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?s)var\s+ytInitialPlayerResponse\s*=\s*(\{.*?\});\s*(?:var\s|</script>)",
    )
    .unwrap()
});

static YT_VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?:[?&]v=|youtu\.be/|/embed/|/shorts/|/live/)([A-Za-z0-9_-]{11})(?:[?&#/]|$)",
    )
    .unwrap()
});

static YT_BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Extracts the 11 character video id from a bare id or any common YouTube URL form.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if YT_BARE_ID_RE.is_match(input) {
        return Some(input.to_string());
    }

    YT_VIDEO_ID_RE
        .captures(input)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Picks the caption track to fetch.
///
/// Preference order: manual track in `language`, any track whose language code
/// starts with `language` (regional and generated variants), then the first track.
pub fn select_caption_track<'a>(
    tracks: &'a [CaptionTrack],
    language: &str,
) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code == language && !t.is_generated())
        .or_else(|| tracks.iter().find(|t| t.language_code.starts_with(language)))
        .or_else(|| tracks.first())
}

/// Parses a `fmt=json3` timed text document.
///
/// # Returns
/// * `Ok(Vec<CaptionSnippet>)` with one snippet per non-blank event, in feed order.
/// * `Err(Error::Json)` if the document is not valid timed text JSON.
#[tracing::instrument(skip_all)]
pub fn parse_timed_text(json: &str) -> Result<Vec<CaptionSnippet>, Error> {
    let timed_text = serde_json::from_str::<TimedText>(json)?;

    let snippets = timed_text
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();

            // XXX: newline-only events are window markers, not captions
            if text.is_empty() {
                return None;
            }

            Some(CaptionSnippet {
                start: event.t_start_ms.map(|ms| ms as f64 / 1000.0),
                duration: event.d_duration_ms.map(|ms| ms as f64 / 1000.0),
                text: text.to_string(),
            })
        })
        .collect();

    Ok(snippets)
}

pub struct YtHtmlDocument(String);

impl Deref for YtHtmlDocument {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl YtHtmlDocument {
    pub fn to_json<T>(&self) -> Result<T, crate::error::Error>
    where
        T: DeserializeOwned,
    {
        YT_PLAYER_RESPONSE_RE
            .captures(self)
            .and_then(|cap| cap.get(1))
            .and_then(|m| serde_json::from_str(m.as_str()).ok())
            .ok_or(Error::ParseError(
                "Failed to extract ytInitialPlayerResponse from the page's script tag",
            ))
    }
}

impl From<String> for YtHtmlDocument {
    fn from(value: String) -> Self {
        YtHtmlDocument(value)
    }
}
