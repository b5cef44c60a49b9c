//! Wire types for the YouTube watch page player response and its timed text feed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: Option<PlayabilityStatus>,
    pub captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatus {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    pub tracklist: CaptionTracklist,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTracklist {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
pub struct TimedText {
    #[serde(default)]
    pub events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedTextEvent {
    pub t_start_ms: Option<u64>,
    pub d_duration_ms: Option<u64>,
    #[serde(default)]
    pub segs: Vec<TimedTextSegment>,
}

#[derive(Debug, Deserialize)]
pub struct TimedTextSegment {
    #[serde(default)]
    pub utf8: String,
}

/// One captioned line, timings in seconds when the provider has them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionSnippet {
    pub start: Option<f64>,
    pub duration: Option<f64>,
    pub text: String,
}
