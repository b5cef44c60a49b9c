use reqwest::Client;
use serde::Deserialize;

use crate::{GenerationConfig, Summarizer, SummaryResponse, TextGenerator};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Prompt blocked: {reason}")]
    Blocked { reason: String },
    #[error("No content in response")]
    EmptyResponse,
}

impl GeminiClient {
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
    const SUMMARIZE_PROMPT: &str = include_str!("./prompts/summarize_0.txt");
    const HARM_CATEGORIES: [&str; 4] = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// API key with everything but the first and last four characters hidden
    pub fn masked_key(&self) -> String {
        let chars = self.api_key.chars().collect::<Vec<_>>();
        if chars.len() <= 8 {
            return "****".into();
        }
        let head = chars[..4].iter().collect::<String>();
        let tail = chars[chars.len() - 4..].iter().collect::<String>();
        format!("{head}...{tail}")
    }

    pub async fn send_generate_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let safety_settings = Self::HARM_CATEGORIES
            .iter()
            .map(|category| {
                serde_json::json!({
                    "category": category,
                    "threshold": "BLOCK_MEDIUM_AND_ABOVE"
                })
            })
            .collect::<Vec<_>>();

        let body = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": config,
            "safetySettings": safety_settings
        });

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let raw = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or(raw);
            return Err(GeminiError::Api { status, message });
        }

        Ok(resp.json::<GenerateContentResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, or why there is none
    pub fn into_text(self) -> Result<String, GeminiError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GeminiError::Blocked { reason });
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(GeminiError::EmptyResponse)?;

        let text = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        match (text.is_empty(), candidate.finish_reason) {
            (false, _) => Ok(text),
            (true, Some(reason)) if reason == "SAFETY" => Err(GeminiError::Blocked { reason }),
            (true, _) => Err(GeminiError::EmptyResponse),
        }
    }
}

impl TextGenerator for GeminiClient {
    type Error = GeminiError;

    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GeminiError> {
        self.send_generate_request(prompt, config)
            .await?
            .into_text()
            .inspect_err(|e| tracing::error!(error = %e, "Failed to generate content"))
    }
}

impl Summarizer for GeminiClient {
    type Error = GeminiError;

    async fn summarize(&self, content: &str) -> Result<SummaryResponse, GeminiError> {
        let config = GenerationConfig {
            temperature: 0.3,
            ..Default::default()
        };
        let prompt = format!("{}\n{content}", Self::SUMMARIZE_PROMPT);

        let summary = self
            .generate(&prompt, &config)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        Ok(SummaryResponse { summary })
    }
}
