use std::{
    fmt::{Debug, Display},
    future::Future,
};

use serde::Serialize;

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

pub trait TextGenerator {
    type Error: Debug + Display + Send;

    fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
