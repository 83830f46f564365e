use crate::config::LlmConfig;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
    pub top_p: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl GenerateRequest {
    /// Non-streaming request using the sampling parameters from `config`.
    pub fn new(config: &LlmConfig, prompt: impl Into<String>) -> Self {
        Self {
            model: config.model.clone(),
            prompt: prompt.into(),
            stream: false,
            options: GenerateOptions {
                temperature: config.temperature,
                num_predict: config.num_predict,
                top_p: config.top_p,
            },
        }
    }
}
