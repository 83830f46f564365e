use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Self {
        let endpoint = format!("{}/api/generate", config.base_url.trim_end_matches('/'));

        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        debug!(
            "Sending generate request to {} for model {} ({} prompt chars)",
            self.endpoint,
            request.model,
            request.prompt.len()
        );

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Api {
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = response.json().await?;

        debug!(
            "Received generate response (done: {:?}, eval_count: {:?})",
            body.done, body.eval_count
        );

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create_test_config() -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = OllamaClient::new(&create_test_config());
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_generate_request_wire_format() {
        let request = GenerateRequest::new(&LlmConfig::default(), "Recipe:");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], json!("mistral:7b-instruct"));
        assert_eq!(value["prompt"], json!("Recipe:"));
        assert_eq!(value["stream"], json!(false));
        assert_eq!(value["options"]["num_predict"], json!(1000));
        assert!((value["options"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((value["options"]["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_generate_response_tolerates_missing_fields() {
        let response: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert_eq!(response.response, None);
        assert_eq!(response.done, Some(true));

        let response: GenerateResponse = serde_json::from_value(json!({
            "model": "mistral:7b-instruct",
            "response": "Omelette",
            "done": true,
            "eval_count": 212,
            "context": [1, 2, 3]
        }))
        .unwrap();
        assert_eq!(response.response.as_deref(), Some("Omelette"));
        assert_eq!(response.eval_count, Some(212));
    }
}
