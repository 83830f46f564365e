use async_trait::async_trait;
use recipesnap::{
    Error, Result,
    llm::{GenerateRequest, GenerateResponse, GenerationClient},
};
use std::sync::{Arc, Mutex};

/// Mock generation client for testing
#[derive(Debug)]
pub struct MockGenerationClient {
    pub responses: Arc<Mutex<Vec<GenerateResponse>>>,
    pub requests: Arc<Mutex<Vec<GenerateRequest>>>,
    pub status: Option<u16>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            status: None,
        }
    }

    pub fn with_responses(self, responses: Vec<GenerateResponse>) -> Self {
        *self.responses.lock().unwrap() = responses;
        self
    }

    /// Every call fails as if the service answered with `status`.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn get_requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.requests.lock().unwrap().push(request);

        if let Some(status) = self.status {
            return Err(Error::Api { status });
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::internal("No more mock responses available"));
        }

        Ok(responses.remove(0))
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_mock_generate_response(text: &str) -> GenerateResponse {
    GenerateResponse {
        model: Some("mistral:7b-instruct".to_string()),
        response: Some(text.to_string()),
        done: Some(true),
        eval_count: Some(42),
    }
}
