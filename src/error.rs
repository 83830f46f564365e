use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image not found: {}", .path.display())]
    ImageNotFound { path: PathBuf },

    #[error("Image too large: {size} bytes exceeds limit of {limit} bytes")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Model hub error: {0}")]
    Hub(#[from] hf_hub::api::tokio::ApiError),

    #[error("Ollama API error: {status}")]
    Api { status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_api_error_mentions_status() {
        let err = Error::Api { status: 503 };
        assert_eq!(err.to_string(), "Ollama API error: 503");
    }

    #[test]
    fn test_image_not_found_mentions_path() {
        let err = Error::ImageNotFound {
            path: PathBuf::from("/tmp/missing-fridge.jpg"),
        };
        assert_eq!(err.to_string(), "Image not found: /tmp/missing-fridge.jpg");
    }

    #[test]
    fn test_usage_error_is_verbatim() {
        assert_eq!(
            Error::usage("Usage: caption <image_path>").to_string(),
            "Usage: caption <image_path>"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }
}
