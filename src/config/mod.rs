mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, io::ErrorKind};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;

/// Loads the configuration named by `CONFIG_PATH` (default `config.yaml`).
///
/// A missing file yields the built-in defaults. Environment overrides are
/// applied before validation.
pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(config_str) => parse(&config_str)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No configuration at {}, using defaults", config_path);
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    config.apply_overrides(|key| env::var(key).ok());
    config.validate()?;

    Ok(config)
}

pub fn parse(config_str: &str) -> Result<Config> {
    // An empty document deserializes to null rather than an empty mapping.
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

impl Config {
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty()) {
            let host = host.trim();
            self.llm.base_url = if host.contains("://") {
                host.to_string()
            } else {
                format!("http://{host}")
            };
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_log_level(&self.logs.level)?;

        if !(0.0..=1.0).contains(&self.detection.threshold) {
            return Err(Error::config(format!(
                "detection.threshold must be within [0, 1], got {}",
                self.detection.threshold
            )));
        }
        if self.caption.max_length < 2 {
            return Err(Error::config(format!(
                "caption.max_length must be at least 2, got {}",
                self.caption.max_length
            )));
        }
        if self.onnx.intra_threads == 0 {
            return Err(Error::config("onnx.intra_threads must be positive"));
        }
        Ok(())
    }
}

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level.parse::<LevelFilter>().map_err(|_| {
        Error::config(format!(
            "Invalid log level: '{}'. Valid levels: off, error, warn, info, debug, trace",
            level
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_match_fixed_hyperparameters() {
        let config = Config::default();

        assert_eq!(config.caption.max_length, 50);
        assert_eq!(config.detection.threshold, 0.9);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.llm.top_p, 0.9);
        assert_eq!(config.llm.num_predict, 1000);
        assert_eq!(config.llm.model, "mistral:7b-instruct");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.image.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.caption.model.repo, "Xenova/vit-gpt2-image-captioning");
        assert_eq!(config.detection.model.repo, "Xenova/detr-resnet-50");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = parse(
            r#"
logs:
  level: debug
detection:
  threshold: 0.75
  model:
    repo: local/detr
    model_dir: /opt/models/detr
"#,
        )
        .unwrap();

        assert_eq!(config.logs.level, "debug");
        assert_eq!(config.detection.threshold, 0.75);
        assert_eq!(config.detection.model.revision, "main");
        assert_eq!(
            config.detection.model.model_dir,
            Some(PathBuf::from("/opt/models/detr"))
        );
        assert_eq!(config.caption.max_length, 50);
        assert_eq!(config.llm.num_predict, 1000);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = parse("  \n").unwrap();
        assert_eq!(config.logs.level, "warn");
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let result = parse("llm: [unterminated");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[test]
    fn test_ollama_host_override() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "OLLAMA_HOST").then(|| "10.0.0.5:11434".to_string()));
        assert_eq!(config.llm.base_url, "http://10.0.0.5:11434");

        config.apply_overrides(|_| Some("https://ollama.internal".to_string()));
        assert_eq!(config.llm.base_url, "https://ollama.internal");

        config.apply_overrides(|_| None);
        assert_eq!(config.llm.base_url, "https://ollama.internal");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.logs.level = "chatty".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level: 'chatty'"));

        let mut config = Config::default();
        config.detection.threshold = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.caption.max_length = 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.onnx.intra_threads = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
