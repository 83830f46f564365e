use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub onnx: OnnxConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub caption: CaptionConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    /// Overrides the default Hugging Face cache location.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnnxConfig {
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_bytes: u64,
}

/// Where a model's artifacts come from: a local directory when `model_dir`
/// is set, the hub repository otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSource {
    pub repo: String,
    #[serde(default = "default_revision")]
    pub revision: String,
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    #[serde(default = "default_caption_model")]
    pub model: ModelSource,
    /// Upper bound on the generated sequence, decoder start token included.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_detection_model")]
    pub model: ModelSource,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
}

impl ModelSource {
    pub fn hub(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            revision: default_revision(),
            model_dir: None,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            intra_threads: default_intra_threads(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_image_bytes(),
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            model: default_caption_model(),
            max_length: default_max_length(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model: default_detection_model(),
            threshold: default_threshold(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            num_predict: default_num_predict(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_intra_threads() -> usize {
    4
}

fn default_max_image_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_caption_model() -> ModelSource {
    ModelSource::hub("Xenova/vit-gpt2-image-captioning")
}

fn default_max_length() -> usize {
    50
}

fn default_detection_model() -> ModelSource {
    ModelSource::hub("Xenova/detr-resnet-50")
}

fn default_threshold() -> f32 {
    0.9
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "mistral:7b-instruct".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_num_predict() -> u32 {
    1000
}
