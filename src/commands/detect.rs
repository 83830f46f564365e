use crate::{
    Result,
    config::Config,
    invocation::{Command, blocking},
    vision::{Detection, Detector, ModelFiles, load_rgb, unique_labels},
};
use async_trait::async_trait;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "detect", disable_help_flag = true, disable_version_flag = true)]
pub struct DetectArgs {
    #[arg(allow_hyphen_values = true)]
    pub image_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectOutput {
    pub detections: Vec<Detection>,
    pub ingredients: Vec<String>,
}

impl DetectOutput {
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        let ingredients = unique_labels(&detections);
        Self {
            detections,
            ingredients,
        }
    }
}

pub struct DetectCommand;

#[async_trait]
impl Command for DetectCommand {
    type Args = DetectArgs;
    type Output = DetectOutput;

    const NAME: &'static str = "detect";
    const USAGE: &'static str = "Usage: detect <image_path>";

    async fn execute(&self, args: DetectArgs, config: &Config) -> Result<DetectOutput> {
        let max_bytes = config.image.max_bytes;
        let image = blocking(move || load_rgb(&args.image_path, max_bytes)).await?;

        let files = ModelFiles::fetch(&config.detection.model, &config.hub, Detector::FILES).await?;
        let detection_config = config.detection.clone();
        let threads = config.onnx.intra_threads;

        let detections = blocking(move || {
            let mut detector = Detector::load(&files, &detection_config, threads)?;
            detector.detect(&image)
        })
        .await?;

        let output = DetectOutput::from_detections(detections);
        info!(
            "Detected {} object(s), {} distinct label(s)",
            output.detections.len(),
            output.ingredients.len()
        );

        Ok(output)
    }
}
