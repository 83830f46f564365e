use super::DetectOutput;
use crate::{
    Result,
    config::Config,
    invocation::{Command, blocking},
    vision::{Captioner, Detection, Detector, ModelFiles, load_rgb},
};
use async_trait::async_trait;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "analyze", disable_help_flag = true, disable_version_flag = true)]
pub struct AnalyzeArgs {
    #[arg(allow_hyphen_values = true)]
    pub image_path: PathBuf,
}

/// Caption and detections for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeOutput {
    pub caption: String,
    pub ingredients: Vec<String>,
    pub detections: Vec<Detection>,
}

pub struct AnalyzeCommand;

#[async_trait]
impl Command for AnalyzeCommand {
    type Args = AnalyzeArgs;
    type Output = AnalyzeOutput;

    const NAME: &'static str = "analyze";
    const USAGE: &'static str = "Usage: analyze <image_path>";

    async fn execute(&self, args: AnalyzeArgs, config: &Config) -> Result<AnalyzeOutput> {
        let max_bytes = config.image.max_bytes;
        let image = blocking(move || load_rgb(&args.image_path, max_bytes)).await?;

        let caption_files =
            ModelFiles::fetch(&config.caption.model, &config.hub, Captioner::FILES).await?;
        let detection_files =
            ModelFiles::fetch(&config.detection.model, &config.hub, Detector::FILES).await?;
        let caption_config = config.caption.clone();
        let detection_config = config.detection.clone();
        let threads = config.onnx.intra_threads;

        let (caption, detections) = blocking(move || {
            let caption = Captioner::load(&caption_files, &caption_config, threads)?.caption(&image)?;
            let detections =
                Detector::load(&detection_files, &detection_config, threads)?.detect(&image)?;
            Ok((caption, detections))
        })
        .await?;

        let DetectOutput {
            detections,
            ingredients,
        } = DetectOutput::from_detections(detections);

        info!(
            "Analyzed image: {} object(s), caption of {} chars",
            detections.len(),
            caption.len()
        );

        Ok(AnalyzeOutput {
            caption,
            ingredients,
            detections,
        })
    }
}
