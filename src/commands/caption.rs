use crate::{
    Result,
    config::Config,
    invocation::{Command, blocking},
    vision::{Captioner, ModelFiles, load_rgb},
};
use async_trait::async_trait;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "caption", disable_help_flag = true, disable_version_flag = true)]
pub struct CaptionArgs {
    #[arg(allow_hyphen_values = true)]
    pub image_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionOutput {
    pub caption: String,
}

pub struct CaptionCommand;

#[async_trait]
impl Command for CaptionCommand {
    type Args = CaptionArgs;
    type Output = CaptionOutput;

    const NAME: &'static str = "caption";
    const USAGE: &'static str = "Usage: caption <image_path>";

    async fn execute(&self, args: CaptionArgs, config: &Config) -> Result<CaptionOutput> {
        let max_bytes = config.image.max_bytes;
        let image = blocking(move || load_rgb(&args.image_path, max_bytes)).await?;

        let files = ModelFiles::fetch(&config.caption.model, &config.hub, Captioner::FILES).await?;
        let caption_config = config.caption.clone();
        let threads = config.onnx.intra_threads;

        let caption = blocking(move || {
            let mut captioner = Captioner::load(&files, &caption_config, threads)?;
            captioner.caption(&image)
        })
        .await?;

        info!("Generated caption of {} chars", caption.len());

        Ok(CaptionOutput { caption })
    }
}
