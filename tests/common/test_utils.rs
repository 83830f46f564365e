use image::{Rgb, RgbImage};
use recipesnap::config::LlmConfig;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Output of one spawned command.
#[derive(Debug)]
pub struct CommandRun {
    pub code: Option<i32>,
    pub stdout_lines: Vec<String>,
    pub stderr: String,
}

impl CommandRun {
    /// Parses the single stdout line, failing the test if there is not exactly one.
    pub fn json(&self) -> Value {
        assert_eq!(
            self.stdout_lines.len(),
            1,
            "expected exactly one stdout line, got {:?} (stderr: {})",
            self.stdout_lines,
            self.stderr
        );
        serde_json::from_str(&self.stdout_lines[0]).expect("stdout line is not JSON")
    }
}

pub fn create_test_llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        base_url: base_url.to_string(),
        ..LlmConfig::default()
    }
}

/// Writes `config.yaml` into `dir` and returns its path.
pub fn write_config(dir: &TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Writes a small solid-color PNG into `dir`.
pub fn write_test_image(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(8, 6, Rgb([250, 250, 240]))
        .save(&path)
        .unwrap();
    path
}

/// Writes a `width` x `height` PNG with a soft diagonal gradient, something
/// a captioner can describe but a detector finds no objects in.
pub fn write_gradient_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_fn(width, height, |x, y| {
        let shade = (200 + (x + y) * 40 / (width + height)) as u8;
        Rgb([shade, shade, shade])
    })
    .save(&path)
    .unwrap();
    path
}

/// Runs one of the crate's binaries with an isolated environment.
pub async fn run_command(binary: &str, args: &[&str], config_path: &Path) -> CommandRun {
    run_command_with_env(binary, args, config_path, &[]).await
}

pub async fn run_command_with_env(
    binary: &str,
    args: &[&str],
    config_path: &Path,
    envs: &[(&str, &str)],
) -> CommandRun {
    let output = tokio::process::Command::new(binary)
        .args(args)
        .env("CONFIG_PATH", config_path)
        .env_remove("OLLAMA_HOST")
        .env_remove("RUST_LOG")
        .envs(envs.iter().copied())
        .output()
        .await
        .expect("failed to spawn command");

    CommandRun {
        code: output.status.code(),
        stdout_lines: String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Assertion helper for failure envelopes
pub fn assert_failure(value: &Value, expected_error: &str) {
    assert_eq!(value["success"], Value::Bool(false), "envelope: {}", value);
    let error = value["error"]
        .as_str()
        .expect("failure envelope carries an error");
    assert!(
        error.contains(expected_error),
        "Expected error containing '{}', got: {}",
        expected_error,
        error
    );
}
