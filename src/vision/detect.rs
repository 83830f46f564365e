use super::{
    artifacts::ModelFiles,
    onnx::{OnnxModel, OutputTensor, f32_tensor, i64_tensor},
    preprocess::{ProcessorConfig, SizePolicy},
};
use crate::{Error, Result, config::DetectionConfig};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

const MODEL_FILE: &str = "onnx/model.onnx";
const CONFIG_FILE: &str = "config.json";
const PROCESSOR_FILE: &str = "preprocessor_config.json";

/// One reported object, rounded for output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
    /// `[x_min, y_min, x_max, y_max]` in original image pixels.
    #[serde(rename = "box")]
    pub bbox: [f64; 4],
}

/// A query that cleared the threshold, before label lookup and rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub score: f32,
    pub bbox: [f64; 4],
}

#[derive(Debug, Deserialize)]
struct DetrConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// DETR object detector.
pub struct Detector {
    model: OnnxModel,
    processor: ProcessorConfig,
    labels: HashMap<usize, String>,
    threshold: f32,
}

impl Detector {
    pub const FILES: &'static [&'static str] = &[MODEL_FILE, CONFIG_FILE, PROCESSOR_FILE];

    pub fn load(files: &ModelFiles, config: &DetectionConfig, intra_threads: usize) -> Result<Self> {
        let detr_config: DetrConfig =
            serde_json::from_str(&std::fs::read_to_string(files.path(CONFIG_FILE)?)?)?;

        let labels = detr_config
            .id2label
            .into_iter()
            .filter_map(|(id, label)| id.parse::<usize>().ok().map(|id| (id, label)))
            .collect::<HashMap<_, _>>();

        Ok(Self {
            model: OnnxModel::load(files.path(MODEL_FILE)?, intra_threads)?,
            processor: ProcessorConfig::from_file(files.path(PROCESSOR_FILE)?)?,
            labels,
            threshold: config.threshold,
        })
    }

    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        let target = image.dimensions();
        let pixels = self.processor.pixel_values(image, SizePolicy::ShortestEdge);
        let (height, width) = (pixels.height, pixels.width);

        let mut inputs = vec![("pixel_values", f32_tensor(pixels.shape(), pixels.data)?)];
        if self.model.accepts("pixel_mask") {
            inputs.push((
                "pixel_mask",
                i64_tensor([1, height, width], vec![1; height * width])?,
            ));
        }

        let outputs = self.model.run(inputs, &["logits", "pred_boxes"])?;
        let [logits, boxes]: [OutputTensor; 2] = outputs
            .try_into()
            .map_err(|_| Error::model("Detector must produce logits and pred_boxes"))?;

        let raw = post_process(
            &logits.data,
            &boxes.data,
            logits.dim(1)?,
            logits.dim(2)?,
            target,
            self.threshold,
        )?;

        debug!(
            "{} of {} queries above threshold {}",
            raw.len(),
            logits.dim(1)?,
            self.threshold
        );

        Ok(raw
            .into_iter()
            .map(|detection| detection.into_detection(&self.labels))
            .collect())
    }
}

impl RawDetection {
    pub fn into_detection(self, labels: &HashMap<usize, String>) -> Detection {
        let label = labels
            .get(&self.class_id)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", self.class_id));

        Detection {
            label,
            confidence: round_to(self.score as f64, 3),
            bbox: self.bbox.map(|v| round_to(v, 2)),
        }
    }
}

/// Turns DETR outputs into thresholded corner boxes.
///
/// `logits` is `[queries, labels]` where the last label is "no object";
/// `boxes` is `[queries, 4]` of normalized `(cx, cy, w, h)`. Boxes are scaled
/// to `target` given as `(width, height)`. Queries keep their model order.
pub fn post_process(
    logits: &[f32],
    boxes: &[f32],
    num_queries: usize,
    num_labels: usize,
    target: (u32, u32),
    threshold: f32,
) -> Result<Vec<RawDetection>> {
    if num_labels < 2 || logits.len() != num_queries * num_labels || boxes.len() != num_queries * 4 {
        return Err(Error::model(format!(
            "Unexpected detector output sizes: {} logits, {} box values for {} queries x {} labels",
            logits.len(),
            boxes.len(),
            num_queries,
            num_labels
        )));
    }

    let (width, height) = (target.0 as f64, target.1 as f64);

    let detections = logits
        .chunks_exact(num_labels)
        .zip(boxes.chunks_exact(4))
        .filter_map(|(row, bbox)| {
            let probs = softmax(row);
            let (class_id, score) = probs[..num_labels - 1]
                .iter()
                .copied()
                .enumerate()
                .fold((0, f32::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

            if score <= threshold {
                return None;
            }

            let [cx, cy, w, h] = [bbox[0], bbox[1], bbox[2], bbox[3]].map(|v| v as f64);
            Some(RawDetection {
                class_id,
                score,
                bbox: [
                    (cx - 0.5 * w) * width,
                    (cy - 0.5 * h) * height,
                    (cx + 0.5 * w) * width,
                    (cy + 0.5 * h) * height,
                ],
            })
        })
        .collect();

    Ok(detections)
}

/// Deduplicated labels, sorted.
pub fn unique_labels(detections: &[Detection]) -> Vec<String> {
    detections
        .iter()
        .map(|d| d.label.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn softmax(row: &[f32]) -> Vec<f32> {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = row.iter().map(|v| (v - max).exp()).collect::<Vec<_>>();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
