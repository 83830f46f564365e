//! Local image models: captioning and object detection over ONNX Runtime.

mod artifacts;
mod caption;
mod detect;
mod onnx;
mod preprocess;

pub use artifacts::ModelFiles;
pub use caption::{Captioner, argmax, greedy_decode};
pub use detect::{Detection, Detector, RawDetection, post_process, round_to, unique_labels};
pub use preprocess::{
    PixelValues, ProcessorConfig, ResizeSpec, SizePolicy, check_image, load_rgb,
    shortest_edge_size,
};
