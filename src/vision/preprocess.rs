use crate::{Error, Result};
use image::{
    RgbImage,
    imageops::{self, FilterType},
};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Fails early when `path` is missing or larger than `max_bytes`.
pub fn check_image(path: &Path, max_bytes: u64) -> Result<()> {
    if !path.is_file() {
        return Err(Error::ImageNotFound {
            path: path.to_path_buf(),
        });
    }

    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(Error::ImageTooLarge {
            size,
            limit: max_bytes,
        });
    }

    Ok(())
}

/// Decodes the image at `path` into 8-bit RGB.
pub fn load_rgb(path: &Path, max_bytes: u64) -> Result<RgbImage> {
    check_image(path, max_bytes)?;

    let image = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    debug!(
        "Decoded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );

    Ok(image.to_rgb8())
}

/// How a bare integer `size` in the processor config is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePolicy {
    /// Square output of `size x size`.
    Exact,
    /// Shortest edge becomes `size`, longest edge capped by `max_size`.
    ShortestEdge,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResizeSpec {
    Square(u32),
    Exact {
        height: u32,
        width: u32,
    },
    Edges {
        shortest_edge: u32,
        #[serde(default)]
        longest_edge: Option<u32>,
    },
}

/// The subset of a `preprocessor_config.json` needed to build pixel values.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default = "default_true")]
    pub do_resize: bool,
    #[serde(default = "default_true")]
    pub do_rescale: bool,
    #[serde(default = "default_true")]
    pub do_normalize: bool,
    #[serde(default = "default_rescale_factor")]
    pub rescale_factor: f32,
    pub image_mean: [f32; 3],
    pub image_std: [f32; 3],
    pub size: ResizeSpec,
    #[serde(default)]
    pub max_size: Option<u32>,
}

/// Channel-first `[1, 3, height, width]` pixel data.
#[derive(Debug, Clone)]
pub struct PixelValues {
    pub data: Vec<f32>,
    pub height: usize,
    pub width: usize,
}

impl PixelValues {
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height, self.width]
    }
}

impl ProcessorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Output `(width, height)` for an input of `width x height`.
    pub fn target_size(&self, width: u32, height: u32, policy: SizePolicy) -> (u32, u32) {
        if !self.do_resize {
            return (width, height);
        }

        match (&self.size, policy) {
            (ResizeSpec::Square(size), SizePolicy::Exact) => (*size, *size),
            (ResizeSpec::Square(size), SizePolicy::ShortestEdge) => {
                shortest_edge_size(width, height, *size, self.max_size)
            }
            (ResizeSpec::Exact { height: h, width: w }, _) => (*w, *h),
            (
                ResizeSpec::Edges {
                    shortest_edge,
                    longest_edge,
                },
                _,
            ) => shortest_edge_size(
                width,
                height,
                *shortest_edge,
                longest_edge.or(self.max_size),
            ),
        }
    }

    pub fn pixel_values(&self, image: &RgbImage, policy: SizePolicy) -> PixelValues {
        let (width, height) = image.dimensions();
        let (target_w, target_h) = self.target_size(width, height, policy);

        let resized;
        let image = if (target_w, target_h) != (width, height) {
            resized = imageops::resize(image, target_w, target_h, FilterType::Triangle);
            &resized
        } else {
            image
        };

        let (width, height) = (image.width() as usize, image.height() as usize);
        let plane = width * height;
        let mut data = vec![0.0f32; 3 * plane];

        for (x, y, pixel) in image.enumerate_pixels() {
            let offset = y as usize * width + x as usize;
            for channel in 0..3 {
                let mut value = pixel[channel] as f32;
                if self.do_rescale {
                    value *= self.rescale_factor;
                }
                if self.do_normalize {
                    value = (value - self.image_mean[channel]) / self.image_std[channel];
                }
                data[channel * plane + offset] = value;
            }
        }

        PixelValues {
            data,
            height,
            width,
        }
    }
}

/// Aspect-preserving size whose shorter side is `shortest`, shrunk further
/// when the longer side would exceed `longest`. Returns `(width, height)`.
pub fn shortest_edge_size(
    width: u32,
    height: u32,
    shortest: u32,
    longest: Option<u32>,
) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let mut size = shortest as f64;

    if let Some(max_size) = longest {
        let min_original = w.min(h);
        let max_original = w.max(h);
        if max_original / min_original * size > max_size as f64 {
            size = (max_size as f64 * min_original / max_original).round();
        }
    }

    if (h <= w && h == size) || (w <= h && w == size) {
        return (width, height);
    }

    if w < h {
        (size as u32, (size * h / w) as u32)
    } else {
        ((size * w / h) as u32, size as u32)
    }
}

fn default_true() -> bool {
    true
}

fn default_rescale_factor() -> f32 {
    1.0 / 255.0
}
