use super::{
    artifacts::ModelFiles,
    onnx::{OnnxModel, f32_tensor, i64_tensor},
    preprocess::{ProcessorConfig, SizePolicy},
};
use crate::{Error, Result, config::CaptionConfig};
use image::RgbImage;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::debug;

const ENCODER_FILE: &str = "onnx/encoder_model.onnx";
const DECODER_FILE: &str = "onnx/decoder_model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";
const PROCESSOR_FILE: &str = "preprocessor_config.json";

/// GPT-2 `<|endoftext|>`, used as both start and end of a caption.
const GPT2_END_OF_TEXT: i64 = 50256;

/// ViT encoder + GPT-2 decoder image captioner.
pub struct Captioner {
    encoder: OnnxModel,
    decoder: OnnxModel,
    tokenizer: Tokenizer,
    processor: ProcessorConfig,
    start_token: i64,
    eos_token: i64,
    max_length: usize,
}

#[derive(Debug, Default, Deserialize)]
struct EncoderDecoderConfig {
    #[serde(default)]
    decoder_start_token_id: Option<i64>,
    #[serde(default)]
    eos_token_id: Option<i64>,
    #[serde(default)]
    decoder: Option<DecoderConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct DecoderConfig {
    #[serde(default)]
    bos_token_id: Option<i64>,
    #[serde(default)]
    eos_token_id: Option<i64>,
}

impl Captioner {
    pub const FILES: &'static [&'static str] = &[
        ENCODER_FILE,
        DECODER_FILE,
        TOKENIZER_FILE,
        CONFIG_FILE,
        PROCESSOR_FILE,
    ];

    pub fn load(files: &ModelFiles, config: &CaptionConfig, intra_threads: usize) -> Result<Self> {
        let model_config: EncoderDecoderConfig =
            serde_json::from_str(&std::fs::read_to_string(files.path(CONFIG_FILE)?)?)?;
        let decoder_config = model_config.decoder.unwrap_or_default();

        let start_token = model_config
            .decoder_start_token_id
            .or(decoder_config.bos_token_id)
            .unwrap_or(GPT2_END_OF_TEXT);
        let eos_token = model_config
            .eos_token_id
            .or(decoder_config.eos_token_id)
            .unwrap_or(GPT2_END_OF_TEXT);

        let tokenizer = Tokenizer::from_file(files.path(TOKENIZER_FILE)?)
            .map_err(|e| Error::tokenizer(e.to_string()))?;

        Ok(Self {
            encoder: OnnxModel::load(files.path(ENCODER_FILE)?, intra_threads)?,
            decoder: OnnxModel::load(files.path(DECODER_FILE)?, intra_threads)?,
            tokenizer,
            processor: ProcessorConfig::from_file(files.path(PROCESSOR_FILE)?)?,
            start_token,
            eos_token,
            max_length: config.max_length,
        })
    }

    /// Describes `image` with greedy decoding, so the same image and model
    /// always give the same caption.
    pub fn caption(&mut self, image: &RgbImage) -> Result<String> {
        let pixels = self.processor.pixel_values(image, SizePolicy::Exact);
        let encoded = self.encoder.run_single(
            vec![("pixel_values", f32_tensor(pixels.shape(), pixels.data)?)],
            "last_hidden_state",
        )?;
        let hidden_shape = [encoded.dim(0)?, encoded.dim(1)?, encoded.dim(2)?];
        let hidden = encoded.data;

        let decoder = &mut self.decoder;
        let tokens = greedy_decode(self.start_token, self.eos_token, self.max_length, |ids| {
            let len = ids.len();
            let mut inputs = vec![
                ("input_ids", i64_tensor([1, len], ids.to_vec())?),
                ("encoder_hidden_states", f32_tensor(hidden_shape, hidden.clone())?),
            ];
            if decoder.accepts("attention_mask") {
                inputs.push(("attention_mask", i64_tensor([1, len], vec![1; len])?));
            }

            let logits = decoder.run_single(inputs, "logits")?;
            last_position(&logits.data, logits.dim(1)?, logits.dim(2)?)
        })?;

        debug!("Generated {} caption tokens", tokens.len());

        let ids = tokens.iter().map(|&t| t as u32).collect::<Vec<_>>();
        self.tokenizer
            .decode(&ids, true)
            .map_err(|e| Error::tokenizer(e.to_string()))
    }
}

/// Beam-width-1 decoding without sampling. The returned sequence starts with
/// `start`, stops after `eos` and never exceeds `max_length` tokens.
pub fn greedy_decode<F>(start: i64, eos: i64, max_length: usize, mut next_logits: F) -> Result<Vec<i64>>
where
    F: FnMut(&[i64]) -> Result<Vec<f32>>,
{
    let mut tokens = vec![start];

    while tokens.len() < max_length {
        let logits = next_logits(&tokens)?;
        let next = argmax(&logits).ok_or_else(|| Error::model("Decoder returned empty logits"))?;
        tokens.push(next as i64);
        if next as i64 == eos {
            break;
        }
    }

    Ok(tokens)
}

/// Logits of the final sequence position from a `[1, seq_len, vocab]` output.
fn last_position(logits: &[f32], seq_len: usize, vocab: usize) -> Result<Vec<f32>> {
    let last = seq_len
        .checked_sub(1)
        .ok_or_else(|| Error::model("Decoder returned an empty sequence"))?
        * vocab;
    logits
        .get(last..last + vocab)
        .map(<[f32]>::to_vec)
        .ok_or_else(|| Error::model("Decoder logits are shorter than their shape"))
}

/// Index of the first maximum.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, best_v)) if best_v >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
