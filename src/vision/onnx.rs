use crate::{Error, Result};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::{DynValue, Tensor},
};
use std::{fmt::Display, path::Path};
use tracing::debug;

/// An output tensor copied out of the session.
#[derive(Debug, Clone)]
pub struct OutputTensor {
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

impl OutputTensor {
    pub fn dim(&self, axis: usize) -> Result<usize> {
        let dim = self
            .shape
            .get(axis)
            .ok_or_else(|| Error::model(format!("Output has no axis {}: {:?}", axis, self.shape)))?;
        usize::try_from(*dim).map_err(|_| {
            Error::model(format!("Output axis {} is not concrete: {:?}", axis, self.shape))
        })
    }
}

/// A loaded ONNX graph together with the names of its declared inputs.
pub struct OnnxModel {
    session: Session,
    input_names: Vec<String>,
}

impl OnnxModel {
    pub fn load(path: &Path, intra_threads: usize) -> Result<Self> {
        let session = Session::builder()
            .map_err(ort_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_error)?
            .with_intra_threads(intra_threads)
            .map_err(ort_error)?
            .commit_from_file(path)
            .map_err(ort_error)?;

        let input_names = session
            .inputs
            .iter()
            .map(|input| input.name.to_string())
            .collect::<Vec<_>>();

        debug!("Loaded {} with inputs {:?}", path.display(), input_names);

        Ok(Self {
            session,
            input_names,
        })
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.input_names.iter().any(|input| input == name)
    }

    /// Runs the graph once and copies the named `f32` outputs.
    pub fn run(
        &mut self,
        inputs: Vec<(&'static str, DynValue)>,
        outputs: &[&str],
    ) -> Result<Vec<OutputTensor>> {
        let results = self.session.run(inputs).map_err(ort_error)?;

        outputs
            .iter()
            .map(|name| {
                let value = results
                    .get(*name)
                    .ok_or_else(|| Error::model(format!("Model produced no output named {}", name)))?;
                let (shape, data) = value.try_extract_tensor::<f32>().map_err(ort_error)?;
                Ok(OutputTensor {
                    shape: shape.to_vec(),
                    data: data.to_vec(),
                })
            })
            .collect()
    }

    pub fn run_single(
        &mut self,
        inputs: Vec<(&'static str, DynValue)>,
        output: &str,
    ) -> Result<OutputTensor> {
        self.run(inputs, &[output])?
            .pop()
            .ok_or_else(|| Error::model(format!("Model produced no output named {}", output)))
    }
}

pub fn f32_tensor<const N: usize>(shape: [usize; N], data: Vec<f32>) -> Result<DynValue> {
    Ok(Tensor::from_array((shape, data))
        .map_err(ort_error)?
        .into_dyn())
}

pub fn i64_tensor<const N: usize>(shape: [usize; N], data: Vec<i64>) -> Result<DynValue> {
    Ok(Tensor::from_array((shape, data))
        .map_err(ort_error)?
        .into_dyn())
}

fn ort_error(e: impl Display) -> Error {
    Error::model(e.to_string())
}
