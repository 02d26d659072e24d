//! ONNX Runtime session management for policy/value inference.

use anyhow::{ensure, Context, Result};
use gomoku_board::observation::NUM_PLANES;
use ndarray::{Array1, Array4};
use ort::{
    session::{Session, SessionOutputs},
    value::Value,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Name of the model's observation input.
pub const INPUT_NAME: &str = "input_layer";

/// Raw network output for one position.
#[derive(Clone, Debug)]
pub struct Prediction {
    /// Softmax over all N² cells.
    pub policy: Vec<f32>,

    /// Value for the player to move.
    pub value: f32,
}

/// A loaded policy/value network for one board size.
///
/// Input `[1, 4, N, N]`; outputs are the policy (N² floats) followed by
/// the value (one float).
pub struct OnnxModel {
    session: Mutex<Session>,
    board_size: usize,
    path: PathBuf,
}

impl OnnxModel {
    /// Load an ONNX model from file.
    pub fn load(path: impl AsRef<Path>, board_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let session = Session::builder()?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        Ok(Self {
            session: Mutex::new(session),
            board_size,
            path: path.to_path_buf(),
        })
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the network on a flattened four-plane observation.
    pub fn predict(&self, observation: &[f32]) -> Result<Prediction> {
        let n = self.board_size;
        let planes = Array4::from_shape_vec((1, NUM_PLANES, n, n), observation.to_vec())
            .with_context(|| {
                format!(
                    "Observation has {} floats, expected {}",
                    observation.len(),
                    NUM_PLANES * n * n
                )
            })?;

        let shape: Vec<i64> = planes.shape().iter().map(|&d| d as i64).collect();
        let (data, _) = planes.into_raw_vec_and_offset();
        let input = Value::from_array((shape, data))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Inference session lock poisoned"))?;
        let outputs = session.run(ort::inputs![INPUT_NAME => input])?;

        let policy = extract(&outputs, 0, "policy")?;
        ensure!(
            policy.len() == n * n,
            "Policy output has {} entries, expected {}",
            policy.len(),
            n * n
        );
        let value = extract(&outputs, 1, "value")?
            .first()
            .copied()
            .context("Empty value output")?;

        Ok(Prediction {
            policy: policy.to_vec(),
            value,
        })
    }
}

/// Output tensor at `index`, flattened.
fn extract(outputs: &SessionOutputs, index: usize, what: &str) -> Result<Array1<f32>> {
    let name = outputs
        .keys()
        .nth(index)
        .with_context(|| format!("Missing {} output", what))?;

    let tensor = outputs
        .get(name)
        .with_context(|| format!("Failed to get {} tensor", what))?;

    let (_, data) = tensor.try_extract_tensor::<f32>()?;
    Ok(Array1::from(data.to_vec()))
}
