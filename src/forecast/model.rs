//! Sequence models behind the forecast predictors.
//!
//! A model maps a fixed-length input sequence (one scalar feature per step,
//! already normalized) to `horizon` next values. Trained weights are shipped
//! as JSON artifacts tagged by `architecture`:
//!
//! ```json
//! { "architecture": "gru", "input_len": 15,
//!   "forward": { "kernel": [...], "recurrent_kernel": [[...]], "bias": [...] },
//!   "head": { "weights": [[...]], "bias": [...] } }
//! ```
//!
//! Gate blocks inside `kernel`, `recurrent_kernel` rows, and `bias` follow
//! the Keras layout: `[z, r, h]` for GRU (`reset_after = false`) and
//! `[i, f, c, o]` for LSTM. `recurrent_kernel` has one row per hidden unit.
//! The dense head stores one weight row per output step.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::series::SeriesKind;

/// A pure function from a normalized input sequence to the next values.
pub trait SequenceModel: fmt::Debug + Send + Sync {
    /// Number of input steps the model consumes.
    fn input_len(&self) -> usize;

    /// Number of steps produced per call.
    fn horizon(&self) -> usize;

    /// Predicts the next `horizon()` values after `input`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ShapeMismatch`] if `input.len() != input_len()`.
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError>;
}

/// Serialized model as stored on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "architecture", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Seasonal-naive model: repeats the last `period` inputs.
    Persistence {
        input_len: usize,
        period: usize,
        horizon: usize,
    },
    /// Elman recurrent network.
    Rnn(RecurrentArtifact),
    /// Gated recurrent unit.
    Gru(RecurrentArtifact),
    /// Long short-term memory, bidirectional when `backward` is present.
    Lstm(RecurrentArtifact),
}

/// Weights of a single-layer recurrent network with a dense head.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecurrentArtifact {
    pub input_len: usize,
    pub forward: CellWeights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backward: Option<CellWeights>,
    pub head: DenseWeights,
}

/// Weights of one recurrent cell with a scalar input.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CellWeights {
    /// Input weights, `gates * hidden`.
    pub kernel: Vec<f64>,
    /// Recurrent weights, `hidden` rows of `gates * hidden`.
    pub recurrent_kernel: Vec<Vec<f64>>,
    /// Biases, `gates * hidden`.
    pub bias: Vec<f64>,
}

impl CellWeights {
    pub fn hidden(&self) -> usize {
        self.recurrent_kernel.len()
    }

    fn validate(&self, cell: CellKind, name: &str) -> Result<(), String> {
        let hidden = self.hidden();
        if hidden == 0 {
            return Err(format!("{name}: recurrent_kernel has no rows"));
        }
        let width = cell.gates() * hidden;
        if self.kernel.len() != width {
            return Err(format!(
                "{name}: kernel has {} weights, expected {width}",
                self.kernel.len()
            ));
        }
        if self.bias.len() != width {
            return Err(format!(
                "{name}: bias has {} entries, expected {width}",
                self.bias.len()
            ));
        }
        if let Some(row) = self.recurrent_kernel.iter().position(|r| r.len() != width) {
            return Err(format!(
                "{name}: recurrent_kernel row {row} has {} weights, expected {width}",
                self.recurrent_kernel[row].len()
            ));
        }
        Ok(())
    }

    /// `x * kernel + h * recurrent_kernel + bias` for the columns of one gate block.
    fn affine(&self, gate: usize, x: f64, h: &[f64]) -> Vec<f64> {
        let hidden = self.hidden();
        (gate * hidden..(gate + 1) * hidden)
            .map(|col| {
                let recurrent: f64 = h
                    .iter()
                    .zip(&self.recurrent_kernel)
                    .map(|(hk, row)| hk * row[col])
                    .sum();
                x * self.kernel[col] + self.bias[col] + recurrent
            })
            .collect()
    }
}

/// Fully connected output layer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DenseWeights {
    /// One row per output step.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl DenseWeights {
    fn validate(&self, features: usize) -> Result<(), String> {
        if self.bias.is_empty() {
            return Err("head: bias is empty".to_string());
        }
        if self.weights.len() != self.bias.len() {
            return Err(format!(
                "head: {} weight rows for {} outputs",
                self.weights.len(),
                self.bias.len()
            ));
        }
        if let Some(row) = self.weights.iter().position(|r| r.len() != features) {
            return Err(format!(
                "head: row {row} has {} weights, expected {features}",
                self.weights[row].len()
            ));
        }
        Ok(())
    }

    fn apply(&self, features: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| b + row.iter().zip(features).map(|(w, f)| w * f).sum::<f64>())
            .collect()
    }
}

impl ModelArtifact {
    /// Reads and validates an artifact, producing a ready model for `series`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelUnavailable`] if the file cannot be
    /// read, is not a valid artifact, or has inconsistent dimensions.
    pub fn load(series: SeriesKind, path: &Path) -> Result<Box<dyn SequenceModel>, PipelineError> {
        let unavailable = |reason: String| PipelineError::ModelUnavailable {
            series,
            path: path.to_path_buf(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let artifact: ModelArtifact =
            serde_json::from_str(&content).map_err(|e| unavailable(e.to_string()))?;
        let model = artifact.into_model(series).map_err(unavailable)?;
        debug!(
            series = %series,
            path = %path.display(),
            input_len = model.input_len(),
            horizon = model.horizon(),
            "model artifact loaded"
        );
        Ok(model)
    }

    /// Validates dimensions and builds the model.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found.
    pub fn into_model(self, series: SeriesKind) -> Result<Box<dyn SequenceModel>, String> {
        match self {
            ModelArtifact::Persistence {
                input_len,
                period,
                horizon,
            } => {
                if input_len == 0 || horizon == 0 {
                    return Err("input_len and horizon must be > 0".to_string());
                }
                if period == 0 || period > input_len {
                    return Err(format!("period must be in 1..={input_len}, got {period}"));
                }
                Ok(Box::new(Persistence::new(series, input_len, period, horizon)))
            }
            ModelArtifact::Rnn(a) => Recurrent::new(series, CellKind::Rnn, a).map(boxed),
            ModelArtifact::Gru(a) => Recurrent::new(series, CellKind::Gru, a).map(boxed),
            ModelArtifact::Lstm(a) => Recurrent::new(series, CellKind::Lstm, a).map(boxed),
        }
    }
}

fn boxed(model: Recurrent) -> Box<dyn SequenceModel> {
    Box::new(model)
}

fn check_input(series: SeriesKind, expected: usize, input: &[f64]) -> Result<(), PipelineError> {
    if input.len() != expected {
        return Err(PipelineError::ShapeMismatch {
            series,
            expected,
            actual: input.len(),
        });
    }
    Ok(())
}

/// "Tomorrow is today" forecaster.
///
/// Output step `j` copies the input `period` steps back, so with `period`
/// equal to one day the last observed day is repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Persistence {
    series: SeriesKind,
    input_len: usize,
    period: usize,
    horizon: usize,
}

impl Persistence {
    /// Builds a persistence model; `period` is clamped to `1..=input_len`.
    pub fn new(series: SeriesKind, input_len: usize, period: usize, horizon: usize) -> Self {
        let input_len = input_len.max(1);
        Self {
            series,
            input_len,
            period: period.clamp(1, input_len),
            horizon: horizon.max(1),
        }
    }
}

impl SequenceModel for Persistence {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        check_input(self.series, self.input_len, input)?;
        let season = &input[self.input_len - self.period..];
        Ok((0..self.horizon).map(|j| season[j % self.period]).collect())
    }
}

/// Recurrent cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Rnn,
    Gru,
    Lstm,
}

impl CellKind {
    /// Gate blocks per hidden unit.
    pub fn gates(self) -> usize {
        match self {
            CellKind::Rnn => 1,
            CellKind::Gru => 3,
            CellKind::Lstm => 4,
        }
    }

    /// Advances the cell by one input. `c` is only used by LSTM.
    fn step(self, w: &CellWeights, x: f64, h: &[f64], c: &mut [f64]) -> Vec<f64> {
        match self {
            CellKind::Rnn => w.affine(0, x, h).into_iter().map(f64::tanh).collect(),
            CellKind::Gru => {
                let z = w.affine(0, x, h);
                let r = w.affine(1, x, h);
                let reset_h: Vec<f64> = h
                    .iter()
                    .zip(&r)
                    .map(|(hk, rk)| hk * sigmoid(*rk))
                    .collect();
                let candidate = w.affine(2, x, &reset_h);
                h.iter()
                    .zip(z)
                    .zip(candidate)
                    .map(|((hk, zk), ck)| {
                        let z = sigmoid(zk);
                        z * hk + (1.0 - z) * ck.tanh()
                    })
                    .collect()
            }
            CellKind::Lstm => {
                let i = w.affine(0, x, h);
                let f = w.affine(1, x, h);
                let g = w.affine(2, x, h);
                let o = w.affine(3, x, h);
                (0..h.len())
                    .map(|k| {
                        c[k] = sigmoid(f[k]) * c[k] + sigmoid(i[k]) * g[k].tanh();
                        sigmoid(o[k]) * c[k].tanh()
                    })
                    .collect()
            }
        }
    }

    /// Runs the cell over `inputs` from a zero state and returns the final hidden state.
    fn run(self, w: &CellWeights, inputs: impl Iterator<Item = f64>) -> Vec<f64> {
        let hidden = w.hidden();
        let mut h = vec![0.0; hidden];
        let mut c = vec![0.0; hidden];
        for x in inputs {
            h = self.step(w, x, &h, &mut c);
        }
        h
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Single recurrent layer (optionally bidirectional) followed by a dense head.
#[derive(Debug, Clone)]
pub struct Recurrent {
    series: SeriesKind,
    cell: CellKind,
    input_len: usize,
    forward: CellWeights,
    backward: Option<CellWeights>,
    head: DenseWeights,
}

impl Recurrent {
    fn new(series: SeriesKind, cell: CellKind, a: RecurrentArtifact) -> Result<Self, String> {
        if a.input_len == 0 {
            return Err("input_len must be > 0".to_string());
        }
        a.forward.validate(cell, "forward")?;
        let mut features = a.forward.hidden();
        if let Some(backward) = &a.backward {
            backward.validate(cell, "backward")?;
            features += backward.hidden();
        }
        a.head.validate(features)?;
        Ok(Self {
            series,
            cell,
            input_len: a.input_len,
            forward: a.forward,
            backward: a.backward,
            head: a.head,
        })
    }

    pub fn cell(&self) -> CellKind {
        self.cell
    }

    pub fn is_bidirectional(&self) -> bool {
        self.backward.is_some()
    }
}

impl SequenceModel for Recurrent {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn horizon(&self) -> usize {
        self.head.bias.len()
    }

    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        check_input(self.series, self.input_len, input)?;
        let mut features = self.cell.run(&self.forward, input.iter().copied());
        if let Some(backward) = &self.backward {
            features.extend(self.cell.run(backward, input.iter().rev().copied()));
        }
        Ok(self.head.apply(&features))
    }
}
