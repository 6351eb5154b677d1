//! Samples - the narrow data container consumed by fit, evaluate and predict.

use burn::tensor::{Tensor, backend::Backend};

use crate::errors::ModelError;
use crate::graph::Shape;

/// Features and labels of a split, one [`Samples`] per model input/output.
pub type Dataset = (Vec<Samples>, Vec<Samples>);

/// Row-major samples of one model input or output.
///
/// Each row holds the flattened features of one sample; `shape` is the
/// per-sample shape used to set node shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    shape: Shape,
    rows: Vec<Vec<f32>>,
}

impl Samples {
    /// Creates samples, checking every row against the per-sample shape.
    pub fn new(shape: Shape, rows: Vec<Vec<f32>>) -> Result<Self, ModelError> {
        let width: usize = shape.iter().product();
        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            return Err(ModelError::ShapeMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        Ok(Self { shape, rows })
    }

    /// Creates flat samples whose shape is the row length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, ModelError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        Self::new(vec![width], rows)
    }

    /// A 1-D label vector becomes one column.
    pub fn from_scalars(values: &[f32]) -> Self {
        Self {
            shape: vec![1],
            rows: values.iter().map(|&v| vec![v]).collect(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    /// Splits into the first `at` rows and the rest.
    pub fn split_at(&self, at: usize) -> (Self, Self) {
        let at = at.min(self.rows.len());
        let (head, tail) = self.rows.split_at(at);
        (
            Self {
                shape: self.shape.clone(),
                rows: head.to_vec(),
            },
            Self {
                shape: self.shape.clone(),
                rows: tail.to_vec(),
            },
        )
    }

    /// Converts to a `[len, width]` tensor.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let data: Vec<f32> = self.rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([self.len(), self.width()])
    }
}

/// Returns the common row count of every entry of `x` and `y`.
pub fn common_len(x: &[Samples], y: &[Samples]) -> Result<usize, ModelError> {
    let len = x.first().or(y.first()).map(Samples::len).unwrap_or(0);
    if let Some(other) = x.iter().chain(y).find(|s| s.len() != len) {
        return Err(ModelError::DataMismatch {
            message: format!("expected {} samples, found {}", len, other.len()),
        });
    }
    Ok(len)
}

/// Holds out the last `validation_split` fraction of the rows.
///
/// At least one row lands on each side.
pub fn split_train_to_valid(
    x: &[Samples],
    y: &[Samples],
    validation_split: f64,
) -> Result<(Dataset, Dataset), ModelError> {
    let len = common_len(x, y)?;
    if len < 2 {
        return Err(ModelError::DataMismatch {
            message: format!("need at least 2 samples to split, found {len}"),
        });
    }

    let valid_len = ((len as f64) * validation_split).round() as usize;
    let train_len = len - valid_len.clamp(1, len - 1);

    let split = |samples: &[Samples]| -> (Vec<Samples>, Vec<Samples>) {
        samples.iter().map(|s| s.split_at(train_len)).unzip()
    };
    let (train_x, valid_x) = split(x);
    let (train_y, valid_y) = split(y);
    Ok(((train_x, train_y), (valid_x, valid_y)))
}
