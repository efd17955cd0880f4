use ndarray::{concatenate, s, Array2, ArrayView1, ArrayView2, Axis};

use crate::{Error, Result};

/// A `[steps, width]` grid of feature values.
///
/// Read either as a multi-hot roll (every column an independent 0/1
/// indicator) or as one-hot categorical rows (one active column per step,
/// recovered with [`FeatureBuffer::arg_max_rows`]).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBuffer {
    data: Array2<f32>,
}

impl FeatureBuffer {
    pub fn zeros(steps: usize, width: usize) -> Self {
        Self {
            data: Array2::zeros((steps, width)),
        }
    }

    pub fn from_array(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Build from row vectors; every row must have the same width.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(Error::ShapeMismatch {
                expected: format!("rows of width {}", width),
                actual: format!("row of width {}", bad.len()),
            });
        }

        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let data = Array2::from_shape_vec((rows.len(), width), flat).map_err(|e| {
            Error::ShapeMismatch {
                expected: format!("[{}, {}]", rows.len(), width),
                actual: e.to_string(),
            }
        })?;
        Ok(Self { data })
    }

    /// One-hot rows, one per label. Every label must be below `depth`.
    pub fn one_hot(labels: &[usize], depth: usize) -> Result<Self> {
        let mut buffer = Self::zeros(labels.len(), depth);
        for (step, &label) in labels.iter().enumerate() {
            if label >= depth {
                return Err(Error::ShapeMismatch {
                    expected: format!("label below {}", depth),
                    actual: format!("label {} at step {}", label, step),
                });
            }
            buffer.data[[step, label]] = 1.0;
        }
        Ok(buffer)
    }

    pub fn steps(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Panics when out of bounds.
    pub fn get(&self, step: usize, column: usize) -> f32 {
        self.data[[step, column]]
    }

    /// Panics when out of bounds.
    pub fn set(&mut self, step: usize, column: usize, value: f32) {
        self.data[[step, column]] = value;
    }

    pub fn row(&self, step: usize) -> ArrayView1<'_, f32> {
        self.data.row(step)
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array2<f32> {
        self.data
    }

    /// Index of the largest value in each row; ties go to the lowest column.
    ///
    /// A zero-width buffer yields label 0 for every row.
    pub fn arg_max_rows(&self) -> Vec<usize> {
        self.data
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (column, &value) in row.iter().enumerate() {
                    if value > row[best] {
                        best = column;
                    }
                }
                best
            })
            .collect()
    }

    /// Join buffers side by side along the feature axis.
    pub fn concat_features(parts: &[FeatureBuffer]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(Error::ShapeMismatch {
                expected: "at least one buffer".into(),
                actual: "none".into(),
            });
        };

        let views: Vec<ArrayView2<'_, f32>> = parts.iter().map(|p| p.data.view()).collect();
        let data = concatenate(Axis(1), &views).map_err(|_| Error::ShapeMismatch {
            expected: format!("{} steps in every part", first.steps()),
            actual: parts
                .iter()
                .map(|p| p.steps().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
        Ok(Self { data })
    }

    /// Cut into consecutive column groups of the given widths, which must
    /// add up to this buffer's width.
    pub fn split_features(&self, widths: &[usize]) -> Result<Vec<Self>> {
        let total: usize = widths.iter().sum();
        if total != self.width() {
            return Err(Error::ShapeMismatch {
                expected: format!("width {}", total),
                actual: format!("width {}", self.width()),
            });
        }

        let mut offset = 0;
        let parts = widths
            .iter()
            .map(|&width| {
                let part = self.data.slice(s![.., offset..offset + width]).to_owned();
                offset += width;
                Self { data: part }
            })
            .collect();
        Ok(parts)
    }
}
