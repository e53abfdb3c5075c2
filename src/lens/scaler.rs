//! Rescaling of lens coordinates.

use crate::cluster::util::{check_matrix, column_bounds};
use crate::error::{Error, Result};

/// Normalizes embedding coordinates column by column.
pub trait Scaler {
    /// Fit on `lens` and return the rescaled lens.
    fn fit_transform(&self, lens: &[Vec<f32>]) -> Result<Vec<Vec<f32>>>;
}

/// Scaler selection.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalerConfig {
    /// Map each column linearly onto `[min, max]`.
    ///
    /// Constant columns map to `min`.
    MinMax {
        /// Lower end of the target range.
        min: f32,
        /// Upper end of the target range.
        max: f32,
    },
    /// Zero mean, unit variance per column. Constant columns map to 0.
    Standard,
    /// Leave the lens untouched.
    None,
}

impl ScalerConfig {
    /// Min-max scaling onto `[0, 1]`.
    pub fn min_max() -> Self {
        Self::MinMax { min: 0.0, max: 1.0 }
    }
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self::min_max()
    }
}

impl Scaler for ScalerConfig {
    fn fit_transform(&self, lens: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let d = check_matrix(lens)?;
        match *self {
            Self::MinMax { min, max } => {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(Error::InvalidParameter {
                        name: "feature_range",
                        message: "min must be finite and below max",
                    });
                }
                let bounds = column_bounds(lens, d);
                let span = max - min;
                Ok(lens
                    .iter()
                    .map(|row| {
                        row.iter()
                            .zip(bounds.iter())
                            .map(|(&v, &(lo, hi))| {
                                let range = hi - lo;
                                if range.abs() > 1e-10 {
                                    (v - lo) / range * span + min
                                } else {
                                    min
                                }
                            })
                            .collect()
                    })
                    .collect())
            }
            Self::Standard => {
                let n = lens.len() as f32;
                let mut mean = vec![0.0f32; d];
                for row in lens {
                    for (m, &v) in mean.iter_mut().zip(row.iter()) {
                        *m += v / n;
                    }
                }
                let mut std = vec![0.0f32; d];
                for row in lens {
                    for ((s, &v), &m) in std.iter_mut().zip(row.iter()).zip(mean.iter()) {
                        *s += (v - m) * (v - m) / n;
                    }
                }
                for s in &mut std {
                    *s = s.sqrt();
                }
                Ok(lens
                    .iter()
                    .map(|row| {
                        row.iter()
                            .zip(mean.iter().zip(std.iter()))
                            .map(|(&v, (&m, &s))| if s > 1e-10 { (v - m) / s } else { 0.0 })
                            .collect()
                    })
                    .collect())
            }
            Self::None => Ok(lens.to_vec()),
        }
    }
}
