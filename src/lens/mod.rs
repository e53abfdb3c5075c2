//! Lens construction: project the dataset, then rescale the projection.
//!
//! ```rust
//! use mapfit::lens::{compute_lens, ProjectionConfig, ScalerConfig};
//!
//! let data = vec![vec![0.0, 0.0, 1.0], vec![1.0, 1.0, 0.0], vec![2.0, 2.0, 1.0]];
//! let lens = compute_lens(&data, &ProjectionConfig::pca(1), &ScalerConfig::default()).unwrap();
//! assert_eq!(lens.len(), 3);
//! assert!(lens.iter().all(|row| row.len() == 1 && (0.0..=1.0).contains(&row[0])));
//! ```

mod projection;
mod scaler;

pub use projection::{Projection, ProjectionConfig, RowStatistic};
pub use scaler::{Scaler, ScalerConfig};

use tracing::debug;

use crate::error::{Error, Result};

/// Apply `projection`, then `scaler`, to `data`.
///
/// The result has one row per input row; collaborators that break that are
/// reported as [`Error::RowMismatch`].
pub fn compute_lens(
    data: &[Vec<f32>],
    projection: &dyn Projection,
    scaler: &dyn Scaler,
) -> Result<Vec<Vec<f32>>> {
    let projected = projection.fit_transform(data)?;
    if projected.len() != data.len() {
        return Err(Error::RowMismatch {
            lens: projected.len(),
            data: data.len(),
        });
    }
    let lens = scaler.fit_transform(&projected)?;
    if lens.len() != data.len() {
        return Err(Error::RowMismatch {
            lens: lens.len(),
            data: data.len(),
        });
    }
    debug!(
        n_samples = lens.len(),
        lens_dim = lens.first().map_or(0, Vec::len),
        "lens computed"
    );
    Ok(lens)
}
