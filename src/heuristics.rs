//! Data-driven defaults for the clusterer and the cover.
//!
//! Both heuristics are pure and deterministic, and they never fail: degenerate
//! input (too few rows, ragged rows, non-finite values, zero variance) yields a
//! conservative fallback instead of an error.
//!
//! ## DBSCAN
//!
//! `min_pts = clamp(D + 1, 2, 5)`, capped at the number of rows. `epsilon` is
//! `1.5 ×` the 90th percentile of every row's distance to its `(min_pts - 1)`-th
//! nearest neighbor (the usual k-distance heuristic, read at a high quantile so
//! most points end up core).
//!
//! ## Cover
//!
//! `resolution = clamp(floor((N / 5)^(1 / k)), 1, 20)` for a `k`-dimensional
//! lens, which leaves about five rows per element on average, and `gain = 0.3`.

use crate::cluster::util::{check_matrix, column_bounds, euclidean};
use crate::cluster::Dbscan;
use crate::cover::CoverConfig;

/// Fallback neighborhood radius.
pub const DEFAULT_EPSILON: f32 = 0.5;
/// Largest `min_pts` the heuristic picks.
pub const MAX_MIN_PTS: usize = 5;
/// Quantile of the k-distance distribution used for `epsilon`.
pub const EPSILON_QUANTILE: f32 = 0.9;
/// Multiplier applied to the k-distance quantile.
pub const EPSILON_SLACK: f32 = 1.5;

/// Average rows per cover element the cover heuristic aims for.
pub const POINTS_PER_ELEMENT: f32 = 5.0;
/// Largest resolution the cover heuristic picks.
pub const MAX_RESOLUTION: usize = 20;
/// Overlap used for non-degenerate data.
pub const DEFAULT_GAIN: f32 = 0.3;
/// Lens width assumed by [`optimize_cover`] (the default projection's).
pub const DEFAULT_LENS_DIM: usize = 2;

/// Cover returned for degenerate data.
pub const SAFE_COVER: CoverConfig = CoverConfig {
    resolution: 1,
    gain: 0.1,
};

/// Pick DBSCAN parameters from the data's nearest-neighbor distances.
///
/// Always returns `epsilon > 0` and `min_pts >= 1`.
pub fn optimize_dbscan(data: &[Vec<f32>]) -> Dbscan {
    let fallback = Dbscan::new(DEFAULT_EPSILON, 1);
    let Some(d) = usable_width(data) else {
        return fallback;
    };
    let n = data.len();
    if n < 2 {
        return fallback;
    }

    let min_pts = (d + 1).clamp(2, MAX_MIN_PTS).min(n);
    let k = min_pts - 1;

    let mut k_distances: Vec<f32> = data
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let mut dists: Vec<f32> = data
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| euclidean(a, b))
                .collect();
            dists.sort_by(f32::total_cmp);
            dists[k - 1]
        })
        .collect();
    k_distances.sort_by(f32::total_cmp);

    let idx = ((k_distances.len() - 1) as f32 * EPSILON_QUANTILE).round() as usize;
    let mut epsilon = k_distances[idx] * EPSILON_SLACK;

    if !(epsilon.is_finite() && epsilon > 0.0) {
        // Duplicate-heavy data: fall back to a fraction of the widest spread.
        let spread = column_bounds(data, d)
            .into_iter()
            .map(|(lo, hi)| hi - lo)
            .fold(0.0f32, f32::max);
        epsilon = spread * 0.1;
    }
    if !(epsilon.is_finite() && epsilon > 0.0) {
        epsilon = DEFAULT_EPSILON;
    }

    Dbscan::new(epsilon, min_pts)
}

/// Pick a cover for the default lens width, `min(D, 2)`.
///
/// Always returns `resolution >= 1` and `0 < gain < 1`.
pub fn optimize_cover(data: &[Vec<f32>]) -> CoverConfig {
    let lens_dim = data
        .first()
        .map_or(DEFAULT_LENS_DIM, |row| row.len().min(DEFAULT_LENS_DIM));
    optimize_cover_for(data, lens_dim)
}

/// Pick a cover for a lens of width `lens_dim`.
pub fn optimize_cover_for(data: &[Vec<f32>], lens_dim: usize) -> CoverConfig {
    let Some(d) = usable_width(data) else {
        return SAFE_COVER;
    };
    let n = data.len();
    if n < 2 {
        return SAFE_COVER;
    }
    let varies = column_bounds(data, d).iter().any(|&(lo, hi)| hi > lo);
    if !varies {
        return SAFE_COVER;
    }

    let k = lens_dim.max(1) as f32;
    let resolution = (n as f32 / POINTS_PER_ELEMENT)
        .powf(1.0 / k)
        .floor()
        .clamp(1.0, MAX_RESOLUTION as f32) as usize;

    CoverConfig::new(resolution, DEFAULT_GAIN)
}

/// Row width, if the matrix is well-formed and finite.
fn usable_width(data: &[Vec<f32>]) -> Option<usize> {
    let d = check_matrix(data).ok()?;
    data.iter()
        .flatten()
        .all(|v| v.is_finite())
        .then_some(d)
}
