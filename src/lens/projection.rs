//! Projections from the dataset onto a low-dimensional lens.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, SymmetricEigen};
use tracing::debug;

use crate::capability::Capability;
use crate::cluster::util::{check_matrix, euclidean};
use crate::error::{Error, Result};

/// Reduces a dataset to a lower-dimensional embedding, one row per input row.
pub trait Projection {
    /// Fit on `data` and return its projection.
    fn fit_transform(&self, data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>>;
}

/// Per-row statistic used as a one-dimensional lens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowStatistic {
    /// Sum of coordinates.
    Sum,
    /// Mean of coordinates.
    Mean,
    /// Median of coordinates.
    Median,
    /// Largest coordinate.
    Max,
    /// Smallest coordinate.
    Min,
    /// Population standard deviation of coordinates.
    Std,
    /// Euclidean norm.
    L2Norm,
    /// Mean distance to every other row.
    DistMean,
    /// Mean distance to the `k` nearest other rows.
    KnnDistance(usize),
}

/// Projection selection.
#[derive(Clone)]
pub enum ProjectionConfig {
    /// Principal component analysis onto the top `n_components` directions.
    Pca {
        /// Number of components to keep.
        n_components: usize,
    },
    /// Keep the listed columns, in the listed order.
    Columns(Vec<usize>),
    /// One-dimensional lens from a per-row statistic.
    Statistic(RowStatistic),
    /// Random projection onto normalized uniform directions.
    ///
    /// Requires [`Capability::RandomProjection`].
    Random {
        /// Target dimensionality.
        n_components: usize,
        /// Optional RNG seed for reproducibility.
        seed: Option<u64>,
    },
    /// Use the data as its own lens.
    Identity,
    /// Any external implementation of [`Projection`].
    Custom(Arc<dyn Projection + Send + Sync>),
}

impl ProjectionConfig {
    /// PCA onto `n_components` directions.
    pub fn pca(n_components: usize) -> Self {
        Self::Pca { n_components }
    }

    /// Wrap an external projection.
    pub fn custom<P>(projection: P) -> Self
    where
        P: Projection + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(projection))
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::pca(2)
    }
}

impl fmt::Debug for ProjectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pca { n_components } => f
                .debug_struct("Pca")
                .field("n_components", n_components)
                .finish(),
            Self::Columns(cols) => f.debug_tuple("Columns").field(cols).finish(),
            Self::Statistic(s) => f.debug_tuple("Statistic").field(s).finish(),
            Self::Random { n_components, seed } => f
                .debug_struct("Random")
                .field("n_components", n_components)
                .field("seed", seed)
                .finish(),
            Self::Identity => f.write_str("Identity"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Projection for ProjectionConfig {
    fn fit_transform(&self, data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Custom(p) => p.fit_transform(data),
            Self::Pca { n_components } => pca(data, self.checked_width(data)?, *n_components),
            Self::Columns(cols) => select_columns(data, self.checked_width(data)?, cols),
            Self::Statistic(stat) => {
                self.checked_width(data)?;
                row_statistic(data, *stat)
            }
            Self::Random { n_components, seed } => {
                let d = self.checked_width(data)?;
                Capability::RandomProjection.require()?;
                random_projection(data, d, *n_components, *seed)
            }
            Self::Identity => {
                self.checked_width(data)?;
                Ok(data.to_vec())
            }
        }
    }
}

impl ProjectionConfig {
    /// Validate the matrix shape for a built-in projection.
    fn checked_width(&self, data: &[Vec<f32>]) -> Result<usize> {
        let d = check_matrix(data)?;
        debug!(projection = ?self, n_samples = data.len(), n_features = d, "projecting");
        Ok(d)
    }
}

fn pca(data: &[Vec<f32>], n_features: usize, n_components: usize) -> Result<Vec<Vec<f32>>> {
    if n_components == 0 {
        return Err(Error::InvalidParameter {
            name: "n_components",
            message: "must be at least 1",
        });
    }
    if n_components > n_features {
        return Err(Error::InvalidParameter {
            name: "n_components",
            message: "cannot exceed number of features",
        });
    }

    let n_samples = data.len();
    let mut mean = vec![0.0f32; n_features];
    for row in data {
        for (m, &v) in mean.iter_mut().zip(row.iter()) {
            *m += v;
        }
    }
    for m in &mut mean {
        *m /= n_samples as f32;
    }

    // Covariance: Σ = (X^T X) / (n - 1), with n - 1 floored at 1.
    let denom = n_samples.saturating_sub(1).max(1) as f32;
    let mut cov = DMatrix::<f32>::zeros(n_features, n_features);
    for row in data {
        for i in 0..n_features {
            let ci = row[i] - mean[i];
            for j in i..n_features {
                cov[(i, j)] += ci * (row[j] - mean[j]);
            }
        }
    }
    for i in 0..n_features {
        for j in i..n_features {
            let v = cov[(i, j)] / denom;
            cov[(i, j)] = v;
            cov[(j, i)] = v;
        }
    }

    let eigen = SymmetricEigen::new(cov);
    let mut order: Vec<usize> = (0..n_features).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let components: Vec<Vec<f32>> = order
        .iter()
        .take(n_components)
        .map(|&idx| {
            let mut c: Vec<f32> = eigen.eigenvectors.column(idx).iter().copied().collect();
            // Eigenvector sign is arbitrary; pin it so the largest loading is positive.
            let pivot = c
                .iter()
                .copied()
                .fold(0.0f32, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            if pivot < 0.0 {
                for v in &mut c {
                    *v = -*v;
                }
            }
            c
        })
        .collect();

    debug!(
        explained = ?order.iter().take(n_components).map(|&i| eigen.eigenvalues[i]).collect::<Vec<_>>(),
        "pca components selected"
    );

    Ok(data
        .iter()
        .map(|row| {
            components
                .iter()
                .map(|c| {
                    row.iter()
                        .zip(mean.iter())
                        .zip(c.iter())
                        .map(|((x, m), w)| (x - m) * w)
                        .sum()
                })
                .collect()
        })
        .collect())
}

fn select_columns(data: &[Vec<f32>], n_features: usize, cols: &[usize]) -> Result<Vec<Vec<f32>>> {
    if cols.is_empty() {
        return Err(Error::InvalidParameter {
            name: "columns",
            message: "must select at least one column",
        });
    }
    if let Some(&bad) = cols.iter().find(|&&c| c >= n_features) {
        return Err(Error::DimensionMismatch {
            expected: n_features,
            found: bad + 1,
        });
    }
    Ok(data
        .iter()
        .map(|row| cols.iter().map(|&c| row[c]).collect())
        .collect())
}

fn row_statistic(data: &[Vec<f32>], stat: RowStatistic) -> Result<Vec<Vec<f32>>> {
    let values: Vec<f32> = match stat {
        RowStatistic::Sum => data.iter().map(|r| r.iter().sum()).collect(),
        RowStatistic::Mean => data.iter().map(|r| mean(r)).collect(),
        RowStatistic::Median => data.iter().map(|r| median(r)).collect(),
        RowStatistic::Max => data
            .iter()
            .map(|r| r.iter().copied().fold(f32::NEG_INFINITY, f32::max))
            .collect(),
        RowStatistic::Min => data
            .iter()
            .map(|r| r.iter().copied().fold(f32::INFINITY, f32::min))
            .collect(),
        RowStatistic::Std => data
            .iter()
            .map(|r| {
                let m = mean(r);
                (r.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / r.len() as f32).sqrt()
            })
            .collect(),
        RowStatistic::L2Norm => data
            .iter()
            .map(|r| r.iter().map(|v| v * v).sum::<f32>().sqrt())
            .collect(),
        RowStatistic::DistMean => {
            let n = data.len();
            if n < 2 {
                vec![0.0; n]
            } else {
                data.iter()
                    .map(|a| data.iter().map(|b| euclidean(a, b)).sum::<f32>() / (n - 1) as f32)
                    .collect()
            }
        }
        RowStatistic::KnnDistance(k) => {
            if k == 0 {
                return Err(Error::InvalidParameter {
                    name: "k",
                    message: "must be at least 1",
                });
            }
            if k >= data.len() {
                return Err(Error::InvalidParameter {
                    name: "k",
                    message: "must be smaller than the number of rows",
                });
            }
            data.iter()
                .enumerate()
                .map(|(i, a)| {
                    let mut dists: Vec<f32> = data
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, b)| euclidean(a, b))
                        .collect();
                    dists.sort_by(f32::total_cmp);
                    dists[..k].iter().sum::<f32>() / k as f32
                })
                .collect()
        }
    };
    Ok(values.into_iter().map(|v| vec![v]).collect())
}

fn mean(row: &[f32]) -> f32 {
    row.iter().sum::<f32>() / row.len() as f32
}

fn median(row: &[f32]) -> f32 {
    let mut sorted = row.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(feature = "random-projection")]
fn random_projection(
    data: &[Vec<f32>],
    n_features: usize,
    n_components: usize,
    seed: Option<u64>,
) -> Result<Vec<Vec<f32>>> {
    use rand::prelude::*;

    if n_components == 0 {
        return Err(Error::InvalidParameter {
            name: "n_components",
            message: "must be at least 1",
        });
    }

    let mut rng: Box<dyn RngCore> = match seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(rand::rng()),
    };

    let mut directions: Vec<Vec<f32>> = Vec::with_capacity(n_components);
    for _ in 0..n_components {
        // Uniform in [-1, 1], then unit length.
        let mut dir: Vec<f32> = (0..n_features)
            .map(|_| rng.random::<f32>() * 2.0 - 1.0)
            .collect();
        let norm = dir.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut dir {
                *x /= norm;
            }
        }
        directions.push(dir);
    }

    Ok(data
        .iter()
        .map(|row| {
            directions
                .iter()
                .map(|dir| row.iter().zip(dir.iter()).map(|(x, w)| x * w).sum())
                .collect()
        })
        .collect())
}

#[cfg(not(feature = "random-projection"))]
fn random_projection(
    _data: &[Vec<f32>],
    _n_features: usize,
    _n_components: usize,
    _seed: Option<u64>,
) -> Result<Vec<Vec<f32>>> {
    Err(Error::CapabilityUnavailable(Capability::RandomProjection))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<Vec<f32>> {
        // Points along (1, 1) with a small orthogonal wobble.
        (0..8)
            .map(|i| {
                let t = i as f32;
                let w = if i % 2 == 0 { 0.05 } else { -0.05 };
                vec![t + w, t - w]
            })
            .collect()
    }

    #[test]
    fn pca_keeps_rows_and_orders_by_variance() {
        let data = line();
        let lens = ProjectionConfig::pca(2).fit_transform(&data).unwrap();
        assert_eq!(lens.len(), data.len());
        assert!(lens.iter().all(|r| r.len() == 2));

        let var = |c: usize| {
            let m = lens.iter().map(|r| r[c]).sum::<f32>() / lens.len() as f32;
            lens.iter().map(|r| (r[c] - m).powi(2)).sum::<f32>()
        };
        assert!(var(0) > var(1));

        // First component increases along the line.
        assert!(lens[7][0] > lens[0][0]);
    }

    #[test]
    fn pca_rejects_bad_component_counts() {
        let data = line();
        assert!(ProjectionConfig::pca(0).fit_transform(&data).is_err());
        assert!(ProjectionConfig::pca(3).fit_transform(&data).is_err());
    }

    #[test]
    fn pca_single_row_is_centered() {
        let lens = ProjectionConfig::pca(1)
            .fit_transform(&[vec![3.0, 4.0]])
            .unwrap();
        assert_eq!(lens.len(), 1);
        assert!(lens[0][0].abs() < 1e-6);
    }

    #[test]
    fn columns_select_in_order() {
        let data = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let lens = ProjectionConfig::Columns(vec![2, 0])
            .fit_transform(&data)
            .unwrap();
        assert_eq!(lens, vec![vec![3.0, 1.0], vec![6.0, 4.0]]);
        assert!(ProjectionConfig::Columns(vec![3]).fit_transform(&data).is_err());
        assert!(ProjectionConfig::Columns(vec![]).fit_transform(&data).is_err());
    }

    #[test]
    fn statistics_produce_one_column() {
        let data = vec![vec![1.0, 2.0, 6.0], vec![0.0, 0.0, 0.0]];
        let get = |s| {
            ProjectionConfig::Statistic(s)
                .fit_transform(&data)
                .unwrap()
                .into_iter()
                .map(|r| r[0])
                .collect::<Vec<f32>>()
        };
        assert_eq!(get(RowStatistic::Sum), vec![9.0, 0.0]);
        assert_eq!(get(RowStatistic::Mean), vec![3.0, 0.0]);
        assert_eq!(get(RowStatistic::Median), vec![2.0, 0.0]);
        assert_eq!(get(RowStatistic::Max), vec![6.0, 0.0]);
        assert_eq!(get(RowStatistic::Min), vec![1.0, 0.0]);
        let dist = (1.0f32 + 4.0 + 36.0).sqrt();
        assert!((get(RowStatistic::L2Norm)[0] - dist).abs() < 1e-5);
        assert!((get(RowStatistic::DistMean)[1] - dist).abs() < 1e-5);
        assert!(get(RowStatistic::Std)[0] > 0.0);
    }

    #[test]
    fn knn_distance_validates_k() {
        let data = vec![vec![0.0], vec![1.0], vec![3.0]];
        let lens = ProjectionConfig::Statistic(RowStatistic::KnnDistance(1))
            .fit_transform(&data)
            .unwrap();
        assert_eq!(lens, vec![vec![1.0], vec![1.0], vec![2.0]]);
        assert!(ProjectionConfig::Statistic(RowStatistic::KnnDistance(0))
            .fit_transform(&data)
            .is_err());
        assert!(ProjectionConfig::Statistic(RowStatistic::KnnDistance(3))
            .fit_transform(&data)
            .is_err());
    }

    #[test]
    fn identity_copies_data() {
        let data = vec![vec![1.0, 2.0]];
        assert_eq!(
            ProjectionConfig::Identity.fit_transform(&data).unwrap(),
            data
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let data: Vec<Vec<f32>> = vec![];
        assert!(matches!(
            ProjectionConfig::default().fit_transform(&data),
            Err(Error::EmptyInput)
        ));
    }

    struct RowCount;

    impl Projection for RowCount {
        fn fit_transform(&self, data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![data.len() as f32]; data.len()])
        }
    }

    #[test]
    fn custom_projection_sees_input_unvalidated() {
        // Ragged rows would fail the built-in shape check.
        let data = vec![vec![1.0], vec![1.0, 2.0]];
        let out = ProjectionConfig::custom(RowCount).fit_transform(&data).unwrap();
        assert_eq!(out, vec![vec![2.0], vec![2.0]]);
        assert!(ProjectionConfig::Identity.fit_transform(&data).is_err());
    }

    #[cfg(feature = "random-projection")]
    #[test]
    fn seeded_random_projection_is_reproducible() {
        let data = line();
        let p = ProjectionConfig::Random {
            n_components: 1,
            seed: Some(42),
        };
        let a = p.fit_transform(&data).unwrap();
        let b = p.fit_transform(&data).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|r| r.len() == 1));
    }

    #[cfg(not(feature = "random-projection"))]
    #[test]
    fn random_projection_reports_missing_capability() {
        let p = ProjectionConfig::Random {
            n_components: 1,
            seed: Some(42),
        };
        assert!(matches!(
            p.fit_transform(&line()),
            Err(Error::CapabilityUnavailable(Capability::RandomProjection))
        ));
    }
}
