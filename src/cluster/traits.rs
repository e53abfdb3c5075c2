use crate::error::Result;

/// Label reserved for points that belong to no cluster.
pub const NOISE: usize = usize::MAX;

/// Common interface for hard clustering algorithms (one label per point).
///
/// This is the seam through which the Mapper graph builder talks to a clusterer:
/// any implementation can be plugged in via
/// [`ClustererConfig::Custom`](super::ClustererConfig::Custom).
pub trait Clustering {
    /// Fit the model (if needed) and return one cluster label per input point.
    ///
    /// Points labelled [`NOISE`] are excluded from every cluster.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>>;

    /// Smallest point set worth clustering.
    ///
    /// Cover elements with fewer points are skipped by the graph builder.
    fn min_cluster_samples(&self) -> usize {
        1
    }
}
