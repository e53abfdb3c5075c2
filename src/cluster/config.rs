use std::fmt;
use std::sync::Arc;

use super::dbscan::Dbscan;
use super::hdbscan::Hdbscan;
use super::traits::Clustering;
use crate::capability::Capability;
use crate::error::Result;

/// Which clusterer the Mapper runs inside each cover element.
#[derive(Clone)]
pub enum ClustererConfig {
    /// Built-in density clustering.
    Dbscan(Dbscan),
    /// Hierarchical density clustering; needs the `hdbscan` feature.
    Hdbscan(Hdbscan),
    /// Any external implementation of [`Clustering`].
    Custom(Arc<dyn Clustering + Send + Sync>),
}

impl ClustererConfig {
    /// Wrap an external clusterer.
    pub fn custom<C>(clusterer: C) -> Self
    where
        C: Clustering + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(clusterer))
    }

    /// Short name for logs and graph metadata.
    pub fn describe(&self) -> String {
        match self {
            Self::Dbscan(d) => format!("dbscan(eps={}, min_pts={})", d.epsilon(), d.min_pts()),
            Self::Hdbscan(h) => format!(
                "hdbscan(min_samples={}, min_cluster_size={})",
                h.min_samples(),
                h.min_cluster_size()
            ),
            Self::Custom(_) => "custom".to_string(),
        }
    }

    /// Capability this clusterer cannot run without, if any.
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Self::Hdbscan(_) => Some(Capability::Hdbscan),
            Self::Dbscan(_) | Self::Custom(_) => None,
        }
    }
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self::Dbscan(Dbscan::default())
    }
}

impl From<Dbscan> for ClustererConfig {
    fn from(d: Dbscan) -> Self {
        Self::Dbscan(d)
    }
}

impl From<Hdbscan> for ClustererConfig {
    fn from(h: Hdbscan) -> Self {
        Self::Hdbscan(h)
    }
}

impl fmt::Debug for ClustererConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dbscan(d) => f.debug_tuple("Dbscan").field(d).finish(),
            Self::Hdbscan(h) => f.debug_tuple("Hdbscan").field(h).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Clustering for ClustererConfig {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        match self {
            Self::Dbscan(d) => d.fit_predict(data),
            Self::Hdbscan(h) => h.fit_predict(data),
            Self::Custom(c) => c.fit_predict(data),
        }
    }

    fn min_cluster_samples(&self) -> usize {
        match self {
            Self::Dbscan(d) => d.min_cluster_samples(),
            Self::Hdbscan(h) => h.min_cluster_samples(),
            Self::Custom(c) => c.min_cluster_samples(),
        }
    }
}
