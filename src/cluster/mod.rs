//! Clustering inside cover elements.
//!
//! The Mapper graph builder never clusters the whole dataset at once: it hands
//! each cover element's points to a [`Clustering`] implementation and turns the
//! resulting labels into graph nodes. Points labelled [`NOISE`] join no node.
//!
//! ## DBSCAN
//!
//! Density-based clustering that discovers the number of clusters on its own
//! and identifies outliers. It is the default clusterer, with `epsilon` and
//! `min_pts` picked by [`optimize_dbscan`](crate::optimize_dbscan) unless set
//! explicitly.
//!
//! ## HDBSCAN
//!
//! Hierarchical density clustering with no global radius (`hdbscan` feature).
//! Useful when cover elements differ widely in density.
//!
//! ## External clusterers
//!
//! [`ClustererConfig::Custom`] accepts any `Clustering + Send + Sync` value.
//!
//! ## Usage
//!
//! ```rust
//! use mapfit::cluster::{Clustering, Dbscan, NOISE};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//!     vec![50.0, 50.0],
//! ];
//!
//! let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! assert_eq!(labels[4], NOISE);
//! ```

mod config;
mod dbscan;
mod hdbscan;
mod traits;
pub(crate) mod util;

pub use config::ClustererConfig;
pub use dbscan::Dbscan;
pub use hdbscan::Hdbscan;
pub use traits::{Clustering, NOISE};
