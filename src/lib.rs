//! Mapper pipelines for dense vectors.
//!
//! `mapfit` drives the Mapper construction from topological data analysis
//! through a uniform `fit` / `fit_transform` / `fit_map` interface:
//!
//! 1. project the dataset onto a low-dimensional **lens** ([`lens`]),
//! 2. cover the lens range with overlapping elements ([`cover`]),
//! 3. cluster the points inside each element ([`cluster`]),
//! 4. link clusters that share points into a [`MapperGraph`] ([`graph`]).
//!
//! Every collaborator sits behind a trait ([`Projection`], [`Scaler`],
//! [`Clustering`]) so external implementations can be plugged in. When no cover
//! or clusterer is configured, [`optimize_cover`] and [`optimize_dbscan`] pick
//! them from the data.
//!
//! ```rust
//! use mapfit::{CoverConfig, Dbscan, MapperParams, ProjectionConfig};
//!
//! let mut data: Vec<Vec<f32>> = Vec::new();
//! for i in 0..20 {
//!     data.push(vec![i as f32 * 0.01, 0.0]);
//!     data.push(vec![10.0 + i as f32 * 0.01, 10.0]);
//! }
//!
//! let params = MapperParams::default()
//!     .with_projection(ProjectionConfig::pca(1))
//!     .with_cover(CoverConfig::new(5, 0.3))
//!     .with_clusterer(Dbscan::new(0.5, 2));
//! let run = mapfit::run_mapper(&data, params).unwrap();
//! assert_eq!(run.graph.connected_components().len(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod capability;
pub mod cluster;
pub mod cover;
pub mod error;
pub mod graph;
pub mod heuristics;
pub mod lens;
pub mod mapper;

pub use capability::Capability;
pub use cluster::{ClustererConfig, Clustering, Dbscan, Hdbscan, NOISE};
pub use cover::{Cover, CoverConfig, CoverElement};
pub use error::{Error, Result};
pub use graph::{GraphMeta, MapperGraph, Node};
pub use heuristics::{optimize_cover, optimize_cover_for, optimize_dbscan};
pub use lens::{Projection, ProjectionConfig, RowStatistic, Scaler, ScalerConfig};
pub use mapper::{fit_mapper, run_mapper, Mapper, MapperParams, MapperRun, MapperState};
