//! The two-phase Mapper pipeline.
//!
//! Phase one projects the dataset onto a lens ([`Mapper::fit_lens`]); phase two
//! covers the lens, clusters the dataset inside each cover element and links the
//! clusters into a [`MapperGraph`] ([`Mapper::fit_graph`]). [`Mapper::fit`] runs
//! both, skipping phase one when a precomputed lens is supplied.
//!
//! ```rust
//! use mapfit::{Mapper, MapperParams, MapperState};
//!
//! let data: Vec<Vec<f32>> = (0..40)
//!     .map(|i| vec![i as f32 * 0.1, (i % 3) as f32 * 0.05])
//!     .collect();
//!
//! let mut mapper = Mapper::new(MapperParams::default());
//! mapper.fit(&data, None).unwrap();
//! assert_eq!(mapper.state(), MapperState::GraphReady);
//! assert_eq!(mapper.lens().unwrap().len(), data.len());
//! assert!(!mapper.graph().unwrap().is_empty());
//! ```

use tracing::{debug, info};

use crate::capability;
use crate::cluster::ClustererConfig;
use crate::cover::CoverConfig;
use crate::error::{Error, Result};
use crate::graph::MapperGraph;
use crate::heuristics::{optimize_cover_for, optimize_dbscan};
use crate::lens::{compute_lens, ProjectionConfig, ScalerConfig};

/// Named configuration for a [`Mapper`].
///
/// `cover` and `clusterer` left as `None` are chosen per fit by
/// [`optimize_cover`](crate::optimize_cover) and [`optimize_dbscan`].
#[derive(Clone, Debug)]
pub struct MapperParams {
    /// Lens projection.
    pub projection: ProjectionConfig,
    /// Lens rescaling applied after the projection.
    pub scaler: ScalerConfig,
    /// Cover over the lens range.
    pub cover: Option<CoverConfig>,
    /// Clusterer run inside each cover element.
    pub clusterer: Option<ClustererConfig>,
    /// 0 is quiet; 1 logs the graph summary at `info` level, 2 or more also
    /// the lens summary.
    pub verbose: u8,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            scaler: ScalerConfig::default(),
            cover: None,
            clusterer: None,
            verbose: 1,
        }
    }
}

impl MapperParams {
    /// Set the projection.
    pub fn with_projection(mut self, projection: ProjectionConfig) -> Self {
        self.projection = projection;
        self
    }

    /// Set the scaler.
    pub fn with_scaler(mut self, scaler: ScalerConfig) -> Self {
        self.scaler = scaler;
        self
    }

    /// Fix the cover instead of deriving it from the data.
    pub fn with_cover(mut self, cover: CoverConfig) -> Self {
        self.cover = Some(cover);
        self
    }

    /// Fix the clusterer instead of deriving it from the data.
    pub fn with_clusterer(mut self, clusterer: impl Into<ClustererConfig>) -> Self {
        self.clusterer = Some(clusterer.into());
        self
    }

    /// Set the verbosity.
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Lifecycle position of a [`Mapper`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapperState {
    /// Nothing fitted yet.
    Unfit,
    /// A lens has been computed; any stored graph predates it.
    LensReady,
    /// The stored graph was built from the stored lens and data.
    GraphReady,
}

/// Stateful Mapper pipeline.
///
/// Fitting overwrites the stored data, lens and graph wholesale; there is no
/// reset, a fresh instance discards state.
#[derive(Clone, Debug)]
pub struct Mapper {
    params: MapperParams,
    state: MapperState,
    data: Option<Vec<Vec<f32>>>,
    lens: Option<Vec<Vec<f32>>>,
    graph: Option<MapperGraph>,
    resolved_cover: Option<CoverConfig>,
    resolved_clusterer: Option<ClustererConfig>,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(MapperParams::default())
    }
}

impl Mapper {
    /// Create an unfitted pipeline.
    pub fn new(params: MapperParams) -> Self {
        capability::warn_missing_once();
        Self {
            params,
            state: MapperState::Unfit,
            data: None,
            lens: None,
            graph: None,
            resolved_cover: None,
            resolved_clusterer: None,
        }
    }

    /// Compute the lens of `data` with the configured projection and scaler.
    pub fn fit_lens(&mut self, data: &[Vec<f32>]) -> Result<&mut Self> {
        self.fit_lens_with(data, None, None)
    }

    /// Compute the lens of `data`, replacing the projection and/or scaler first.
    pub fn fit_lens_with(
        &mut self,
        data: &[Vec<f32>],
        projection: Option<ProjectionConfig>,
        scaler: Option<ScalerConfig>,
    ) -> Result<&mut Self> {
        let projection = projection.unwrap_or_else(|| self.params.projection.clone());
        let scaler = scaler.unwrap_or_else(|| self.params.scaler.clone());

        let lens = compute_lens(data, &projection, &scaler)?;
        // The lens phase reports one level quieter than the graph phase.
        if self.params.verbose > 1 {
            info!(
                n_samples = data.len(),
                lens_dim = lens.first().map_or(0, Vec::len),
                projection = ?projection,
                "lens fitted"
            );
        }

        self.params.projection = projection;
        self.params.scaler = scaler;
        self.data = Some(data.to_vec());
        self.lens = Some(lens);
        self.state = MapperState::LensReady;
        Ok(self)
    }

    /// Build the graph from `lens` and `data`.
    ///
    /// Either argument may be omitted when a previous fit stored one; with
    /// neither available the call fails with [`Error::MissingArgument`].
    pub fn fit_graph(
        &mut self,
        lens: Option<&[Vec<f32>]>,
        data: Option<&[Vec<f32>]>,
    ) -> Result<&mut Self> {
        self.fit_graph_with(lens, data, None, None)
    }

    /// Build the graph, replacing the clusterer and/or cover first.
    pub fn fit_graph_with(
        &mut self,
        lens: Option<&[Vec<f32>]>,
        data: Option<&[Vec<f32>]>,
        clusterer: Option<ClustererConfig>,
        cover: Option<CoverConfig>,
    ) -> Result<&mut Self> {
        let lens: Vec<Vec<f32>> = match lens {
            Some(lens) => lens.to_vec(),
            None => self.lens.clone().ok_or(Error::MissingArgument("lens"))?,
        };
        let data: Vec<Vec<f32>> = match data {
            Some(data) => data.to_vec(),
            None => self.data.clone().ok_or(Error::MissingArgument("data"))?,
        };
        if lens.len() != data.len() {
            return Err(Error::RowMismatch {
                lens: lens.len(),
                data: data.len(),
            });
        }

        let explicit_clusterer = clusterer.or_else(|| self.params.clusterer.clone());
        let explicit_cover = cover.or(self.params.cover);

        let clusterer = explicit_clusterer
            .clone()
            .unwrap_or_else(|| ClustererConfig::Dbscan(optimize_dbscan(&data)));
        let lens_dim = lens.first().map_or(1, Vec::len);
        let cover = explicit_cover.unwrap_or_else(|| optimize_cover_for(&data, lens_dim));
        debug!(clusterer = ?clusterer, cover = ?cover, "graph parameters resolved");
        if let Some(capability) = clusterer.required_capability() {
            capability.require()?;
        }

        let graph = MapperGraph::build(&lens, &data, &cover, &clusterer, &clusterer.describe())?;
        if self.params.verbose > 0 {
            info!(
                n_nodes = graph.len(),
                n_edges = graph.edges().len(),
                resolution = cover.resolution,
                gain = cover.gain,
                clusterer = %clusterer.describe(),
                "graph fitted"
            );
        }

        self.params.clusterer = explicit_clusterer;
        self.params.cover = explicit_cover;
        self.data = Some(data);
        self.lens = Some(lens);
        self.graph = Some(graph);
        self.resolved_cover = Some(cover);
        self.resolved_clusterer = Some(clusterer);
        self.state = MapperState::GraphReady;
        Ok(self)
    }

    /// Fit the lens (unless `lens` is given), then always build the graph.
    pub fn fit(&mut self, data: &[Vec<f32>], lens: Option<&[Vec<f32>]>) -> Result<&mut Self> {
        match lens {
            Some(lens) => self.fit_graph(Some(lens), Some(data)),
            None => {
                self.fit_lens(data)?;
                self.fit_graph(None, Some(data))
            }
        }
    }

    /// Fit and return the lens.
    pub fn fit_transform(&mut self, data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        self.fit(data, None)?;
        self.lens.clone().ok_or(Error::MissingArgument("lens"))
    }

    /// Fit and return the graph.
    pub fn fit_map(&mut self, data: &[Vec<f32>]) -> Result<MapperGraph> {
        self.fit(data, None)?;
        self.graph.clone().ok_or(Error::MissingArgument("graph"))
    }

    /// Configuration, including any overrides passed to the `*_with` methods.
    pub fn params(&self) -> &MapperParams {
        &self.params
    }

    /// Configuration as used by the last graph fit, heuristic choices filled in.
    pub fn resolved_params(&self) -> MapperParams {
        MapperParams {
            cover: self.resolved_cover.or(self.params.cover),
            clusterer: self
                .resolved_clusterer
                .clone()
                .or_else(|| self.params.clusterer.clone()),
            ..self.params.clone()
        }
    }

    /// Lifecycle position.
    pub fn state(&self) -> MapperState {
        self.state
    }

    /// Copy of the last fitted dataset.
    pub fn data(&self) -> Option<&[Vec<f32>]> {
        self.data.as_deref()
    }

    /// Last fitted lens.
    pub fn lens(&self) -> Option<&[Vec<f32>]> {
        self.lens.as_deref()
    }

    /// Last fitted graph.
    pub fn graph(&self) -> Option<&MapperGraph> {
        self.graph.as_ref()
    }
}

/// Everything a single pipeline run produced.
#[derive(Clone, Debug)]
pub struct MapperRun {
    /// Copy of the input dataset.
    pub data: Vec<Vec<f32>>,
    /// Lens.
    pub lens: Vec<Vec<f32>>,
    /// Graph.
    pub graph: MapperGraph,
    /// Parameters used, heuristic choices filled in.
    pub params: MapperParams,
}

/// Build a [`Mapper`] from `params` and fit it on `data`.
pub fn fit_mapper(data: &[Vec<f32>], params: MapperParams) -> Result<Mapper> {
    let mut mapper = Mapper::new(params);
    mapper.fit(data, None)?;
    Ok(mapper)
}

/// Fit a [`Mapper`] on `data` and bundle its outputs.
pub fn run_mapper(data: &[Vec<f32>], params: MapperParams) -> Result<MapperRun> {
    let mapper = fit_mapper(data, params)?;
    let params = mapper.resolved_params();
    let Mapper {
        data, lens, graph, ..
    } = mapper;
    match (data, lens, graph) {
        (Some(data), Some(lens), Some(graph)) => Ok(MapperRun {
            data,
            lens,
            graph,
            params,
        }),
        (None, _, _) => Err(Error::MissingArgument("data")),
        (_, None, _) => Err(Error::MissingArgument("lens")),
        (_, _, None) => Err(Error::MissingArgument("graph")),
    }
}
