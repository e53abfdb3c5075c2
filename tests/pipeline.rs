use std::collections::BTreeSet;

use mapfit::{
    fit_mapper, run_mapper, ClustererConfig, Clustering, CoverConfig, Dbscan, Error, Hdbscan,
    Mapper, MapperGraph, MapperParams, MapperState, Projection, ProjectionConfig, Result, ScalerConfig,
    NOISE,
};

/// Two 4x5 grids (spacing 0.1), one near the origin and one near (10, 10).
fn two_blobs() -> Vec<Vec<f32>> {
    let mut data = Vec::new();
    for (cx, cy) in [(0.0f32, 0.0f32), (10.0, 10.0)] {
        for i in 0..4 {
            for j in 0..5 {
                data.push(vec![cx + i as f32 * 0.1, cy + j as f32 * 0.1]);
            }
        }
    }
    data
}

fn group_of(row: usize) -> usize {
    row / 20
}

fn assert_groups_not_merged(graph: &MapperGraph) {
    for node in graph.nodes() {
        let groups: BTreeSet<usize> = node.members.iter().map(|&m| group_of(m)).collect();
        assert_eq!(groups.len(), 1, "node {} mixes both groups", node.id);
    }
    for &(a, b) in graph.edges() {
        let ga = group_of(graph.nodes()[a].members[0]);
        let gb = group_of(graph.nodes()[b].members[0]);
        assert_eq!(ga, gb, "edge joins both groups");
    }
}

#[test]
fn well_separated_groups_stay_apart() {
    let data = two_blobs();
    let params = MapperParams::default()
        .with_projection(ProjectionConfig::pca(1))
        .with_cover(CoverConfig::new(5, 0.3))
        .with_clusterer(Dbscan::new(0.3, 3));

    let mapper = fit_mapper(&data, params).unwrap();
    let graph = mapper.graph().unwrap();

    assert!(graph.len() >= 2);
    assert_groups_not_merged(graph);
    assert!(graph.connected_components().len() >= 2);
    assert!(graph.unclustered_points().is_empty());
}

#[test]
fn well_separated_groups_stay_apart_with_heuristics() {
    let data = two_blobs();
    let params = MapperParams::default().with_projection(ProjectionConfig::pca(1));

    let run = run_mapper(&data, params).unwrap();
    assert!(run.graph.len() >= 2);
    assert_groups_not_merged(&run.graph);

    let cover = run.params.cover.unwrap();
    assert!(cover.resolution >= 1 && cover.gain > 0.0 && cover.gain < 1.0);
    match run.params.clusterer {
        Some(ClustererConfig::Dbscan(d)) => assert!(d.epsilon() > 0.0),
        other => panic!("unexpected clusterer {other:?}"),
    }
}

#[test]
fn fit_graph_on_fresh_mapper_needs_a_lens() {
    let data = two_blobs();
    let mut mapper = Mapper::default();
    let err = mapper.fit_graph(None, Some(&data)).unwrap_err();
    assert!(matches!(err, Error::MissingArgument("lens")));
    assert_eq!(mapper.state(), MapperState::Unfit);
    assert!(mapper.lens().is_none());
}

#[test]
fn lifecycle_transitions() {
    let data = two_blobs();
    let mut mapper = Mapper::new(MapperParams::default().with_verbose(0));
    assert_eq!(mapper.state(), MapperState::Unfit);

    mapper.fit_lens(&data).unwrap();
    assert_eq!(mapper.state(), MapperState::LensReady);

    mapper.fit_graph(None, None).unwrap();
    assert_eq!(mapper.state(), MapperState::GraphReady);

    mapper.fit_lens(&data).unwrap();
    assert_eq!(mapper.state(), MapperState::LensReady);
    assert!(mapper.graph().is_some());
}

/// Projects every row onto its first coordinate.
struct FirstCoordinate;

impl Projection for FirstCoordinate {
    fn fit_transform(&self, data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        Ok(data.iter().map(|row| vec![row[0]]).collect())
    }
}

/// Splits by sign of the second coordinate and rejects anything near zero.
struct SignSplit;

impl Clustering for SignSplit {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        Ok(data
            .iter()
            .map(|row| match row[1] {
                y if y > 0.5 => 1,
                y if y < -0.5 => 0,
                _ => NOISE,
            })
            .collect())
    }
}

#[test]
fn custom_collaborators_are_used() {
    let data: Vec<Vec<f32>> = (0..30)
        .map(|i| {
            let y = match i % 3 {
                0 => 1.0,
                1 => -1.0,
                _ => 0.0,
            };
            vec![i as f32, y]
        })
        .collect();

    let params = MapperParams::default()
        .with_projection(ProjectionConfig::custom(FirstCoordinate))
        .with_scaler(ScalerConfig::None)
        .with_cover(CoverConfig::new(3, 0.2))
        .with_clusterer(ClustererConfig::custom(SignSplit));

    let run = run_mapper(&data, params).unwrap();
    assert_eq!(run.lens[7], vec![7.0]);
    // Two sign clusters in each of three elements.
    assert_eq!(run.graph.len(), 6);
    assert_eq!(run.graph.meta().clusterer, "custom");
    // Rows with y == 0 are noise everywhere.
    assert_eq!(run.graph.unclustered_points().len(), 10);
    // Same-sign clusters in neighboring elements share overlap rows.
    assert_eq!(run.graph.connected_components().len(), 2);
}

#[test]
fn invalid_cover_is_reported_from_fit() {
    let data = two_blobs();
    let mut mapper = Mapper::new(MapperParams::default().with_cover(CoverConfig::new(4, 1.5)));
    assert!(matches!(
        mapper.fit(&data, None),
        Err(Error::InvalidParameter { name: "gain", .. })
    ));
    // The lens phase succeeded before the graph phase failed.
    assert_eq!(mapper.state(), MapperState::LensReady);
}

#[cfg(not(feature = "random-projection"))]
#[test]
fn random_projection_needs_its_capability() {
    let params = MapperParams::default().with_projection(ProjectionConfig::Random {
        n_components: 1,
        seed: Some(1),
    });
    assert!(matches!(
        fit_mapper(&two_blobs(), params),
        Err(Error::CapabilityUnavailable(mapfit::Capability::RandomProjection))
    ));
}

#[cfg(feature = "random-projection")]
#[test]
fn seeded_random_projection_is_reproducible_end_to_end() {
    let params = || {
        MapperParams::default()
            .with_verbose(0)
            .with_projection(ProjectionConfig::Random {
                n_components: 1,
                seed: Some(7),
            })
    };
    let a = run_mapper(&two_blobs(), params()).unwrap();
    let b = run_mapper(&two_blobs(), params()).unwrap();
    assert_eq!(a.lens, b.lens);
    assert_eq!(a.graph, b.graph);
}

#[cfg(feature = "hdbscan")]
#[test]
fn hdbscan_clusterer_keeps_groups_apart() {
    let params = MapperParams::default()
        .with_verbose(0)
        .with_projection(ProjectionConfig::pca(1))
        .with_cover(CoverConfig::new(3, 0.3))
        .with_clusterer(Hdbscan::new(3, 5));

    let run = run_mapper(&two_blobs(), params).unwrap();
    assert!(!run.graph.is_empty());
    assert_groups_not_merged(&run.graph);
    assert!(run.graph.meta().clusterer.starts_with("hdbscan"));
}

#[cfg(not(feature = "hdbscan"))]
#[test]
fn hdbscan_clusterer_needs_its_capability() {
    let data = two_blobs();
    let mut mapper = Mapper::new(MapperParams::default().with_verbose(0));
    mapper.fit_lens(&data).unwrap();
    // Fails before any cover element is clustered, even when none would be.
    let err = mapper
        .fit_graph_with(
            None,
            None,
            Some(Hdbscan::new(3, 1000).into()),
            Some(CoverConfig::new(2, 0.2)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CapabilityUnavailable(mapfit::Capability::Hdbscan)
    ));
    assert_eq!(mapper.state(), MapperState::LensReady);
    assert!(mapper.params().clusterer.is_none());
}
