//! Mapper graph: clusters within cover elements, linked by shared points.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::cluster::util::UnionFind;
use crate::cluster::{Clustering, NOISE};
use crate::cover::{Cover, CoverConfig};
use crate::error::{Error, Result};

/// One cluster found inside one cover element.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Stable identifier, `cube{element}_cluster{label}`.
    pub id: String,
    /// Index of the cover element the cluster was found in.
    pub cover_element: usize,
    /// Cluster label within that element.
    pub cluster: usize,
    /// Dataset row indices, ascending. Never empty.
    pub members: Vec<usize>,
}

/// How a graph was built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphMeta {
    /// Cover used.
    pub cover: CoverConfig,
    /// Clusterer description.
    pub clusterer: String,
    /// Dataset rows.
    pub n_points: usize,
    /// Elements in the fitted cover.
    pub n_cover_elements: usize,
    /// Elements skipped for holding fewer points than the clusterer needs.
    pub n_skipped_elements: usize,
}

/// Mapper output.
///
/// Nodes are `(cover element, cluster)` pairs; an edge `(a, b)` with `a < b`
/// joins two nodes whose member sets intersect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapperGraph {
    nodes: Vec<Node>,
    edges: Vec<(usize, usize)>,
    meta: GraphMeta,
}

impl MapperGraph {
    /// Cover `lens`, cluster `data` inside every element, and link the clusters.
    ///
    /// `lens` and `data` must have the same number of rows.
    pub fn build(
        lens: &[Vec<f32>],
        data: &[Vec<f32>],
        cover: &CoverConfig,
        clusterer: &dyn Clustering,
        clusterer_name: &str,
    ) -> Result<Self> {
        if lens.len() != data.len() {
            return Err(Error::RowMismatch {
                lens: lens.len(),
                data: data.len(),
            });
        }

        let fitted = Cover::fit(cover, lens)?;
        let min_samples = clusterer.min_cluster_samples().max(1);

        let mut nodes = Vec::new();
        let mut skipped = 0usize;
        for (element, rows) in fitted.assign(lens).into_iter().enumerate() {
            if rows.is_empty() {
                continue;
            }
            if rows.len() < min_samples {
                skipped += 1;
                continue;
            }

            let subset: Vec<Vec<f32>> = rows.iter().map(|&i| data[i].clone()).collect();
            let labels = clusterer.fit_predict(&subset)?;
            if labels.len() != rows.len() {
                return Err(Error::Other(format!(
                    "clusterer returned {} labels for {} points",
                    labels.len(),
                    rows.len()
                )));
            }

            let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (&row, &label) in rows.iter().zip(labels.iter()) {
                if label != NOISE {
                    clusters.entry(label).or_default().push(row);
                }
            }

            debug!(
                element,
                n_points = rows.len(),
                n_clusters = clusters.len(),
                "clustered cover element"
            );

            for (cluster, members) in clusters {
                nodes.push(Node {
                    id: format!("cube{element}_cluster{cluster}"),
                    cover_element: element,
                    cluster,
                    members,
                });
            }
        }

        let meta = GraphMeta {
            cover: *cover,
            clusterer: clusterer_name.to_string(),
            n_points: data.len(),
            n_cover_elements: fitted.len(),
            n_skipped_elements: skipped,
        };
        Ok(Self::from_nodes(nodes, meta))
    }

    fn from_nodes(nodes: Vec<Node>, meta: GraphMeta) -> Self {
        let mut by_point: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            for &row in &node.members {
                by_point.entry(row).or_default().push(idx);
            }
        }

        let mut edges = BTreeSet::new();
        for owners in by_point.values() {
            for (i, &a) in owners.iter().enumerate() {
                for &b in &owners[i + 1..] {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }

        Self {
            nodes,
            edges: edges.into_iter().collect(),
            meta,
        }
    }

    /// All nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges as node-index pairs `(a, b)` with `a < b`, sorted.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Build metadata.
    pub fn meta(&self) -> &GraphMeta {
        &self.meta
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look a node up by its id.
    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Indices of nodes adjacent to `node`.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().filter_map(move |&(a, b)| {
            if a == node {
                Some(b)
            } else if b == node {
                Some(a)
            } else {
                None
            }
        })
    }

    /// Adjacency keyed by node id, listing each edge once from its lower endpoint.
    pub fn links(&self) -> BTreeMap<String, Vec<String>> {
        let mut links: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for &(a, b) in &self.edges {
            links
                .entry(self.nodes[a].id.clone())
                .or_default()
                .push(self.nodes[b].id.clone());
        }
        links
    }

    /// 0-simplices (every node) followed by 1-simplices (every edge).
    pub fn simplices(&self) -> Vec<Vec<usize>> {
        (0..self.nodes.len())
            .map(|i| vec![i])
            .chain(self.edges.iter().map(|&(a, b)| vec![a, b]))
            .collect()
    }

    /// Connected components as sorted node-index lists, ordered by smallest member.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut uf = UnionFind::new(self.nodes.len());
        for &(a, b) in &self.edges {
            uf.union(a, b);
        }
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.nodes.len() {
            let root = uf.find(i);
            groups.entry(root).or_default().push(i);
        }
        let mut components: Vec<Vec<usize>> = groups.into_values().collect();
        components.sort_by_key(|c| c[0]);
        components
    }

    /// Indices of nodes whose members include dataset row `row`.
    pub fn nodes_containing(&self, row: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.members.binary_search(&row).is_ok())
            .map(|(i, _)| i)
            .collect()
    }

    /// Dataset rows that ended up in no node (noise or skipped elements).
    pub fn unclustered_points(&self) -> Vec<usize> {
        let mut seen = vec![false; self.meta.n_points];
        for node in &self.nodes {
            for &row in &node.members {
                seen[row] = true;
            }
        }
        seen.iter()
            .enumerate()
            .filter(|&(_, &s)| !s)
            .map(|(i, _)| i)
            .collect()
    }

    /// Serialize the graph as JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize the graph as JSON.
    ///
    /// This build lacks the `serde` feature, so this always fails.
    #[cfg(not(feature = "serde"))]
    pub fn to_json(&self) -> Result<String> {
        Err(Error::CapabilityUnavailable(
            crate::capability::Capability::GraphExport,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Dbscan;

    /// Puts every point in cluster 0, except negative first coordinates (noise).
    struct SignClusterer;

    impl Clustering for SignClusterer {
        fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
            Ok(data
                .iter()
                .map(|p| if p[0] < 0.0 { NOISE } else { 0 })
                .collect())
        }
    }

    struct Liar;

    impl Clustering for Liar {
        fn fit_predict(&self, _data: &[Vec<f32>]) -> Result<Vec<usize>> {
            Ok(vec![0])
        }
    }

    fn line_lens(n: usize) -> Vec<Vec<f32>> {
        (0..n).map(|i| vec![i as f32 / (n - 1) as f32]).collect()
    }

    #[test]
    fn overlapping_elements_produce_a_path() {
        let lens = line_lens(21);
        let data = lens.clone();
        let g = MapperGraph::build(
            &lens,
            &data,
            &CoverConfig::new(4, 0.3),
            &SignClusterer,
            "sign",
        )
        .unwrap();

        assert_eq!(g.len(), 4);
        assert_eq!(g.edges(), &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(g.connected_components(), vec![vec![0, 1, 2, 3]]);
        assert_eq!(g.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(g.nodes()[0].id, "cube0_cluster0");
        assert!(g.unclustered_points().is_empty());
        assert_eq!(g.meta().clusterer, "sign");
        assert_eq!(g.meta().n_cover_elements, 4);
    }

    #[test]
    fn edges_are_real_intersections() {
        let lens = line_lens(30);
        let data = lens.clone();
        let g = MapperGraph::build(
            &lens,
            &data,
            &CoverConfig::new(6, 0.4),
            &Dbscan::new(0.2, 2),
            "dbscan",
        )
        .unwrap();

        assert!(g.nodes().iter().all(|n| !n.members.is_empty()));
        for &(a, b) in g.edges() {
            assert!(a < b);
            let shared = g.nodes()[a]
                .members
                .iter()
                .any(|m| g.nodes()[b].members.contains(m));
            assert!(shared);
        }
    }

    #[test]
    fn noise_points_join_no_node() {
        let lens = line_lens(5);
        let data = vec![
            vec![-1.0],
            vec![1.0],
            vec![1.0],
            vec![1.0],
            vec![-1.0],
        ];
        let g = MapperGraph::build(&lens, &data, &CoverConfig::new(1, 0.5), &SignClusterer, "sign")
            .unwrap();
        assert_eq!(g.len(), 1);
        assert_eq!(g.nodes()[0].members, vec![1, 2, 3]);
        assert_eq!(g.unclustered_points(), vec![0, 4]);
        assert!(g.nodes_containing(0).is_empty());
        assert_eq!(g.nodes_containing(2), vec![0]);
    }

    #[test]
    fn small_elements_are_skipped() {
        let lens = vec![vec![0.0], vec![0.01], vec![1.0]];
        let data = lens.clone();
        let g = MapperGraph::build(
            &lens,
            &data,
            &CoverConfig::new(2, 0.1),
            &Dbscan::new(0.5, 2),
            "dbscan",
        )
        .unwrap();
        assert_eq!(g.len(), 1);
        assert_eq!(g.meta().n_skipped_elements, 1);
        assert_eq!(g.unclustered_points(), vec![2]);
    }

    #[test]
    fn links_and_simplices_follow_edges() {
        let lens = line_lens(11);
        let g = MapperGraph::build(
            &lens,
            &lens,
            &CoverConfig::new(2, 0.5),
            &SignClusterer,
            "sign",
        )
        .unwrap();
        let links = g.links();
        assert_eq!(links["cube0_cluster0"], vec!["cube1_cluster0".to_string()]);
        assert_eq!(g.simplices(), vec![vec![0], vec![1], vec![0, 1]]);
        assert!(g.node_by_id("cube1_cluster0").is_some());
        assert!(g.node_by_id("cube9_cluster0").is_none());
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        let lens = line_lens(3);
        let data = vec![vec![0.0]];
        assert!(matches!(
            MapperGraph::build(&lens, &data, &CoverConfig::default(), &SignClusterer, "sign"),
            Err(Error::RowMismatch { lens: 3, data: 1 })
        ));
    }

    #[test]
    fn clusterer_label_count_is_checked() {
        let lens = line_lens(4);
        assert!(matches!(
            MapperGraph::build(&lens, &lens, &CoverConfig::new(1, 0.5), &Liar, "liar"),
            Err(Error::Other(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_export_contains_nodes() {
        let lens = line_lens(5);
        let g = MapperGraph::build(&lens, &lens, &CoverConfig::new(1, 0.5), &SignClusterer, "sign")
            .unwrap();
        let json = g.to_json().unwrap();
        assert!(json.contains("cube0_cluster0"));
        let back: MapperGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }

    #[cfg(not(feature = "serde"))]
    #[test]
    fn json_export_requires_capability() {
        let lens = line_lens(5);
        let g = MapperGraph::build(&lens, &lens, &CoverConfig::new(1, 0.5), &SignClusterer, "sign")
            .unwrap();
        assert!(matches!(g.to_json(), Err(Error::CapabilityUnavailable(_))));
    }
}
