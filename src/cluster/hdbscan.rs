//! HDBSCAN: density clustering without a global radius.
//!
//! Where DBSCAN needs one `epsilon` for the whole point set, HDBSCAN builds the
//! full density hierarchy and keeps the clusters that persist longest:
//!
//! 1. **Core distance**: distance from each point to its `min_samples`-th
//!    nearest neighbor.
//! 2. **Mutual reachability**: `max(core[i], core[j], dist(i, j))`, which keeps
//!    sparse points from bridging dense groups.
//! 3. **Spanning tree** over mutual reachability, merged in ascending order.
//! 4. **Condensed tree**: a merge only counts as a split when both sides hold at
//!    least `min_cluster_size` points; smaller sides shed their points.
//! 5. **Selection**: keep the non-overlapping clusters of greatest stability.
//!    Everything else is [`NOISE`].
//!
//! Quadratic time and space, which is fine for the per-element subsets a Mapper
//! hands to its clusterer. Requires the `hdbscan` feature; without it
//! [`Clustering::fit_predict`] fails with
//! [`Error::CapabilityUnavailable`].
//!
//! ## References
//!
//! Campello, Moulavi, Sander (2013). "Density-Based Clustering Based on
//! Hierarchical Density Estimates." PAKDD 2013.

use super::traits::{Clustering, NOISE};
use super::util;
use crate::capability::Capability;
use crate::error::{Error, Result};

/// HDBSCAN clustering algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hdbscan {
    min_samples: usize,
    min_cluster_size: usize,
}

impl Hdbscan {
    /// Create an HDBSCAN clusterer.
    ///
    /// * `min_samples` - neighbor rank used for core distances.
    /// * `min_cluster_size` - smallest group that counts as a cluster.
    pub fn new(min_samples: usize, min_cluster_size: usize) -> Self {
        Self {
            min_samples,
            min_cluster_size,
        }
    }

    /// Set `min_samples`.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set `min_cluster_size`.
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    /// Neighbor rank used for core distances.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Smallest group that counts as a cluster.
    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Fit and predict, returning `None` for noise points.
    pub fn fit_predict_with_noise(&self, data: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        let labels = self.fit_predict(data)?;
        Ok(labels
            .into_iter()
            .map(|l| (l != NOISE).then_some(l))
            .collect())
    }

    fn validate(&self) -> Result<()> {
        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        if self.min_cluster_size < 2 {
            return Err(Error::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 2",
            });
        }
        Ok(())
    }
}

impl Default for Hdbscan {
    /// `min_samples = 5`, `min_cluster_size = 5`.
    fn default() -> Self {
        Self::new(5, 5)
    }
}

impl Clustering for Hdbscan {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        Capability::Hdbscan.require()?;
        self.validate()?;
        util::check_matrix(data)?;
        hierarchy(data, self.min_samples, self.min_cluster_size)
    }

    fn min_cluster_samples(&self) -> usize {
        self.min_cluster_size
    }
}

#[cfg(feature = "hdbscan")]
use condensed::hierarchy;

#[cfg(not(feature = "hdbscan"))]
fn hierarchy(
    _data: &[Vec<f32>],
    _min_samples: usize,
    _min_cluster_size: usize,
) -> Result<Vec<usize>> {
    Err(Error::CapabilityUnavailable(Capability::Hdbscan))
}

#[cfg(feature = "hdbscan")]
mod condensed {
    use crate::cluster::traits::NOISE;
    use crate::cluster::util::{euclidean, prim_mst, UnionFind};
    use crate::error::Result;

    pub(super) fn hierarchy(
        data: &[Vec<f32>],
        min_samples: usize,
        min_cluster_size: usize,
    ) -> Result<Vec<usize>> {
        let n = data.len();
        if n == 1 {
            return Ok(vec![NOISE]);
        }

        let dists = pairwise_distances(data);
        let core = core_distances(&dists, n, min_samples);
        let mut mst = prim_mst(n, |i, j| dists[i * n + j].max(core[i]).max(core[j]));
        mst.sort_by(|a, b| a.2.total_cmp(&b.2));

        Ok(CondensedTree::build(&mst, n, min_cluster_size).labels())
    }

    fn pairwise_distances(data: &[Vec<f32>]) -> Vec<f32> {
        let n = data.len();
        let mut dists = vec![0.0f32; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean(&data[i], &data[j]);
                dists[i * n + j] = d;
                dists[j * n + i] = d;
            }
        }
        dists
    }

    fn core_distances(dists: &[f32], n: usize, min_samples: usize) -> Vec<f32> {
        let k = min_samples.min(n - 1).max(1);
        (0..n)
            .map(|i| {
                let mut row: Vec<f32> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| dists[i * n + j])
                    .collect();
                row.sort_by(f32::total_cmp);
                row[k - 1]
            })
            .collect()
    }

    /// One row of the condensed tree: either a point leaving a cluster
    /// (`size == 1`, `child < n`) or a child cluster splitting off
    /// (`child >= n`), at density `lambda = 1 / distance`.
    struct Edge {
        parent: usize,
        child: usize,
        lambda: f64,
        size: usize,
    }

    /// Condensed cluster tree. Point ids are `0..n`, cluster ids start at `n`.
    struct CondensedTree {
        n: usize,
        next_id: usize,
        edges: Vec<Edge>,
    }

    impl CondensedTree {
        fn build(mst: &[(usize, usize, f32)], n: usize, min_cluster_size: usize) -> Self {
            let mut tree = Self {
                n,
                next_id: n,
                edges: Vec::new(),
            };
            let mut uf = UnionFind::new(n);
            // Component root -> cluster currently owning that component.
            let mut owner: Vec<Option<usize>> = vec![None; n];

            for &(u, v, dist) in mst {
                let (ru, rv) = (uf.find(u), uf.find(v));
                if ru == rv {
                    continue;
                }
                let lambda = if dist > 0.0 {
                    1.0 / f64::from(dist)
                } else {
                    f64::INFINITY
                };
                let (su, sv) = (uf.size[ru], uf.size[rv]);

                let merged = match (su >= min_cluster_size, sv >= min_cluster_size) {
                    (true, true) => {
                        let parent = tree.allocate();
                        let left = owner[ru].unwrap_or_else(|| tree.allocate());
                        let right = owner[rv].unwrap_or_else(|| tree.allocate());
                        tree.edges.push(Edge {
                            parent,
                            child: left,
                            lambda,
                            size: su,
                        });
                        tree.edges.push(Edge {
                            parent,
                            child: right,
                            lambda,
                            size: sv,
                        });
                        // Fresh children are born holding every point of their side.
                        if owner[ru].is_none() {
                            tree.shed(&uf, ru, left, lambda);
                        }
                        if owner[rv].is_none() {
                            tree.shed(&uf, rv, right, lambda);
                        }
                        Some(parent)
                    }
                    (true, false) | (false, true) => {
                        let (big, small) = if su >= min_cluster_size {
                            (ru, rv)
                        } else {
                            (rv, ru)
                        };
                        let cluster = match owner[big] {
                            Some(c) => c,
                            None => {
                                let c = tree.allocate();
                                tree.shed(&uf, big, c, lambda);
                                c
                            }
                        };
                        tree.shed(&uf, small, cluster, lambda);
                        Some(cluster)
                    }
                    (false, false) => owner[ru].or(owner[rv]),
                };

                let root = uf.union_roots(ru, rv);
                owner[root] = merged;
            }
            tree
        }

        fn allocate(&mut self) -> usize {
            let id = self.next_id;
            self.next_id += 1;
            id
        }

        /// Record every point of the component rooted at `root` under `cluster`.
        fn shed(&mut self, uf: &UnionFind, root: usize, cluster: usize, lambda: f64) {
            for p in 0..self.n {
                if uf.root_of(p) == root {
                    self.edges.push(Edge {
                        parent: cluster,
                        child: p,
                        lambda,
                        size: 1,
                    });
                }
            }
        }

        fn is_split(&self, edge: &Edge) -> bool {
            edge.size > 1 && edge.child >= self.n
        }

        fn labels(&self) -> Vec<usize> {
            let n = self.n;
            let k = self.next_id - n;
            if k == 0 {
                return vec![NOISE; n];
            }

            let mut birth = vec![0.0f64; k];
            let mut children: Vec<Vec<usize>> = vec![Vec::new(); k];
            for edge in self.edges.iter().filter(|e| self.is_split(e)) {
                birth[edge.child - n] = edge.lambda;
                children[edge.parent - n].push(edge.child - n);
            }

            let mut stability = vec![0.0f64; k];
            for edge in &self.edges {
                let c = edge.parent - n;
                stability[c] += edge.size as f64 * (edge.lambda - birth[c]);
            }

            // Parents are allocated before fresh children, so walk ids in reverse.
            let mut selected = vec![false; k];
            let mut subtree = stability.clone();
            for c in (0..k).rev() {
                if children[c].is_empty() {
                    selected[c] = true;
                    continue;
                }
                let below: f64 = children[c].iter().map(|&child| subtree[child]).sum();
                if stability[c] > below {
                    selected[c] = true;
                    deselect_descendants(&children, c, &mut selected);
                    subtree[c] = stability[c];
                } else {
                    subtree[c] = below;
                }
            }

            let mut labels = vec![NOISE; n];
            let mut next_label = 0;
            for c in (0..k).filter(|&c| selected[c]) {
                self.label_points(&selected, c, next_label, &mut labels);
                next_label += 1;
            }
            labels
        }

        /// Label the points of cluster `c` and of its unselected descendants.
        fn label_points(&self, selected: &[bool], c: usize, label: usize, labels: &mut [usize]) {
            let id = c + self.n;
            for edge in self.edges.iter().filter(|e| e.parent == id) {
                if edge.size == 1 && edge.child < self.n {
                    labels[edge.child] = label;
                } else if self.is_split(edge) && !selected[edge.child - self.n] {
                    self.label_points(selected, edge.child - self.n, label, labels);
                }
            }
        }
    }

    fn deselect_descendants(children: &[Vec<usize>], c: usize, selected: &mut [bool]) {
        for &child in &children[c] {
            selected[child] = false;
            deselect_descendants(children, child, selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(center: &[f32], n: usize, spread: f32) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| {
                center
                    .iter()
                    .enumerate()
                    .map(|(d, &c)| c + spread * ((i * 7 + d * 13) % 11) as f32 / 11.0 - spread / 2.0)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        for (h, name) in [
            (Hdbscan::new(0, 5), "min_samples"),
            (Hdbscan::new(3, 1), "min_cluster_size"),
        ] {
            match h.fit_predict(&data) {
                Err(Error::InvalidParameter { name: n, .. }) => assert_eq!(n, name),
                Err(Error::CapabilityUnavailable(Capability::Hdbscan)) => {
                    assert!(!Capability::Hdbscan.is_available())
                }
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn min_cluster_samples_is_min_cluster_size() {
        assert_eq!(Hdbscan::new(3, 7).min_cluster_samples(), 7);
        assert_eq!(Hdbscan::default(), Hdbscan::new(5, 5));
    }

    #[cfg(not(feature = "hdbscan"))]
    #[test]
    fn missing_feature_fails_fast() {
        let data = blob(&[0.0, 0.0], 10, 0.5);
        assert!(matches!(
            Hdbscan::default().fit_predict(&data),
            Err(Error::CapabilityUnavailable(Capability::Hdbscan))
        ));
    }

    #[cfg(feature = "hdbscan")]
    mod with_feature {
        use super::*;
        use std::collections::HashMap;

        #[test]
        fn separates_two_groups() {
            let mut data = blob(&[0.0, 0.0], 20, 0.5);
            data.extend(blob(&[20.0, 20.0], 20, 0.5));

            let labels = Hdbscan::new(3, 10).fit_predict(&data).unwrap();
            assert_eq!(labels.len(), 40);
            assert_ne!(labels[0], NOISE);
            assert_ne!(labels[20], NOISE);
            assert!(labels[..20].iter().all(|&l| l == labels[0]));
            assert!(labels[20..].iter().all(|&l| l == labels[20]));
            assert_ne!(labels[0], labels[20]);
        }

        #[test]
        fn one_group_gets_one_label() {
            let data = blob(&[0.0, 0.0], 20, 0.5);
            let labels = Hdbscan::new(3, 15).fit_predict(&data).unwrap();
            let clustered: Vec<usize> = labels.into_iter().filter(|&l| l != NOISE).collect();
            assert!(!clustered.is_empty());
            assert!(clustered.iter().all(|&l| l == clustered[0]));
        }

        #[test]
        fn oversized_min_cluster_size_is_all_noise() {
            let data = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![20.0, 20.0]];
            let labels = Hdbscan::new(2, 100).fit_predict(&data).unwrap();
            assert_eq!(labels, vec![NOISE; 3]);
        }

        #[test]
        fn single_point_is_noise() {
            assert_eq!(
                Hdbscan::new(3, 2).fit_predict(&[vec![1.0]]).unwrap(),
                vec![NOISE]
            );
        }

        #[test]
        fn min_samples_larger_than_input_is_clamped() {
            let data = blob(&[0.0, 0.0], 10, 0.5);
            assert_eq!(Hdbscan::new(100, 3).fit_predict(&data).unwrap().len(), 10);
        }

        #[test]
        fn clusters_meet_min_cluster_size() {
            let mut data = blob(&[0.0, 0.0], 25, 0.5);
            data.extend(blob(&[30.0, 30.0], 25, 0.5));
            data.push(vec![15.0, 15.0]);

            let labels = Hdbscan::new(3, 5).fit_predict(&data).unwrap();
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for l in labels.into_iter().filter(|&l| l != NOISE) {
                *counts.entry(l).or_default() += 1;
            }
            assert!(!counts.is_empty());
            assert!(counts.values().all(|&c| c >= 5), "{counts:?}");
        }

        #[test]
        fn noise_api_maps_noise_to_none() {
            let data = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![20.0, 20.0]];
            let labels = Hdbscan::new(2, 100).fit_predict_with_noise(&data).unwrap();
            assert_eq!(labels, vec![None; 3]);
        }

        #[test]
        fn bad_shapes_are_rejected() {
            let empty: Vec<Vec<f32>> = vec![];
            assert!(matches!(
                Hdbscan::default().fit_predict(&empty),
                Err(Error::EmptyInput)
            ));
            assert!(matches!(
                Hdbscan::default().fit_predict(&[vec![0.0, 0.0], vec![1.0]]),
                Err(Error::DimensionMismatch { .. })
            ));
        }
    }
}
