use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub(crate) struct UnionFind {
    pub(crate) parent: Vec<usize>,
    pub(crate) size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find(a);
        let rb = self.find(b);
        self.union_roots(ra, rb)
    }

    /// Merge two components given their roots; returns the new root.
    pub(crate) fn union_roots(&mut self, ra: usize, rb: usize) -> usize {
        if ra == rb {
            return ra;
        }

        // Union by size.
        let (mut big, mut small) = (ra, rb);
        if self.size[big] < self.size[small] {
            std::mem::swap(&mut big, &mut small);
        }

        self.parent[small] = big;
        self.size[big] += self.size[small];
        big
    }

    /// Root of `x` without path compression.
    #[cfg(feature = "hdbscan")]
    pub(crate) fn root_of(&self, mut x: usize) -> usize {
        while self.parent[x] != x {
            x = self.parent[x];
        }
        x
    }
}

/// Minimum spanning tree of a dense complete graph (Prim, O(n²)).
///
/// `dist(i, j)` is the edge weight; returns `(u, v, weight)` edges.
#[cfg(feature = "hdbscan")]
pub(crate) fn prim_mst(n: usize, dist: impl Fn(usize, usize) -> f32) -> Vec<(usize, usize, f32)> {
    if n <= 1 {
        return Vec::new();
    }

    let mut in_tree = vec![false; n];
    let mut best = vec![f32::INFINITY; n];
    let mut via = vec![usize::MAX; n];
    best[0] = 0.0;

    for _ in 0..n {
        let next = (0..n)
            .filter(|&i| !in_tree[i])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]));
        let Some(u) = next else {
            break;
        };
        in_tree[u] = true;

        for v in (0..n).filter(|&v| !in_tree[v]) {
            let d = dist(u, v);
            if d < best[v] {
                best[v] = d;
                via[v] = u;
            }
        }
    }

    (1..n)
        .filter(|&v| via[v] != usize::MAX)
        .map(|v| (via[v], v, best[v]))
        .collect()
}

#[inline]
pub(crate) fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Validate a dense matrix and return its row width.
///
/// Rejects empty input, zero-width rows, and ragged rows.
pub(crate) fn check_matrix(data: &[Vec<f32>]) -> Result<usize> {
    let first = data.first().ok_or(Error::EmptyInput)?;
    let d = first.len();
    if d == 0 {
        return Err(Error::InvalidParameter {
            name: "dimension",
            message: "must be at least 1",
        });
    }
    for point in data.iter().skip(1) {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
    }
    Ok(d)
}

/// Per-column `(min, max)` of a validated matrix.
pub(crate) fn column_bounds(data: &[Vec<f32>], d: usize) -> Vec<(f32, f32)> {
    let mut bounds = vec![(f32::INFINITY, f32::NEG_INFINITY); d];
    for row in data {
        for (b, &v) in bounds.iter_mut().zip(row.iter()) {
            b.0 = b.0.min(v);
            b.1 = b.1.max(v);
        }
    }
    bounds
}
