//! Overlapping covers of the lens range.
//!
//! Every lens dimension with range `[lo, hi]` is split into `resolution`
//! segments of equal width `w = (hi - lo) / (r - (r - 1) g)`. Segment `i` starts
//! at `lo + i w (1 - g)`, so neighbors overlap by exactly `g w` and the last
//! segment ends at `hi`. Cover elements are the cartesian product of the
//! per-dimension segments, indexed row-major over their grid position.

use tracing::debug;

use crate::cluster::util::{check_matrix, column_bounds};
use crate::error::{Error, Result};

/// Upper bound on `resolution ^ lens_dim`.
pub const MAX_ELEMENTS: usize = 1 << 20;

/// Cover parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverConfig {
    /// Segments per lens dimension.
    pub resolution: usize,
    /// Overlap fraction between adjacent segments, in `(0, 1)`.
    pub gain: f32,
}

impl CoverConfig {
    /// Create a cover configuration.
    pub fn new(resolution: usize, gain: f32) -> Self {
        Self { resolution, gain }
    }

    /// Set the number of segments per dimension.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the overlap fraction.
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Check `resolution >= 1` and `0 < gain < 1`.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(Error::InvalidParameter {
                name: "resolution",
                message: "must be at least 1",
            });
        }
        if !(self.gain > 0.0 && self.gain < 1.0) {
            return Err(Error::InvalidParameter {
                name: "gain",
                message: "must lie strictly between 0 and 1",
            });
        }
        Ok(())
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self::new(10, 0.1)
    }
}

/// One hyper-rectangle of a fitted cover.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverElement {
    /// Row-major index of this element.
    pub index: usize,
    /// Segment index along each lens dimension.
    pub grid: Vec<usize>,
    /// Inclusive lower corner.
    pub lower: Vec<f32>,
    /// Inclusive upper corner.
    pub upper: Vec<f32>,
}

impl CoverElement {
    /// Whether `point` lies inside this element (bounds inclusive).
    pub fn contains(&self, point: &[f32]) -> bool {
        point.len() == self.lower.len()
            && point
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }
}

#[derive(Clone, Debug)]
struct Axis {
    lo: f32,
    hi: f32,
    width: f32,
    stride: f32,
}

impl Axis {
    fn segment(&self, i: usize, resolution: usize) -> (f32, f32) {
        let start = self.lo + i as f32 * self.stride;
        let end = if i + 1 == resolution {
            self.hi
        } else {
            start + self.width
        };
        (start, end)
    }
}

/// A cover fitted to a particular lens.
#[derive(Clone, Debug)]
pub struct Cover {
    config: CoverConfig,
    axes: Vec<Axis>,
    elements: Vec<CoverElement>,
}

impl Cover {
    /// Fit `config` to the range of `lens`.
    pub fn fit(config: &CoverConfig, lens: &[Vec<f32>]) -> Result<Self> {
        config.validate()?;
        let dim = check_matrix(lens)?;
        if lens.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "lens",
                message: "values must be finite",
            });
        }

        let r = config.resolution;
        let n_elements = u32::try_from(dim)
            .ok()
            .and_then(|d| r.checked_pow(d))
            .filter(|&n| n <= MAX_ELEMENTS)
            .ok_or(Error::InvalidParameter {
                name: "resolution",
                message: "too many cover elements for this lens dimension",
            })?;

        let axes: Vec<Axis> = column_bounds(lens, dim)
            .into_iter()
            .map(|(mut lo, mut hi)| {
                if hi <= lo {
                    // Constant dimension: pad to unit width around the value.
                    lo -= 0.5;
                    hi += 0.5;
                }
                let width = (hi - lo) / (r as f32 - (r as f32 - 1.0) * config.gain);
                Axis {
                    lo,
                    hi,
                    width,
                    stride: width * (1.0 - config.gain),
                }
            })
            .collect();

        let mut elements = Vec::with_capacity(n_elements);
        for index in 0..n_elements {
            let grid = unflatten(index, r, dim);
            let (lower, upper): (Vec<f32>, Vec<f32>) = grid
                .iter()
                .zip(axes.iter())
                .map(|(&g, axis)| axis.segment(g, r))
                .unzip();
            elements.push(CoverElement {
                index,
                grid,
                lower,
                upper,
            });
        }

        debug!(
            resolution = r,
            gain = config.gain,
            lens_dim = dim,
            n_elements,
            "cover fitted"
        );

        Ok(Self {
            config: *config,
            axes,
            elements,
        })
    }

    /// Configuration this cover was fitted with.
    pub fn config(&self) -> &CoverConfig {
        &self.config
    }

    /// Lens dimensionality.
    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    /// All elements, in index order.
    pub fn elements(&self) -> &[CoverElement] {
        &self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the cover has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Indices of the elements containing `point`, ascending.
    ///
    /// Points inside the fitted range always get at least one element; points
    /// outside it (or of the wrong width) get none.
    pub fn membership(&self, point: &[f32]) -> Vec<usize> {
        if point.len() != self.dim() {
            return Vec::new();
        }
        let r = self.config.resolution;

        let mut per_axis: Vec<Vec<usize>> = Vec::with_capacity(self.dim());
        for (&v, axis) in point.iter().zip(self.axes.iter()) {
            if !(v >= axis.lo && v <= axis.hi) {
                return Vec::new();
            }
            let mut hits: Vec<usize> = (0..r)
                .filter(|&i| {
                    let (start, end) = axis.segment(i, r);
                    v >= start && v <= end
                })
                .collect();
            if hits.is_empty() {
                // Rounding at a segment edge; fall back to the segment the value starts in.
                let i = ((v - axis.lo) / axis.stride).floor().max(0.0) as usize;
                hits.push(i.min(r - 1));
            }
            per_axis.push(hits);
        }

        let mut out = vec![0usize];
        for hits in &per_axis {
            out = out
                .iter()
                .flat_map(|&prefix| hits.iter().map(move |&h| prefix * r + h))
                .collect();
        }
        out
    }

    /// Row indices of `lens` falling into each element.
    pub fn assign(&self, lens: &[Vec<f32>]) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.elements.len()];
        for (row, point) in lens.iter().enumerate() {
            for element in self.membership(point) {
                members[element].push(row);
            }
        }
        members
    }
}

fn unflatten(mut index: usize, r: usize, dim: usize) -> Vec<usize> {
    let mut grid = vec![0; dim];
    for slot in grid.iter_mut().rev() {
        *slot = index % r;
        index /= r;
    }
    grid
}
