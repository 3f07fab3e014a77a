//! Coverage variants (gridded and scattered sample data).

use serde::{Deserialize, Serialize};

use super::geometry::{Envelope, MultiPoint, Position};

/// Grid index limits; `high - low + 1` is the pixel extent per axis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLimits {
    pub low: Vec<i64>,
    pub high: Vec<i64>,
}

impl GridLimits {
    pub fn new(low: Vec<i64>, high: Vec<i64>) -> Self {
        Self { low, high }
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.low.len().min(self.high.len())
    }

    /// Pixel extent along `axis`, `None` past the last axis or when the
    /// limits are inverted.
    pub fn extent(&self, axis: usize) -> Option<u64> {
        let low = *self.low.get(axis)?;
        let high = *self.high.get(axis)?;
        u64::try_from(high - low + 1).ok()
    }

    /// Pixel extents of all axes.
    pub fn extents(&self) -> Vec<u64> {
        (0..self.dimension())
            .map(|axis| self.extent(axis).unwrap_or(0))
            .collect()
    }
}

/// Domain of a gridded coverage: limits, axis labels and dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDomain {
    pub limits: GridLimits,
    pub axis_labels: Vec<String>,
    pub dimension: usize,
}

impl GridDomain {
    pub fn new(limits: GridLimits) -> Self {
        let dimension = limits.dimension();
        Self {
            limits,
            axis_labels: Vec::new(),
            dimension,
        }
    }

    pub fn with_axis_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.axis_labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// One band / field of a coverage's range type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeField {
    pub name: String,
    pub uom: Option<String>,
    pub description: Option<String>,
    pub data_type: Option<String>,
}

impl RangeField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Where a coverage's values live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RangeSet {
    /// Values inline in a `DataBlock` tuple list (may be empty).
    Inline { tuples: Vec<Position> },
    /// Values in an external file.
    File {
        file_name: String,
        file_structure: Option<String>,
    },
}

impl Default for RangeSet {
    fn default() -> Self {
        RangeSet::Inline { tuples: Vec::new() }
    }
}

/// Temporal axis metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalAxis {
    pub start: String,
    pub end: String,
    pub resolution: Option<String>,
    pub uom: Option<String>,
}

/// Grid with an explicit origin and per-axis offset vectors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RectifiedGridCoverage {
    pub id: Option<String>,
    pub bounded_by: Option<Envelope>,
    pub domain: GridDomain,
    pub srs_name: Option<String>,
    pub origin: Position,
    pub offset_vectors: Vec<Position>,
    pub range_type: Vec<RangeField>,
    pub range_set: RangeSet,
    pub temporal: Option<TemporalAxis>,
}

impl RectifiedGridCoverage {
    /// World position of a (possibly fractional) grid index:
    /// `origin + Σ index[i] * offset_vectors[i]`.
    pub fn grid_to_world(&self, index: &[f64]) -> Position {
        let mut world = self.origin.clone();
        for (step, offset) in index.iter().zip(&self.offset_vectors) {
            for (w, o) in world.iter_mut().zip(offset) {
                *w += step * o;
            }
        }
        world
    }

    /// Grid index of a world position for 2D grids.
    ///
    /// Returns `None` for non-2D grids or when the offset vectors are
    /// linearly dependent.
    pub fn world_to_grid(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let [u, v] = self.offset_vectors.as_slice() else {
            return None;
        };
        let (&ox, &oy) = (self.origin.first()?, self.origin.get(1)?);
        let (ux, uy) = (*u.first()?, *u.get(1)?);
        let (vx, vy) = (*v.first()?, *v.get(1)?);

        let det = ux * vy - vx * uy;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let (dx, dy) = (x - ox, y - oy);
        let i = (dx * vy - vx * dy) / det;
        let j = (ux * dy - dx * uy) / det;
        Some((i, j))
    }
}

/// Grid with index limits only (also used for referenceable grids).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridCoverage {
    pub id: Option<String>,
    pub bounded_by: Option<Envelope>,
    pub domain: GridDomain,
    pub range_type: Vec<RangeField>,
    pub range_set: RangeSet,
    pub temporal: Option<TemporalAxis>,
}

/// Coverage whose domain is a set of points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiPointCoverage {
    pub id: Option<String>,
    pub bounded_by: Option<Envelope>,
    pub domain: MultiPoint,
    pub range_type: Vec<RangeField>,
    pub range_set: RangeSet,
    pub temporal: Option<TemporalAxis>,
}

/// Discriminated union of the coverage kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Coverage {
    RectifiedGrid(RectifiedGridCoverage),
    Grid(GridCoverage),
    ReferenceableGrid(GridCoverage),
    MultiPoint(MultiPointCoverage),
}

impl Coverage {
    /// GML element name of this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Coverage::RectifiedGrid(_) => "RectifiedGridCoverage",
            Coverage::Grid(_) => "GridCoverage",
            Coverage::ReferenceableGrid(_) => "ReferenceableGridCoverage",
            Coverage::MultiPoint(_) => "MultiPointCoverage",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Coverage::RectifiedGrid(c) => c.id.as_deref(),
            Coverage::Grid(c) | Coverage::ReferenceableGrid(c) => c.id.as_deref(),
            Coverage::MultiPoint(c) => c.id.as_deref(),
        }
    }

    pub fn bounded_by(&self) -> Option<&Envelope> {
        match self {
            Coverage::RectifiedGrid(c) => c.bounded_by.as_ref(),
            Coverage::Grid(c) | Coverage::ReferenceableGrid(c) => c.bounded_by.as_ref(),
            Coverage::MultiPoint(c) => c.bounded_by.as_ref(),
        }
    }

    pub fn range_type(&self) -> &[RangeField] {
        match self {
            Coverage::RectifiedGrid(c) => &c.range_type,
            Coverage::Grid(c) | Coverage::ReferenceableGrid(c) => &c.range_type,
            Coverage::MultiPoint(c) => &c.range_type,
        }
    }

    pub fn range_set(&self) -> &RangeSet {
        match self {
            Coverage::RectifiedGrid(c) => &c.range_set,
            Coverage::Grid(c) | Coverage::ReferenceableGrid(c) => &c.range_set,
            Coverage::MultiPoint(c) => &c.range_set,
        }
    }

    pub fn temporal(&self) -> Option<&TemporalAxis> {
        match self {
            Coverage::RectifiedGrid(c) => c.temporal.as_ref(),
            Coverage::Grid(c) | Coverage::ReferenceableGrid(c) => c.temporal.as_ref(),
            Coverage::MultiPoint(c) => c.temporal.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn north_up_grid() -> RectifiedGridCoverage {
        RectifiedGridCoverage {
            domain: GridDomain::new(GridLimits::new(vec![0, 0], vec![99, 49])),
            origin: vec![10.0, 50.0],
            offset_vectors: vec![vec![0.5, 0.0], vec![0.0, -0.25]],
            ..RectifiedGridCoverage::default()
        }
    }

    #[test]
    fn test_extent_is_high_minus_low_plus_one() {
        let limits = GridLimits::new(vec![0, 10], vec![99, 19]);
        assert_eq!(limits.extent(0), Some(100));
        assert_eq!(limits.extent(1), Some(10));
        assert_eq!(limits.extent(2), None);
        assert_eq!(limits.extents(), vec![100, 10]);
        assert_eq!(GridLimits::new(vec![5], vec![3]).extent(0), None);
    }

    #[test]
    fn test_grid_to_world_applies_offsets() {
        let grid = north_up_grid();
        assert_eq!(grid.grid_to_world(&[0.0, 0.0]), vec![10.0, 50.0]);
        assert_eq!(grid.grid_to_world(&[4.0, 8.0]), vec![12.0, 48.0]);
    }

    #[test]
    fn test_world_to_grid_inverts_grid_to_world() {
        let grid = north_up_grid();
        let (i, j) = grid.world_to_grid(12.0, 48.0).unwrap();
        assert!((i - 4.0).abs() < 1e-9);
        assert!((j - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_world_to_grid_rejects_singular_offsets() {
        let mut grid = north_up_grid();
        grid.offset_vectors = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        assert_eq!(grid.world_to_grid(0.0, 0.0), None);
        grid.offset_vectors.pop();
        assert_eq!(grid.world_to_grid(0.0, 0.0), None);
    }
}
