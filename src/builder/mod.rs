//! Builder plugins: per-format transformers fed by the document parser.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   typed model values   ┌─────────────────────────┐
//! │ GmlParser    │ ─────────────────────▶ │ Builder (one method per │
//! │ (dispatch)   │ ◀───────────────────── │ model variant)          │
//! └──────────────┘     Builder::Output    └─────────────────────────┘
//! ```
//!
//! The parser never inspects a builder's output. It only hands the outputs
//! of `build_feature` to `build_feature_collection`, or returns them to the
//! caller. Coverage methods are optional; builders that cannot represent
//! coverages keep the defaults, which fail with
//! [`GmlError::UnsupportedCoverageType`].

mod geojson;
mod model;

pub use geojson::GeoJsonBuilder;
pub use model::ModelBuilder;

use crate::error::{GmlError, Result};
use crate::model::{
    BoxGeometry, Coverage, Curve, Envelope, Feature, Geometry, GridCoverage, LineString,
    LinearRing, MultiLineString, MultiPoint, MultiPointCoverage, MultiPolygon, Point, Polygon,
    RectifiedGridCoverage, Surface,
};

/// Per-format transformer from the parsed model to a target representation.
pub trait Builder {
    /// Output value of every build method.
    type Output;

    fn build_point(&self, point: &Point) -> Result<Self::Output>;
    fn build_line_string(&self, line_string: &LineString) -> Result<Self::Output>;
    fn build_polygon(&self, polygon: &Polygon) -> Result<Self::Output>;
    fn build_linear_ring(&self, ring: &LinearRing) -> Result<Self::Output>;
    fn build_envelope(&self, envelope: &Envelope) -> Result<Self::Output>;
    fn build_box(&self, bbox: &BoxGeometry) -> Result<Self::Output>;
    fn build_curve(&self, curve: &Curve) -> Result<Self::Output>;
    fn build_surface(&self, surface: &Surface) -> Result<Self::Output>;
    fn build_multi_point(&self, multi_point: &MultiPoint) -> Result<Self::Output>;
    fn build_multi_line_string(&self, multi_line_string: &MultiLineString)
    -> Result<Self::Output>;
    fn build_multi_polygon(&self, multi_polygon: &MultiPolygon) -> Result<Self::Output>;

    /// Build one feature. Implementations typically call
    /// [`Builder::build_geometry`] on `feature.geometry`.
    fn build_feature(&self, feature: &Feature) -> Result<Self::Output>;

    /// Combine the outputs of `build_feature`, in document order.
    fn build_feature_collection(
        &self,
        features: Vec<Self::Output>,
        bounded_by: Option<&Envelope>,
    ) -> Result<Self::Output>;

    fn build_rectified_grid_coverage(
        &self,
        _coverage: &RectifiedGridCoverage,
    ) -> Result<Self::Output> {
        Err(GmlError::UnsupportedCoverageType(
            "RectifiedGridCoverage".to_string(),
        ))
    }

    fn build_grid_coverage(&self, _coverage: &GridCoverage) -> Result<Self::Output> {
        Err(GmlError::UnsupportedCoverageType("GridCoverage".to_string()))
    }

    fn build_referenceable_grid_coverage(&self, _coverage: &GridCoverage) -> Result<Self::Output> {
        Err(GmlError::UnsupportedCoverageType(
            "ReferenceableGridCoverage".to_string(),
        ))
    }

    fn build_multi_point_coverage(&self, _coverage: &MultiPointCoverage) -> Result<Self::Output> {
        Err(GmlError::UnsupportedCoverageType(
            "MultiPointCoverage".to_string(),
        ))
    }

    /// Dispatch a geometry to its build method.
    fn build_geometry(&self, geometry: &Geometry) -> Result<Self::Output> {
        match geometry {
            Geometry::Point(g) => self.build_point(g),
            Geometry::LineString(g) => self.build_line_string(g),
            Geometry::LinearRing(g) => self.build_linear_ring(g),
            Geometry::Polygon(g) => self.build_polygon(g),
            Geometry::Envelope(g) => self.build_envelope(g),
            Geometry::Box(g) => self.build_box(g),
            Geometry::Curve(g) => self.build_curve(g),
            Geometry::Surface(g) => self.build_surface(g),
            Geometry::MultiPoint(g) => self.build_multi_point(g),
            Geometry::MultiLineString(g) => self.build_multi_line_string(g),
            Geometry::MultiPolygon(g) => self.build_multi_polygon(g),
        }
    }

    /// Dispatch a coverage to its build method.
    fn build_coverage(&self, coverage: &Coverage) -> Result<Self::Output> {
        match coverage {
            Coverage::RectifiedGrid(c) => self.build_rectified_grid_coverage(c),
            Coverage::Grid(c) => self.build_grid_coverage(c),
            Coverage::ReferenceableGrid(c) => self.build_referenceable_grid_coverage(c),
            Coverage::MultiPoint(c) => self.build_multi_point_coverage(c),
        }
    }
}
