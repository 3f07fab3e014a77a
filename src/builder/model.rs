//! Identity builder returning the typed model itself.

use super::Builder;
use crate::error::{GmlError, Result};
use crate::model::{
    BoxGeometry, Coverage, Curve, Envelope, Feature, FeatureCollection, Geometry, GmlObject,
    GridCoverage, LineString, LinearRing, MultiLineString, MultiPoint, MultiPointCoverage,
    MultiPolygon, Point, Polygon, RectifiedGridCoverage, Surface,
};

/// Returns each parsed value as a [`GmlObject`].
///
/// Useful for inspecting parses and for feeding parsed documents back into
/// the generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder;

impl ModelBuilder {
    pub fn new() -> Self {
        Self
    }

    fn geometry(geometry: impl Into<Geometry>) -> Result<GmlObject> {
        Ok(GmlObject::Geometry(geometry.into()))
    }
}

impl Builder for ModelBuilder {
    type Output = GmlObject;

    fn build_point(&self, point: &Point) -> Result<GmlObject> {
        Self::geometry(point.clone())
    }

    fn build_line_string(&self, line_string: &LineString) -> Result<GmlObject> {
        Self::geometry(line_string.clone())
    }

    fn build_polygon(&self, polygon: &Polygon) -> Result<GmlObject> {
        Self::geometry(polygon.clone())
    }

    fn build_linear_ring(&self, ring: &LinearRing) -> Result<GmlObject> {
        Self::geometry(ring.clone())
    }

    fn build_envelope(&self, envelope: &Envelope) -> Result<GmlObject> {
        Self::geometry(envelope.clone())
    }

    fn build_box(&self, bbox: &BoxGeometry) -> Result<GmlObject> {
        Self::geometry(bbox.clone())
    }

    fn build_curve(&self, curve: &Curve) -> Result<GmlObject> {
        Self::geometry(curve.clone())
    }

    fn build_surface(&self, surface: &Surface) -> Result<GmlObject> {
        Self::geometry(surface.clone())
    }

    fn build_multi_point(&self, multi_point: &MultiPoint) -> Result<GmlObject> {
        Self::geometry(multi_point.clone())
    }

    fn build_multi_line_string(&self, multi_line_string: &MultiLineString) -> Result<GmlObject> {
        Self::geometry(multi_line_string.clone())
    }

    fn build_multi_polygon(&self, multi_polygon: &MultiPolygon) -> Result<GmlObject> {
        Self::geometry(multi_polygon.clone())
    }

    fn build_feature(&self, feature: &Feature) -> Result<GmlObject> {
        Ok(GmlObject::Feature(feature.clone()))
    }

    fn build_feature_collection(
        &self,
        features: Vec<GmlObject>,
        bounded_by: Option<&Envelope>,
    ) -> Result<GmlObject> {
        let features = features
            .into_iter()
            .map(|object| match object {
                GmlObject::Feature(feature) => Ok(feature),
                other => Err(GmlError::build(format!(
                    "feature collection member is not a feature: {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GmlObject::FeatureCollection(FeatureCollection {
            features,
            bounded_by: bounded_by.cloned(),
        }))
    }

    fn build_rectified_grid_coverage(&self, coverage: &RectifiedGridCoverage) -> Result<GmlObject> {
        Ok(GmlObject::Coverage(Coverage::RectifiedGrid(coverage.clone())))
    }

    fn build_grid_coverage(&self, coverage: &GridCoverage) -> Result<GmlObject> {
        Ok(GmlObject::Coverage(Coverage::Grid(coverage.clone())))
    }

    fn build_referenceable_grid_coverage(&self, coverage: &GridCoverage) -> Result<GmlObject> {
        Ok(GmlObject::Coverage(Coverage::ReferenceableGrid(
            coverage.clone(),
        )))
    }

    fn build_multi_point_coverage(&self, coverage: &MultiPointCoverage) -> Result<GmlObject> {
        Ok(GmlObject::Coverage(Coverage::MultiPoint(coverage.clone())))
    }
}
