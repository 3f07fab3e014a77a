//! GeoJSON-shaped builder producing `serde_json` values.

use serde_json::{Map, Value, json};

use super::Builder;
use crate::error::Result;
use crate::model::{
    BoxGeometry, Curve, Envelope, Feature, LineString, LinearRing, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon, Surface,
};

/// Builds RFC 7946 GeoJSON objects.
///
/// Envelopes and boxes become rectangular polygons; curves and rings become
/// line strings; a single-patch surface becomes a polygon.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonBuilder;

impl GeoJsonBuilder {
    pub fn new() -> Self {
        Self
    }

    fn geometry(kind: &str, coordinates: Value) -> Value {
        json!({ "type": kind, "coordinates": coordinates })
    }

    fn bbox_polygon(bbox: [f64; 4]) -> Value {
        let [min_x, min_y, max_x, max_y] = bbox;
        Self::geometry(
            "Polygon",
            json!([[
                [min_x, min_y],
                [max_x, min_y],
                [max_x, max_y],
                [min_x, max_y],
                [min_x, min_y]
            ]]),
        )
    }
}

impl Builder for GeoJsonBuilder {
    type Output = Value;

    fn build_point(&self, point: &Point) -> Result<Value> {
        Ok(Self::geometry("Point", json!(point.coordinates)))
    }

    fn build_line_string(&self, line_string: &LineString) -> Result<Value> {
        Ok(Self::geometry("LineString", json!(line_string.coordinates)))
    }

    fn build_polygon(&self, polygon: &Polygon) -> Result<Value> {
        Ok(Self::geometry("Polygon", json!(polygon.rings)))
    }

    fn build_linear_ring(&self, ring: &LinearRing) -> Result<Value> {
        Ok(Self::geometry("LineString", json!(ring.coordinates)))
    }

    fn build_envelope(&self, envelope: &Envelope) -> Result<Value> {
        Ok(Self::bbox_polygon(envelope.bbox()))
    }

    fn build_box(&self, bbox: &BoxGeometry) -> Result<Value> {
        Ok(Self::bbox_polygon(bbox.bbox))
    }

    fn build_curve(&self, curve: &Curve) -> Result<Value> {
        Ok(Self::geometry("LineString", json!(curve.coordinates)))
    }

    fn build_surface(&self, surface: &Surface) -> Result<Value> {
        match surface.patches.as_slice() {
            [single] => Ok(Self::geometry("Polygon", json!(single))),
            patches => Ok(Self::geometry("MultiPolygon", json!(patches))),
        }
    }

    fn build_multi_point(&self, multi_point: &MultiPoint) -> Result<Value> {
        Ok(Self::geometry("MultiPoint", json!(multi_point.points)))
    }

    fn build_multi_line_string(&self, multi_line_string: &MultiLineString) -> Result<Value> {
        Ok(Self::geometry(
            "MultiLineString",
            json!(multi_line_string.line_strings),
        ))
    }

    fn build_multi_polygon(&self, multi_polygon: &MultiPolygon) -> Result<Value> {
        Ok(Self::geometry("MultiPolygon", json!(multi_polygon.polygons)))
    }

    fn build_feature(&self, feature: &Feature) -> Result<Value> {
        let geometry = match &feature.geometry {
            Some(geometry) => self.build_geometry(geometry)?,
            None => Value::Null,
        };
        let properties: Map<String, Value> = feature
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut object = Map::new();
        object.insert("type".to_string(), json!("Feature"));
        if let Some(id) = &feature.id {
            object.insert("id".to_string(), json!(id));
        }
        if let Some(envelope) = &feature.bounded_by {
            object.insert("bbox".to_string(), json!(envelope.bbox()));
        }
        object.insert("geometry".to_string(), geometry);
        object.insert("properties".to_string(), Value::Object(properties));
        Ok(Value::Object(object))
    }

    fn build_feature_collection(
        &self,
        features: Vec<Value>,
        bounded_by: Option<&Envelope>,
    ) -> Result<Value> {
        let mut object = Map::new();
        object.insert("type".to_string(), json!("FeatureCollection"));
        if let Some(envelope) = bounded_by {
            object.insert("bbox".to_string(), json!(envelope.bbox()));
        }
        object.insert("features".to_string(), Value::Array(features));
        Ok(Value::Object(object))
    }
}
