//! Version-agnostic model of parsed GML.
//!
//! ## Design
//!
//! Every GML construct the parser understands is decided once, at parse
//! time, into one of these typed values. Builders and the generator only
//! ever see this model, never loosely-typed XML nodes.
//!
//! ```text
//! GmlObject
//! ├── Geometry           (Point, LineString, Polygon, ... MultiPolygon)
//! ├── Feature            id + Geometry + properties + bbox
//! ├── FeatureCollection  ordered Features + bbox
//! └── Coverage           RectifiedGrid / Grid / ReferenceableGrid / MultiPoint
//! ```
//!
//! Values are plain data: constructed once, consumed by one builder or
//! generator call, never mutated through shared references.

mod coverage;
mod feature;
mod geometry;

pub use coverage::{
    Coverage, GridCoverage, GridDomain, GridLimits, MultiPointCoverage, RangeField, RangeSet,
    RectifiedGridCoverage, TemporalAxis,
};
pub use feature::{Feature, FeatureCollection, Properties};
pub use geometry::{
    BoxGeometry, Curve, Envelope, Geometry, GeometryMeta, LineString, LinearRing, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon, Position, Ring, Surface,
};

use serde::{Deserialize, Serialize};

/// Any top-level value a GML document can hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GmlObject {
    Geometry(Geometry),
    Feature(Feature),
    FeatureCollection(FeatureCollection),
    Coverage(Coverage),
}

impl From<Geometry> for GmlObject {
    fn from(geometry: Geometry) -> Self {
        GmlObject::Geometry(geometry)
    }
}

impl From<Feature> for GmlObject {
    fn from(feature: Feature) -> Self {
        GmlObject::Feature(feature)
    }
}

impl From<FeatureCollection> for GmlObject {
    fn from(collection: FeatureCollection) -> Self {
        GmlObject::FeatureCollection(collection)
    }
}

impl From<Coverage> for GmlObject {
    fn from(coverage: Coverage) -> Self {
        GmlObject::Coverage(coverage)
    }
}
