//! Features and feature collections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::geometry::{Envelope, Geometry};

/// Feature properties in document order.
///
/// Parsed values are JSON strings (leaf elements), objects (nested
/// elements) or null (`xsi:nil`); callers building features for the
/// generator may use any JSON value.
pub type Properties = IndexMap<String, Value>;

/// An application feature: id, geometry, properties and bounding box.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Option<String>,
    /// `None` for features that carry no geometry property.
    pub geometry: Option<Geometry>,
    pub properties: Properties,
    pub bounded_by: Option<Envelope>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_bounded_by(mut self, envelope: Envelope) -> Self {
        self.bounded_by = Some(envelope);
        self
    }
}

/// Features in document order plus an optional collection bbox.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub bounded_by: Option<Envelope>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            bounded_by: None,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
