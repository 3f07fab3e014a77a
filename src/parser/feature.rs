//! Feature and feature collection readers.

use serde_json::{Map, Value};
use tracing::trace;

use super::context::Context;
use super::geometry::read_geometry;
use crate::base::constants::{
    FEATURE_MEMBER, FEATURE_MEMBERS, GEOMETRY_PROPERTY, MEMBER, is_geometry_element, namespace,
};
use crate::error::{GmlError, Result};
use crate::model::{Envelope, Feature, FeatureCollection, Geometry, Properties};
use crate::xml::{XmlElement, is_gml_namespace};

/// Read a `FeatureCollection` (WFS or GML) into its ordered features.
pub(crate) fn read_feature_collection(
    element: &XmlElement,
    ctx: &Context,
) -> Result<FeatureCollection> {
    let mut collection = FeatureCollection::new(Vec::new());
    collection.bounded_by = element
        .child("boundedBy")
        .map(|b| read_bounded_by(b, ctx))
        .transpose()?
        .flatten();
    collection.features = read_members(element, ctx)?;
    Ok(collection)
}

/// Features of every member wrapper in document order.
///
/// A WFS 2.0 `member` may hold a nested `FeatureCollection` (additional
/// objects of a join); its features are inlined in place.
pub(crate) fn read_members(collection: &XmlElement, ctx: &Context) -> Result<Vec<Feature>> {
    let mut features = Vec::new();
    for wrapper in &collection.children {
        match wrapper.local_name.as_str() {
            FEATURE_MEMBER | MEMBER => {
                let content = wrapper
                    .first_child()
                    .ok_or_else(|| GmlError::missing(format!("{} content", wrapper.local_name)))?;
                if content.local_name == "FeatureCollection" {
                    features.extend(read_feature_collection(content, ctx)?.features);
                } else {
                    features.push(read_member_content(content, ctx)?);
                }
            }
            FEATURE_MEMBERS => {
                for content in &wrapper.children {
                    features.push(read_member_content(content, ctx)?);
                }
            }
            _ => {}
        }
    }
    trace!(count = features.len(), "read feature members");
    Ok(features)
}

/// A member's content: an application feature, or a bare GML geometry.
fn read_member_content(content: &XmlElement, ctx: &Context) -> Result<Feature> {
    if content.is_gml() {
        let geometry = read_geometry(content, ctx)?;
        return Ok(Feature {
            geometry: Some(geometry),
            ..Feature::default()
        });
    }
    read_feature(content, ctx)
}

/// Read one application feature element.
pub(crate) fn read_feature(element: &XmlElement, ctx: &Context) -> Result<Feature> {
    let id = element
        .gml_id()
        .or_else(|| element.attr("fid"))
        .map(str::to_string);

    let geometry_wrapper = element
        .child(GEOMETRY_PROPERTY)
        .filter(|g| !g.is_gml())
        .or_else(|| element.children.iter().find(|c| wraps_geometry(c)));

    let geometry = geometry_wrapper
        .map(|wrapper| {
            let content = wrapper
                .first_child()
                .ok_or_else(|| GmlError::missing(format!("{} geometry", wrapper.local_name)))?;
            read_geometry(content, ctx)
        })
        .transpose()?;

    let mut bounded_by = None;
    let mut properties = Properties::new();

    for attribute in &element.attributes {
        let skip = attribute.local_name == "fid"
            || attribute.prefix() == Some("gml")
            || attribute.prefix() == Some("xsi")
            || attribute
                .namespace
                .as_deref()
                .is_some_and(|ns| ns == namespace::XSI || is_gml_namespace(ns));
        if !skip {
            properties.insert(attribute.local_name.clone(), Value::String(attribute.value.clone()));
        }
    }

    for child in &element.children {
        if geometry_wrapper.is_some_and(|g| std::ptr::eq(g, child)) {
            continue;
        }
        if child.is_gml() {
            if child.local_name == "boundedBy" {
                bounded_by = read_bounded_by(child, ctx)?;
            }
            continue;
        }
        insert_property(&mut properties, &child.local_name, property_value(child));
    }

    Ok(Feature {
        id,
        geometry,
        properties,
        bounded_by,
    })
}

/// A non-GML child whose first child is a GML geometry element.
fn wraps_geometry(child: &XmlElement) -> bool {
    !child.is_gml()
        && child
            .first_child()
            .is_some_and(|g| g.is_gml() && is_geometry_element(&g.local_name))
}

/// JSON value of a property element.
fn property_value(element: &XmlElement) -> Value {
    if element
        .attributes
        .iter()
        .any(|a| a.local_name == "nil" && a.value.trim() == "true")
    {
        return Value::Null;
    }
    if element.children.is_empty() {
        return Value::String(element.text.trim().to_string());
    }
    let mut object = Properties::new();
    for child in &element.children {
        insert_property(&mut object, &child.local_name, property_value(child));
    }
    Value::Object(object.into_iter().collect::<Map<String, Value>>())
}

/// Insert a property; repeated keys collect into an array.
fn insert_property(properties: &mut Properties, key: &str, value: Value) {
    match properties.get_mut(key) {
        None => {
            properties.insert(key.to_string(), value);
        }
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

/// Read a `boundedBy`: `Envelope`, `Box`, or `Null` (no bounds).
pub(crate) fn read_bounded_by(element: &XmlElement, ctx: &Context) -> Result<Option<Envelope>> {
    let Some(content) = element.first_child() else {
        return Ok(None);
    };
    match content.local_name.as_str() {
        "Null" => Ok(None),
        "Envelope" | "Box" => match read_geometry(content, ctx)? {
            Geometry::Envelope(envelope) => Ok(Some(envelope)),
            Geometry::Box(bbox) => Ok(Some(bbox.to_envelope())),
            other => Err(GmlError::UnsupportedGeometryType(other.type_name().to_string())),
        },
        other => Err(GmlError::UnsupportedGeometryType(format!("{other} in boundedBy"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Dialect;
    use crate::xml::parse_document;

    fn feature(xml: &str) -> Feature {
        let root = parse_document(xml).unwrap().unwrap();
        read_feature(&root, &Context::new(Dialect::Current)).unwrap()
    }

    #[test]
    fn test_feature_properties_and_geometry() {
        let f = feature(
            r#"<app:Road xmlns:app="urn:app" xmlns:gml="http://www.opengis.net/gml/3.2" gml:id="r1" lanes="2">
                <app:name>Main</app:name>
                <app:geometry><gml:Point><gml:pos>1 2</gml:pos></gml:Point></app:geometry>
            </app:Road>"#,
        );
        assert_eq!(f.id.as_deref(), Some("r1"));
        assert_eq!(f.properties["lanes"], Value::String("2".into()));
        assert_eq!(f.properties["name"], Value::String("Main".into()));
        assert!(!f.properties.contains_key("geometry"));
        assert!(matches!(f.geometry, Some(Geometry::Point(_))));
    }

    #[test]
    fn test_geometry_wrapper_fallback() {
        let f = feature(
            r#"<app:Parcel fid="p7"><app:shape><gml:Point><gml:coordinates>3,4</gml:coordinates></gml:Point></app:shape></app:Parcel>"#,
        );
        assert_eq!(f.id.as_deref(), Some("p7"));
        assert!(f.properties.is_empty());
        let Some(Geometry::Point(point)) = f.geometry else {
            panic!("expected point geometry");
        };
        assert_eq!(point.coordinates, vec![3.0, 4.0]);
    }

    #[test]
    fn test_nested_nil_and_repeated_properties() {
        let f = feature(
            r#"<app:Site xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                <app:address><app:city>Bonn</app:city><app:zip>53111</app:zip></app:address>
                <app:owner xsi:nil="true"/>
                <app:tag>a</app:tag><app:tag>b</app:tag>
            </app:Site>"#,
        );
        assert_eq!(f.properties["address"]["city"], Value::String("Bonn".into()));
        assert_eq!(f.properties["owner"], Value::Null);
        assert_eq!(f.properties["tag"], serde_json::json!(["a", "b"]));
        assert!(f.geometry.is_none());
    }

    #[test]
    fn test_bounded_by_box_and_null() {
        let ctx = Context::new(Dialect::Legacy);
        let boxed = parse_document(
            "<gml:boundedBy><gml:Box><gml:coordinates>0,0 2,3</gml:coordinates></gml:Box></gml:boundedBy>",
        )
        .unwrap()
        .unwrap();
        let envelope = read_bounded_by(&boxed, &ctx).unwrap().unwrap();
        assert_eq!(envelope.bbox(), [0.0, 0.0, 2.0, 3.0]);

        let null = parse_document("<gml:boundedBy><gml:Null>unknown</gml:Null></gml:boundedBy>")
            .unwrap()
            .unwrap();
        assert_eq!(read_bounded_by(&null, &ctx).unwrap(), None);
    }
}
