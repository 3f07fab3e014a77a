//! Feature and feature collection fragments.

use serde_json::Value;

use super::GeneratorOptions;
use super::fragment::{Fragment, Tag};
use super::geometry::geometry_fragment;
use crate::base::Dialect;
use crate::base::constants::GEOMETRY_PROPERTY;
use crate::error::Result;
use crate::model::{Envelope, Feature, FeatureCollection, Geometry};

/// `<gml:boundedBy>` around an envelope.
pub(crate) fn bounded_by_fragment(envelope: &Envelope, dialect: Dialect) -> Result<Fragment> {
    let mut out = Fragment::new();
    out.open(0, &Tag::new("gml:boundedBy"));
    out.splice(0, geometry_fragment(&Geometry::Envelope(envelope.clone()), dialect)?);
    out.close(0, "gml:boundedBy");
    Ok(out)
}

/// One feature: boundedBy, properties in order, then the geometry wrapper.
pub(crate) fn feature_fragment(
    feature: &Feature,
    dialect: Dialect,
    options: &GeneratorOptions,
) -> Result<Fragment> {
    let id_attribute = match dialect {
        Dialect::Legacy => "fid",
        Dialect::Current => "gml:id",
    };
    let tag = Tag::checked(&options.feature_type)?.attr_opt(id_attribute, feature.id.as_deref());

    let mut out = Fragment::new();
    out.open(0, &tag);

    if let Some(envelope) = &feature.bounded_by {
        out.splice(0, bounded_by_fragment(envelope, dialect)?);
    }

    for (key, value) in &feature.properties {
        let property = Tag::checked(key)?;
        match value {
            Value::Null => out.empty(1, &property.attr("xsi:nil", "true")),
            Value::String(text) => out.leaf(1, &property, text),
            // Objects and arrays travel as their JSON text.
            other => out.leaf(1, &property, &other.to_string()),
        }
    }

    if let Some(geometry) = &feature.geometry {
        out.open(1, &Tag::new(GEOMETRY_PROPERTY));
        out.splice(1, geometry_fragment(geometry, dialect)?);
        out.close(1, GEOMETRY_PROPERTY);
    }

    out.close(0, tag.name());
    Ok(out)
}

/// A WFS feature collection.
///
/// Legacy output uses `gml:featureMember` wrappers; current output is a WFS
/// 2.0 collection with `wfs:member` wrappers and member counts.
pub(crate) fn collection_fragment(
    collection: &FeatureCollection,
    dialect: Dialect,
    options: &GeneratorOptions,
) -> Result<Fragment> {
    let count = collection.len().to_string();
    let (tag, wrapper) = match dialect {
        Dialect::Legacy => (Tag::new("wfs:FeatureCollection"), "gml:featureMember"),
        Dialect::Current => (
            Tag::new("wfs:FeatureCollection")
                .attr("numberMatched", count.clone())
                .attr("numberReturned", count),
            "wfs:member",
        ),
    };

    let mut out = Fragment::new();
    out.open(0, &tag);
    if let Some(envelope) = &collection.bounded_by {
        out.splice(0, bounded_by_fragment(envelope, dialect)?);
    }
    for feature in &collection.features {
        out.open(1, &Tag::new(wrapper));
        out.splice(1, feature_fragment(feature, dialect, options)?);
        out.close(1, wrapper);
    }
    out.close(0, tag.name());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GmlError;
    use crate::model::Point;

    #[test]
    fn test_feature_layout() {
        let feature = Feature::new(Point::new(vec![1.0, 2.0]))
            .with_id("f1")
            .with_property("name", "A & B")
            .with_property("tags", serde_json::json!({"k": 1}))
            .with_property("missing", Value::Null)
            .with_bounded_by(Envelope::from_bbox([0.0, 0.0, 2.0, 2.0]));
        let out = feature_fragment(&feature, Dialect::Current, &GeneratorOptions::default())
            .unwrap()
            .render(&GeneratorOptions::default().with_pretty(false));

        assert!(out.starts_with(r#"<Feature gml:id="f1"><gml:boundedBy><gml:Envelope>"#));
        assert!(out.contains("<name>A &amp; B</name>"));
        assert!(out.contains("<tags>{&quot;k&quot;:1}</tags>"));
        assert!(out.contains(r#"<missing xsi:nil="true"/>"#));
        assert!(out.ends_with("<geometry><gml:Point><gml:pos>1 2</gml:pos></gml:Point></geometry></Feature>"));
        let bounded = out.find("boundedBy").unwrap();
        assert!(bounded < out.find("<name>").unwrap());
    }

    #[test]
    fn test_property_key_must_be_element_name() {
        for key in ["my key", "1st", "a<b"] {
            let feature = Feature::new(Point::new(vec![1.0, 2.0])).with_property(key, "x");
            let err = feature_fragment(&feature, Dialect::Current, &GeneratorOptions::default()).unwrap_err();
            assert!(matches!(err, GmlError::InvalidElementName(name) if name == key));
        }
    }

    #[test]
    fn test_feature_type_must_be_element_name() {
        let feature = Feature::new(Point::new(vec![1.0, 2.0]));
        let options = GeneratorOptions::default().with_feature_type("road segment");
        assert!(matches!(
            feature_fragment(&feature, Dialect::Current, &options),
            Err(GmlError::InvalidElementName(_))
        ));
    }

    #[test]
    fn test_legacy_feature_uses_fid() {
        let feature = Feature::new(Point::new(vec![1.0, 2.0])).with_id("f1");
        let options = GeneratorOptions::default().with_feature_type("app:Road");
        let out = feature_fragment(&feature, Dialect::Legacy, &options)
            .unwrap()
            .render(&options.clone().with_pretty(false));
        assert!(out.starts_with(r#"<app:Road fid="f1">"#));
    }
}
