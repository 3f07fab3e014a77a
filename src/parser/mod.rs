//! Document Parser: XML text to builder output.
//!
//! ## Pipeline
//!
//! ```text
//! xml text ─▶ element tree ─▶ ExceptionReport? ──yes──▶ Err(OwsException)
//!                                   │ no
//!                                   ▼
//!                           dialect (explicit, else detector)
//!                                   │
//!                                   ▼
//!              root local name ─▶ FeatureCollection │ geometry │ *Coverage
//!                                   │
//!                                   ▼
//!                         typed model ─▶ Builder ─▶ B::Output
//! ```
//!
//! Readers never look at the dialect to pick a coordinate encoding: each
//! element is read with whichever encoding it actually carries. The dialect
//! is recorded on the produced geometries.

mod context;
mod coverage;
mod feature;
mod geometry;

use tracing::debug;

use crate::base::constants::{COVERAGE_ELEMENTS, is_geometry_element};
use crate::base::{Dialect, VersionDetector, detect_dialect};
use crate::builder::Builder;
use crate::error::{GmlError, Result};
use crate::exception::{decode_exception_report, is_report_root};
use crate::xml::{XmlElement, parse_document};

use context::Context;

/// Parser entry point with a configurable version detector.
#[derive(Clone, Copy, Debug)]
pub struct GmlParser {
    detector: VersionDetector,
}

impl Default for GmlParser {
    fn default() -> Self {
        Self {
            detector: detect_dialect,
        }
    }
}

impl GmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dialect detector used when no explicit version is given.
    pub fn with_version_detector(mut self, detector: VersionDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Parse a document and hand its content to `builder`.
    ///
    /// `version` forces a dialect; `None` detects it from the document.
    pub fn parse<B: Builder>(
        &self,
        xml: &str,
        version: Option<Dialect>,
        builder: &B,
    ) -> Result<B::Output> {
        let root = self.read_root(xml)?;
        let ctx = Context::new(self.dialect_of(&root, version));
        parse_element(&root, &ctx, builder)
    }

    /// Parse a feature collection document into one builder output per
    /// feature, without calling `build_feature_collection`.
    pub fn parse_feature_members<B: Builder>(
        &self,
        xml: &str,
        version: Option<Dialect>,
        builder: &B,
    ) -> Result<Vec<B::Output>> {
        let root = self.read_root(xml)?;
        let ctx = Context::new(self.dialect_of(&root, version));
        feature::read_members(&root, &ctx)?
            .iter()
            .map(|f| builder.build_feature(f))
            .collect()
    }

    fn read_root(&self, xml: &str) -> Result<XmlElement> {
        let root = parse_document(xml)?.ok_or(GmlError::NoGmlRootFound)?;
        if is_report_root(&root) {
            let report = decode_exception_report(&root);
            debug!(exceptions = report.exceptions.len(), "document is an exception report");
            return Err(GmlError::OwsException(report));
        }
        Ok(root)
    }

    fn dialect_of(&self, root: &XmlElement, version: Option<Dialect>) -> Dialect {
        let dialect = version
            .or_else(|| (self.detector)(root))
            .unwrap_or_default();
        debug!(%dialect, root = %root.local_name, explicit = version.is_some(), "parsing document");
        dialect
    }
}

/// Parse with the default detector.
pub fn parse<B: Builder>(xml: &str, version: Option<Dialect>, builder: &B) -> Result<B::Output> {
    GmlParser::default().parse(xml, version, builder)
}

/// Dispatch on the root element's local name.
///
/// Non-GML roots other than a collection are application features.
fn parse_element<B: Builder>(root: &XmlElement, ctx: &Context, builder: &B) -> Result<B::Output> {
    let name = root.local_name.as_str();

    if name == "FeatureCollection" {
        let collection = feature::read_feature_collection(root, ctx)?;
        debug!(features = collection.len(), "building feature collection");
        let outputs = collection
            .features
            .iter()
            .map(|f| builder.build_feature(f))
            .collect::<Result<Vec<_>>>()?;
        return builder.build_feature_collection(outputs, collection.bounded_by.as_ref());
    }

    if is_geometry_element(name) {
        let geometry = geometry::read_geometry(root, ctx)?;
        return builder.build_geometry(&geometry);
    }

    if COVERAGE_ELEMENTS.contains(&name) || name.ends_with("Coverage") {
        let coverage = coverage::read_coverage(root, ctx)?;
        return builder.build_coverage(&coverage);
    }

    if !root.is_gml() {
        let feature = feature::read_feature(root, ctx)?;
        return builder.build_feature(&feature);
    }

    Err(GmlError::UnsupportedGeometryType(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;
    use crate::exception::OwsExceptionReport;
    use crate::model::{Geometry, GmlObject};

    #[test]
    fn test_empty_document_has_no_root() {
        let err = parse("   ", None, &ModelBuilder).unwrap_err();
        assert!(matches!(err, GmlError::NoGmlRootFound));
    }

    #[test]
    fn test_explicit_version_overrides_detection() {
        let xml = r#"<gml:Point xmlns:gml="http://www.opengis.net/gml/3.2"><gml:pos>1 2</gml:pos></gml:Point>"#;
        let GmlObject::Geometry(geometry) = parse(xml, Some(Dialect::Legacy), &ModelBuilder).unwrap() else {
            panic!("expected geometry");
        };
        assert_eq!(geometry.meta().dialect, Dialect::Legacy);
    }

    #[test]
    fn test_custom_detector() {
        fn always_legacy(_: &XmlElement) -> Option<Dialect> {
            Some(Dialect::Legacy)
        }
        let parser = GmlParser::new().with_version_detector(always_legacy);
        let xml = "<gml:Point><gml:pos>1 2</gml:pos></gml:Point>";
        let GmlObject::Geometry(Geometry::Point(point)) = parser.parse(xml, None, &ModelBuilder).unwrap() else {
            panic!("expected point");
        };
        assert_eq!(point.meta.dialect, Dialect::Legacy);
        assert_eq!(point.coordinates, vec![1.0, 2.0]);
    }

    #[test]
    fn test_exception_report_short_circuits() {
        let xml = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
            <ows:Exception exceptionCode="InvalidParameterValue"><ows:ExceptionText>bad</ows:ExceptionText></ows:Exception>
        </ows:ExceptionReport>"#;
        let err = parse(xml, None, &ModelBuilder).unwrap_err();
        let report: &OwsExceptionReport = err.ows_report().unwrap();
        assert_eq!(report.exceptions[0].code, "InvalidParameterValue");
    }

    #[test]
    fn test_unknown_gml_root_is_unsupported() {
        let err = parse("<gml:Solid/>", None, &ModelBuilder).unwrap_err();
        assert!(matches!(err, GmlError::UnsupportedGeometryType(name) if name == "Solid"));
    }
}
