//! Namespace URIs and element names shared across the crate.

/// Namespace URIs recognised by the parser and emitted by the generator.
pub mod namespace {
    /// GML 2.1.2 (and GML 3.1, which reuses the same URI).
    pub const GML_LEGACY: &str = "http://www.opengis.net/gml";
    /// GML 3.2.
    pub const GML_32: &str = "http://www.opengis.net/gml/3.2";
    /// WFS 1.0 / 1.1.
    pub const WFS_LEGACY: &str = "http://www.opengis.net/wfs";
    /// WFS 2.0.
    pub const WFS_20: &str = "http://www.opengis.net/wfs/2.0";
    /// OWS 1.1 common.
    pub const OWS: &str = "http://www.opengis.net/ows/1.1";
    /// GML coverage application schema.
    pub const GMLCOV: &str = "http://www.opengis.net/gmlcov/1.0";
    /// SWE common data model.
    pub const SWE: &str = "http://www.opengis.net/swe/2.0";
    /// XML Schema instance (for `xsi:nil`).
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
}

/// Prefix of SWE quantity `definition` URIs that carry a band data type.
pub const DATA_TYPE_DEFINITION: &str = "http://www.opengis.net/def/dataType/OGC/0/";

/// Feature member wrapper used by GML 2 / WFS 1.x collections.
pub const FEATURE_MEMBER: &str = "featureMember";
/// Plural feature member wrapper used by GML 3.1 collections.
pub const FEATURE_MEMBERS: &str = "featureMembers";
/// Feature member wrapper used by WFS 2.0 collections.
pub const MEMBER: &str = "member";
/// Property wrapper holding a feature's geometry.
pub const GEOMETRY_PROPERTY: &str = "geometry";

/// Root element names that hold a single geometry.
pub const GEOMETRY_ELEMENTS: &[&str] = &[
    "Point",
    "LineString",
    "LinearRing",
    "Polygon",
    "Envelope",
    "Box",
    "Curve",
    "Surface",
    "MultiPoint",
    "MultiLineString",
    "MultiCurve",
    "MultiPolygon",
    "MultiSurface",
];

/// Root element names that hold a coverage.
pub const COVERAGE_ELEMENTS: &[&str] = &[
    "RectifiedGridCoverage",
    "GridCoverage",
    "ReferenceableGridCoverage",
    "MultiPointCoverage",
];

/// Returns true if `local_name` names a geometry element the parser accepts.
pub fn is_geometry_element(local_name: &str) -> bool {
    GEOMETRY_ELEMENTS.contains(&local_name)
}
