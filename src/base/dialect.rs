//! GML dialect (version) handling and detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::constants::namespace;
use crate::error::GmlError;
use crate::xml::XmlElement;

/// Tag vocabulary and tuple-separator convention of a GML document.
///
/// Parsed coordinates are dialect independent; the dialect only decides
/// which element names and separators the generator emits, and is carried
/// on every parsed geometry for reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// GML 2.1.2: `coordinates`, `outerBoundaryIs`/`innerBoundaryIs`,
    /// comma-separated tuple components.
    Legacy,
    /// GML 3.2: `pos`/`posList`, `exterior`/`interior`, flat
    /// space-separated numeric stream.
    #[default]
    Current,
}

impl Dialect {
    /// Version string of this dialect.
    pub fn version(self) -> &'static str {
        match self {
            Dialect::Legacy => "2.1.2",
            Dialect::Current => "3.2",
        }
    }

    /// GML namespace URI emitted for this dialect.
    pub fn gml_namespace(self) -> &'static str {
        match self {
            Dialect::Legacy => namespace::GML_LEGACY,
            Dialect::Current => namespace::GML_32,
        }
    }

    /// WFS namespace URI paired with this dialect in feature collections.
    pub fn wfs_namespace(self) -> &'static str {
        match self {
            Dialect::Legacy => namespace::WFS_LEGACY,
            Dialect::Current => namespace::WFS_20,
        }
    }

    /// Map a GML or WFS namespace URI to its dialect.
    pub fn from_namespace(uri: &str) -> Option<Self> {
        match uri.trim_end_matches('/') {
            namespace::GML_32 | namespace::WFS_20 => Some(Dialect::Current),
            namespace::GML_LEGACY | namespace::WFS_LEGACY => Some(Dialect::Legacy),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

impl FromStr for Dialect {
    type Err = GmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2" | "2.1" | "2.1.2" => Ok(Dialect::Legacy),
            "3" | "3.2" | "3.2.1" => Ok(Dialect::Current),
            other => Err(GmlError::InvalidVersion(other.to_string())),
        }
    }
}

/// Signature of an injectable version detector.
///
/// Given a parsed document root, returns the dialect if it can tell.
pub type VersionDetector = fn(&XmlElement) -> Option<Dialect>;

/// Default version detector.
///
/// Looks at the root's namespace, then the namespaces declared on the root,
/// then the first GML-namespaced descendant. Documents without any bound
/// GML namespace (bare fragments) are classified by their vocabulary.
pub fn detect_dialect(root: &XmlElement) -> Option<Dialect> {
    if let Some(dialect) = root.namespace.as_deref().and_then(Dialect::from_namespace) {
        debug!(%dialect, "dialect detected from root namespace");
        return Some(dialect);
    }

    // Prefer a GML binding over a WFS one when both are declared.
    let declared: Vec<Dialect> = root
        .namespace_declarations
        .iter()
        .filter(|(_, uri)| uri.contains("/gml"))
        .filter_map(|(_, uri)| Dialect::from_namespace(uri))
        .collect();
    if let Some(&dialect) = declared.first() {
        debug!(%dialect, "dialect detected from namespace declaration");
        return Some(dialect);
    }

    if let Some(dialect) = root
        .find_descendant(&|el| el.namespace.is_some() && el.is_gml())
        .and_then(|el| el.namespace.as_deref())
        .and_then(Dialect::from_namespace)
    {
        debug!(%dialect, "dialect detected from descendant namespace");
        return Some(dialect);
    }

    sniff_vocabulary(root)
}

fn sniff_vocabulary(root: &XmlElement) -> Option<Dialect> {
    const LEGACY: &[&str] = &["coordinates", "coord", "outerBoundaryIs", "innerBoundaryIs"];
    const CURRENT: &[&str] = &["pos", "posList", "exterior", "interior", "lowerCorner"];

    if root
        .find_descendant(&|el| LEGACY.contains(&el.local_name.as_str()))
        .is_some()
    {
        return Some(Dialect::Legacy);
    }
    if root
        .find_descendant(&|el| CURRENT.contains(&el.local_name.as_str()))
        .is_some()
    {
        return Some(Dialect::Current);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn root(xml: &str) -> XmlElement {
        parse_document(xml).unwrap().unwrap()
    }

    #[test]
    fn test_version_strings() {
        assert_eq!("2.1.2".parse::<Dialect>().unwrap(), Dialect::Legacy);
        assert_eq!("3.2".parse::<Dialect>().unwrap(), Dialect::Current);
        assert_eq!(" 3 ".parse::<Dialect>().unwrap(), Dialect::Current);
        assert!(matches!(
            "4.0".parse::<Dialect>(),
            Err(GmlError::InvalidVersion(v)) if v == "4.0"
        ));
        assert_eq!(Dialect::Legacy.to_string(), "2.1.2");
    }

    #[test]
    fn test_detect_from_root_namespace() {
        let doc = root(r#"<gml:Point xmlns:gml="http://www.opengis.net/gml/3.2"><gml:pos>1 2</gml:pos></gml:Point>"#);
        assert_eq!(detect_dialect(&doc), Some(Dialect::Current));

        let doc = root(r#"<gml:Point xmlns:gml="http://www.opengis.net/gml"><gml:coordinates>1,2</gml:coordinates></gml:Point>"#);
        assert_eq!(detect_dialect(&doc), Some(Dialect::Legacy));
    }

    #[test]
    fn test_detect_from_declaration_on_non_gml_root() {
        let doc = root(
            r#"<FeatureCollection xmlns:gml="http://www.opengis.net/gml"><gml:featureMember/></FeatureCollection>"#,
        );
        assert_eq!(detect_dialect(&doc), Some(Dialect::Legacy));
    }

    #[test]
    fn test_detect_by_vocabulary_without_namespaces() {
        let legacy = root("<gml:Point><gml:coordinates>10,20</gml:coordinates></gml:Point>");
        assert_eq!(detect_dialect(&legacy), Some(Dialect::Legacy));

        let current = root("<gml:Point><gml:pos>10 20</gml:pos></gml:Point>");
        assert_eq!(detect_dialect(&current), Some(Dialect::Current));

        let unknown = root("<gml:Point/>");
        assert_eq!(detect_dialect(&unknown), None);
    }
}
