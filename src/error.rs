//! Error types for GML parsing, generation and streaming.

use thiserror::Error;

use crate::exception::OwsExceptionReport;

/// Result type alias for GML operations.
pub type Result<T> = std::result::Result<T, GmlError>;

/// Errors that can occur while converting GML.
///
/// Document-level variants are fatal to the call that produced them.
/// `BufferOverflow` and `FeatureParseFailure` are only ever reported through
/// the streaming parser's error handlers and never abort a stream.
#[derive(Debug, Error)]
pub enum GmlError {
    /// The document contains no root element.
    #[error("No GML root element found")]
    NoGmlRootFound,

    /// Root or member element is not a geometry kind the parser knows.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),

    /// Root element is not a coverage kind the parser (or builder) supports.
    #[error("Unsupported coverage type: {0}")]
    UnsupportedCoverageType(String),

    /// Coordinate text is absent or contains a non-numeric scalar.
    #[error("Invalid coordinate text: {0}")]
    InvalidCoordinateText(String),

    /// A required child (ring, coordinates, member content) is missing.
    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),

    /// The document is an OWS exception report rather than GML.
    #[error("{0}")]
    OwsException(OwsExceptionReport),

    /// Streaming buffer grew past its limit without a complete wrapper.
    #[error("Buffer overflow: {size} bytes buffered without a complete feature (limit {limit})")]
    BufferOverflow { size: usize, limit: usize },

    /// One streamed feature wrapper failed to parse.
    #[error("Feature parse failure: {source}")]
    FeatureParseFailure {
        #[source]
        source: Box<GmlError>,
    },

    /// Malformed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// Explicit version string is not a known GML version.
    #[error("Invalid GML version: {0}")]
    InvalidVersion(String),

    /// A property key or feature type cannot be written as an element name.
    #[error("Invalid XML element name: {0:?}")]
    InvalidElementName(String),

    /// A builder plugin rejected its input.
    #[error("Build error: {0}")]
    Build(String),

    /// IO error while reading a stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GmlError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create a missing element error naming the offending construct.
    pub fn missing(construct: impl Into<String>) -> Self {
        Self::MissingRequiredElement(construct.into())
    }

    /// Create an invalid coordinate error.
    pub fn coordinates(message: impl Into<String>) -> Self {
        Self::InvalidCoordinateText(message.into())
    }

    /// Create a builder error.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Wrap a per-feature failure for the streaming error channel.
    pub fn feature_failure(cause: GmlError) -> Self {
        Self::FeatureParseFailure {
            source: Box::new(cause),
        }
    }

    /// The structured exception report, if this error carries one.
    pub fn ows_report(&self) -> Option<&OwsExceptionReport> {
        match self {
            Self::OwsException(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_feature_failure_exposes_cause() {
        let err = GmlError::feature_failure(GmlError::UnsupportedGeometryType(
            "InvalidGeometry".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Feature parse failure: Unsupported geometry type: InvalidGeometry"
        );
        let source = err.source().expect("cause");
        assert_eq!(source.to_string(), "Unsupported geometry type: InvalidGeometry");
    }

    #[test]
    fn test_missing_names_construct() {
        let err = GmlError::missing("Polygon exterior");
        assert_eq!(err.to_string(), "Missing required element: Polygon exterior");
    }
}
