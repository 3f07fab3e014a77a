//! # gml-base
//!
//! Core library for GML 2.1.2 / 3.2 parsing, generation, and streaming WFS
//! feature extraction.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! streaming → Chunk-driven feature extraction with batched delivery
//!   ↓
//! generator → Model → GML text (geometries, features, coverages)
//!   ↓
//! parser    → GML text → Builder output (dialect detection, readers)
//!   ↓
//! builder   → Builder trait, GeoJSON and model builders
//!   ↓
//! exception → OWS ExceptionReport detection and decoding
//!   ↓
//! xml       → quick-xml element tree with namespace resolution
//!   ↓
//! coords    → Coordinate text ⇄ tuples
//!   ↓
//! model     → Geometry / Feature / FeatureCollection / Coverage values
//!   ↓
//! error     → GmlError, Result
//!   ↓
//! base      → Dialect, namespace URIs, element names
//! ```
//!
//! ## Example
//!
//! ```
//! use gml::{Dialect, GeoJsonBuilder, parse};
//!
//! let xml = "<gml:Point><gml:pos>10 20</gml:pos></gml:Point>";
//! let json = parse(xml, Some(Dialect::Current), &GeoJsonBuilder).unwrap();
//! assert_eq!(json["type"], "Point");
//! assert_eq!(json["coordinates"], serde_json::json!([10.0, 20.0]));
//! ```

// ============================================================================
// MODULES (dependency order: base → error → model → ... → streaming)
// ============================================================================

/// Foundation: dialects, namespace URIs, version detection
pub mod base;

/// Crate-wide error type
pub mod error;

/// Version-agnostic typed model
pub mod model;

/// Coordinate Codec
pub mod coords;

/// Namespace-aware XML element tree
pub mod xml;

/// OWS exception report detection
pub mod exception;

/// Builder plugins
pub mod builder;

/// Document Parser
pub mod parser;

/// GML and coverage generator
pub mod generator;

/// Streaming Parser
pub mod streaming;

// Re-export commonly needed items
pub use base::{Dialect, VersionDetector, detect_dialect};
pub use builder::{Builder, GeoJsonBuilder, ModelBuilder};
pub use error::{GmlError, Result};
pub use exception::{
    OwsExceptionEntry, OwsExceptionReport, is_ows_exception_report, parse_exception_report,
};
pub use generator::{Generator, GeneratorOptions, generate, generate_coverage};
pub use model::{Coverage, Feature, FeatureCollection, Geometry, GmlObject};
pub use parser::{GmlParser, parse};
pub use streaming::{StreamOptions, StreamState, StreamingParser};
