//! Foundation types for the GML toolchain.
//!
//! This module provides the pieces every other module builds on:
//! - [`Dialect`] - legacy (GML 2.1.2) vs current (GML 3.2) vocabulary
//! - [`detect_dialect`] - default version detector for parsed documents
//! - Namespace URIs and element names shared by parser and generator
//!
//! This module has NO dependencies on other gml modules except `error`
//! and the element tree in `xml`.

pub mod constants;
mod dialect;

pub use dialect::{Dialect, VersionDetector, detect_dialect};
