//! XML element tree used by the document parser.
//!
//! Documents are read with quick-xml's streaming reader into a small owned
//! tree of [`XmlElement`]s. Namespace prefixes are resolved against the
//! `xmlns` declarations in scope while reading, so later stages can ask
//! "is this a GML element?" without caring which prefix a server chose.

mod element;
mod reader;

pub use element::{XmlAttribute, XmlElement, is_gml_namespace};
pub use reader::{RootName, parse_document, read_root_name};
