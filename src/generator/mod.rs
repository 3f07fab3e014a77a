//! Generator: typed model back to GML text.
//!
//! The generator mirrors the parser's case table, so every value the
//! parser produces can be written back out and parsed again. Output is
//! assembled from indented lines (see [`fragment`]); sub-generators return
//! complete elements which their parent splices one level deeper.
//!
//! Namespace declarations are added to the outermost element only:
//!
//! | object             | declared prefixes          |
//! |--------------------|----------------------------|
//! | geometry           | `gml`                      |
//! | feature            | `gml`, `xsi`               |
//! | feature collection | `wfs`, `gml`, `xsi`        |
//! | coverage           | `gml`, `gmlcov`, `swe`     |

mod coverage;
mod feature;
mod fragment;
mod geometry;

use tracing::debug;

use crate::base::Dialect;
use crate::base::constants::namespace;
use crate::error::Result;
use crate::model::{Coverage, GmlObject};

/// Output formatting options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Newlines and indentation between elements.
    pub pretty: bool,
    /// Spaces per indentation level when `pretty`.
    pub indent_width: usize,
    /// Prefix the output with an XML declaration.
    pub xml_declaration: bool,
    /// Element name used for features.
    pub feature_type: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent_width: 2,
            xml_declaration: false,
            feature_type: "Feature".to_string(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }

    pub fn with_xml_declaration(mut self, xml_declaration: bool) -> Self {
        self.xml_declaration = xml_declaration;
        self
    }

    pub fn with_feature_type(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = feature_type.into();
        self
    }

    /// Indentation string for the given level
    pub fn indent(&self, level: usize) -> String {
        " ".repeat(self.indent_width * level)
    }
}

/// GML writer configured with [`GeneratorOptions`].
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Serialize any model value in the given dialect.
    ///
    /// Coverages are always written with the coverage namespace set,
    /// whatever the dialect.
    pub fn generate(&self, object: &GmlObject, dialect: Dialect) -> Result<String> {
        let gml = dialect.gml_namespace();
        let out = match object {
            GmlObject::Geometry(geometry) => {
                debug!(geometry = geometry.type_name(), %dialect, "generating geometry");
                let mut out = geometry::geometry_fragment(geometry, dialect)?;
                out.declare_namespaces(&[("gml", gml)]);
                out
            }
            GmlObject::Feature(feature) => {
                debug!(%dialect, "generating feature");
                let mut out = feature::feature_fragment(feature, dialect, &self.options)?;
                out.declare_namespaces(&[("gml", gml), ("xsi", namespace::XSI)]);
                out
            }
            GmlObject::FeatureCollection(collection) => {
                debug!(features = collection.len(), %dialect, "generating feature collection");
                let mut out = feature::collection_fragment(collection, dialect, &self.options)?;
                out.declare_namespaces(&[
                    ("wfs", dialect.wfs_namespace()),
                    ("gml", gml),
                    ("xsi", namespace::XSI),
                ]);
                out
            }
            GmlObject::Coverage(coverage) => return self.generate_coverage(coverage),
        };
        Ok(out.render(&self.options))
    }

    /// Serialize a coverage document.
    pub fn generate_coverage(&self, coverage: &Coverage) -> Result<String> {
        debug!(coverage = coverage.type_name(), "generating coverage");
        let mut out = coverage::coverage_fragment(coverage)?;
        out.declare_namespaces(&[
            ("gml", namespace::GML_32),
            ("gmlcov", namespace::GMLCOV),
            ("swe", namespace::SWE),
        ]);
        Ok(out.render(&self.options))
    }
}

/// Serialize a model value with default options.
pub fn generate(object: &GmlObject, dialect: Dialect, pretty: bool) -> Result<String> {
    Generator::new(GeneratorOptions::default().with_pretty(pretty)).generate(object, dialect)
}

/// Serialize a coverage with default options.
pub fn generate_coverage(coverage: &Coverage, pretty: bool) -> Result<String> {
    Generator::new(GeneratorOptions::default().with_pretty(pretty)).generate_coverage(coverage)
}
