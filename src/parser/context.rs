//! Inherited parse state: dialect, srsName and srsDimension.

use crate::base::Dialect;
use crate::error::{GmlError, Result};
use crate::model::{GeometryMeta, Position};
use crate::xml::XmlElement;

/// Attributes inherited from enclosing geometries.
///
/// A child element may override both `srsName` and `srsDimension`; rings
/// and aggregate members each get their own context.
#[derive(Clone, Debug)]
pub(crate) struct Context {
    pub dialect: Dialect,
    pub srs_name: Option<String>,
    pub dimension: Option<usize>,
}

impl Context {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            srs_name: None,
            dimension: None,
        }
    }

    /// Context for a child element, applying its own attributes.
    pub fn enter(&self, element: &XmlElement) -> Context {
        let dimension = element
            .attr("srsDimension")
            .or_else(|| element.attr("dimension"))
            .and_then(|d| d.trim().parse::<usize>().ok())
            .filter(|d| *d > 0)
            .or(self.dimension);
        Context {
            dialect: self.dialect,
            srs_name: element
                .attr("srsName")
                .map(str::to_string)
                .or_else(|| self.srs_name.clone()),
            dimension,
        }
    }

    /// Metadata for a single geometry. Every tuple must have the same
    /// length, which becomes the dimension.
    pub fn meta<'a>(
        &self,
        positions: impl IntoIterator<Item = &'a Position>,
        construct: &str,
    ) -> Result<GeometryMeta> {
        let length = uniform_length(positions, construct)?;
        Ok(self.meta_with(length))
    }

    /// Metadata for an aggregate. Members are checked on their own and may
    /// differ, so the first tuple decides the dimension.
    pub fn aggregate_meta<'a>(&self, mut positions: impl Iterator<Item = &'a Position>) -> GeometryMeta {
        self.meta_with(positions.next().map(Vec::len))
    }

    /// Check one coordinate sequence: a single tuple length, equal to the
    /// declared dimension when there is one.
    pub fn check_tuples(&self, positions: &[Position], construct: &str) -> Result<()> {
        let length = uniform_length(positions, construct)?;
        match (length, self.dimension) {
            (Some(length), Some(declared)) if length != declared => Err(GmlError::coordinates(
                format!("{construct} tuples have {length} values, srsDimension is {declared}"),
            )),
            _ => Ok(()),
        }
    }

    fn meta_with(&self, length: Option<usize>) -> GeometryMeta {
        GeometryMeta {
            srs_name: self.srs_name.clone(),
            dimension: length.filter(|d| *d > 0).or(self.dimension).unwrap_or(2),
            dialect: self.dialect,
        }
    }
}

/// The shared tuple length, or `None` when there are no tuples.
fn uniform_length<'a>(
    positions: impl IntoIterator<Item = &'a Position>,
    construct: &str,
) -> Result<Option<usize>> {
    let mut positions = positions.into_iter();
    let Some(first) = positions.next().map(Vec::len) else {
        return Ok(None);
    };
    match positions.map(Vec::len).find(|len| *len != first) {
        Some(other) => Err(GmlError::coordinates(format!(
            "{construct} mixes tuples of {first} and {other} values"
        ))),
        None => Ok(Some(first)),
    }
}
