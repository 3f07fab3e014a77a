//! Geometry fragments in either dialect's vocabulary.

use super::fragment::{Fragment, Tag};
use crate::base::Dialect;
use crate::coords::{format_coordinates, format_position};
use crate::error::{GmlError, Result};
use crate::model::{Geometry, GeometryMeta, Position, Ring};

/// Element names that differ between the dialects.
struct Vocabulary {
    exterior: &'static str,
    interior: &'static str,
}

impl Vocabulary {
    fn of(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Legacy => Self {
                exterior: "gml:outerBoundaryIs",
                interior: "gml:innerBoundaryIs",
            },
            Dialect::Current => Self {
                exterior: "gml:exterior",
                interior: "gml:interior",
            },
        }
    }
}

/// Serialize one geometry as a complete element.
///
/// Nested `Point`, `LineString`, `Polygon`, `PolygonPatch` and `LinearRing`
/// elements declare their own `srsDimension` in the current dialect when
/// their tuples differ from the enclosing dimension.
pub(crate) fn geometry_fragment(geometry: &Geometry, dialect: Dialect) -> Result<Fragment> {
    let mut out = Fragment::new();
    let tag = root_tag(geometry, dialect);
    let dimension = geometry.meta().dimension;

    match geometry {
        Geometry::Point(point) => {
            out.open(0, &tag);
            position_lines(&mut out, 1, std::slice::from_ref(&point.coordinates), dialect, "Point")?;
            out.close(0, tag.name());
        }
        Geometry::LineString(g) => {
            out.open(0, &tag);
            coordinate_lines(&mut out, 1, &g.coordinates, dialect, "LineString")?;
            out.close(0, tag.name());
        }
        Geometry::LinearRing(g) => {
            out.open(0, &tag);
            coordinate_lines(&mut out, 1, &g.coordinates, dialect, "LinearRing")?;
            out.close(0, tag.name());
        }
        Geometry::Polygon(polygon) => {
            out.open(0, &tag);
            ring_lines(&mut out, 1, &polygon.rings, dimension, dialect, "Polygon")?;
            out.close(0, tag.name());
        }
        Geometry::Envelope(envelope) => {
            out.open(0, &tag);
            let corners = [envelope.lower_corner.clone(), envelope.upper_corner.clone()];
            corner_lines(&mut out, 1, &corners, dialect)?;
            out.close(0, tag.name());
        }
        Geometry::Box(bbox) => {
            let [min_x, min_y, max_x, max_y] = bbox.bbox;
            out.open(0, &tag);
            position_lines(
                &mut out,
                1,
                &[vec![min_x, min_y], vec![max_x, max_y]],
                dialect,
                "Box",
            )?;
            out.close(0, tag.name());
        }
        Geometry::Curve(curve) => {
            out.open(0, &tag);
            out.open(1, &Tag::new("gml:segments"));
            out.open(2, &Tag::new("gml:LineStringSegment"));
            coordinate_lines(&mut out, 3, &curve.coordinates, dialect, "Curve")?;
            out.close(2, "gml:LineStringSegment");
            out.close(1, "gml:segments");
            out.close(0, tag.name());
        }
        Geometry::Surface(surface) => {
            if surface.patches.is_empty() {
                return Err(GmlError::missing("Surface PolygonPatch"));
            }
            out.open(0, &tag);
            out.open(1, &Tag::new("gml:patches"));
            for patch in &surface.patches {
                let patch_dimension = rings_dimension(patch, dimension);
                out.open(2, &nested_tag("gml:PolygonPatch", patch_dimension, dimension, dialect));
                ring_lines(&mut out, 3, patch, patch_dimension, dialect, "PolygonPatch")?;
                out.close(2, "gml:PolygonPatch");
            }
            out.close(1, "gml:patches");
            out.close(0, tag.name());
        }
        Geometry::MultiPoint(multi) => {
            out.open(0, &tag);
            for point in &multi.points {
                out.open(1, &Tag::new("gml:pointMember"));
                out.open(2, &nested_tag("gml:Point", point.len(), dimension, dialect));
                position_lines(&mut out, 3, std::slice::from_ref(point), dialect, "Point")?;
                out.close(2, "gml:Point");
                out.close(1, "gml:pointMember");
            }
            out.close(0, tag.name());
        }
        Geometry::MultiLineString(multi) => {
            out.open(0, &tag);
            for line in &multi.line_strings {
                out.open(1, &Tag::new("gml:lineStringMember"));
                let line_dimension = line.first().map_or(dimension, Vec::len);
                out.open(2, &nested_tag("gml:LineString", line_dimension, dimension, dialect));
                coordinate_lines(&mut out, 3, line, dialect, "LineString")?;
                out.close(2, "gml:LineString");
                out.close(1, "gml:lineStringMember");
            }
            out.close(0, tag.name());
        }
        Geometry::MultiPolygon(multi) => {
            out.open(0, &tag);
            for rings in &multi.polygons {
                out.open(1, &Tag::new("gml:polygonMember"));
                let polygon_dimension = rings_dimension(rings, dimension);
                out.open(2, &nested_tag("gml:Polygon", polygon_dimension, dimension, dialect));
                ring_lines(&mut out, 3, rings, polygon_dimension, dialect, "Polygon")?;
                out.close(2, "gml:Polygon");
                out.close(1, "gml:polygonMember");
            }
            out.close(0, tag.name());
        }
    }
    Ok(out)
}

/// Outer tag with `srsName`, plus `srsDimension` for non-2D current output.
fn root_tag(geometry: &Geometry, dialect: Dialect) -> Tag {
    let meta: &GeometryMeta = geometry.meta();
    let tag = Tag::new(format!("gml:{}", geometry.type_name()))
        .attr_opt("srsName", meta.srs_name.as_deref());
    if dialect == Dialect::Current && meta.dimension != 2 && !matches!(geometry, Geometry::Box(_)) {
        tag.attr("srsDimension", meta.dimension.to_string())
    } else {
        tag
    }
}

/// Tag of a nested geometry, with `srsDimension` when its tuples differ
/// from the enclosing dimension.
fn nested_tag(name: &str, own: usize, enclosing: usize, dialect: Dialect) -> Tag {
    let tag = Tag::new(name);
    if dialect == Dialect::Current && own > 0 && own != enclosing {
        tag.attr("srsDimension", own.to_string())
    } else {
        tag
    }
}

/// Tuple length of a polygon's rings, or `fallback` when they are empty.
fn rings_dimension(rings: &[Ring], fallback: usize) -> usize {
    rings.iter().flatten().next().map_or(fallback, Vec::len)
}

/// A coordinate sequence: `posList` or `coordinates`.
fn coordinate_lines(
    out: &mut Fragment,
    level: usize,
    tuples: &[Position],
    dialect: Dialect,
    construct: &str,
) -> Result<()> {
    if tuples.is_empty() {
        return Err(GmlError::missing(format!("{construct} coordinates")));
    }
    let name = match dialect {
        Dialect::Legacy => "gml:coordinates",
        Dialect::Current => "gml:posList",
    };
    out.leaf(level, &Tag::new(name), &format_coordinates(tuples, dialect));
    Ok(())
}

/// Individual positions: one `pos` each, or a single `coordinates`.
fn position_lines(
    out: &mut Fragment,
    level: usize,
    positions: &[Position],
    dialect: Dialect,
    construct: &str,
) -> Result<()> {
    if positions.iter().all(Vec::is_empty) {
        return Err(GmlError::missing(format!("{construct} coordinates")));
    }
    match dialect {
        Dialect::Legacy => coordinate_lines(out, level, positions, dialect, construct),
        Dialect::Current => {
            for position in positions {
                out.leaf(level, &Tag::new("gml:pos"), &format_position(position));
            }
            Ok(())
        }
    }
}

fn corner_lines(out: &mut Fragment, level: usize, corners: &[Position; 2], dialect: Dialect) -> Result<()> {
    match dialect {
        Dialect::Legacy => coordinate_lines(out, level, corners, dialect, "Envelope"),
        Dialect::Current => {
            out.leaf(level, &Tag::new("gml:lowerCorner"), &format_position(&corners[0]));
            out.leaf(level, &Tag::new("gml:upperCorner"), &format_position(&corners[1]));
            Ok(())
        }
    }
}

/// Exterior then interior rings, each a `LinearRing`.
fn ring_lines(
    out: &mut Fragment,
    level: usize,
    rings: &[Ring],
    dimension: usize,
    dialect: Dialect,
    construct: &str,
) -> Result<()> {
    let vocabulary = Vocabulary::of(dialect);
    let Some((exterior, interiors)) = rings.split_first() else {
        return Err(GmlError::missing(format!("{construct} exterior")));
    };

    let boundaries =
        std::iter::once((vocabulary.exterior, exterior)).chain(interiors.iter().map(|r| (vocabulary.interior, r)));
    for (wrapper, ring) in boundaries {
        out.open(level, &Tag::new(wrapper));
        let ring_dimension = ring.first().map_or(dimension, Vec::len);
        out.open(level + 1, &nested_tag("gml:LinearRing", ring_dimension, dimension, dialect));
        coordinate_lines(out, level + 2, ring, dialect, "LinearRing")?;
        out.close(level + 1, "gml:LinearRing");
        out.close(level, wrapper);
    }
    Ok(())
}
