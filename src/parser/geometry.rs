//! Geometry readers: one per geometry kind, all dimension aware.

use tracing::trace;

use super::context::Context;
use crate::coords::{self, LegacySeparators};
use crate::error::{GmlError, Result};
use crate::model::{
    BoxGeometry, Curve, Envelope, Geometry, LineString, LinearRing, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon, Position, Ring, Surface,
};
use crate::xml::XmlElement;

/// Read any geometry element.
///
/// `MultiCurve` and `MultiSurface` are read as `MultiLineString` and
/// `MultiPolygon`.
pub(crate) fn read_geometry(element: &XmlElement, parent: &Context) -> Result<Geometry> {
    let ctx = parent.enter(element);
    trace!(geometry = %element.local_name, "reading geometry");

    match element.local_name.as_str() {
        "Point" => {
            let coordinates = read_point_position(element, &ctx, "Point")?;
            let meta = ctx.meta(std::iter::once(&coordinates), "Point")?;
            Ok(Geometry::Point(Point { coordinates, meta }))
        }
        "LineString" => {
            let coordinates = read_positions(element, &ctx, "LineString")?;
            let meta = ctx.meta(&coordinates, "LineString")?;
            Ok(Geometry::LineString(LineString { coordinates, meta }))
        }
        "LinearRing" => {
            let coordinates = read_positions(element, &ctx, "LinearRing")?;
            let meta = ctx.meta(&coordinates, "LinearRing")?;
            Ok(Geometry::LinearRing(LinearRing { coordinates, meta }))
        }
        "Polygon" => {
            let rings = read_rings(element, &ctx, "Polygon")?;
            let meta = ctx.meta(rings.iter().flatten(), "Polygon")?;
            Ok(Geometry::Polygon(Polygon { rings, meta }))
        }
        "Envelope" => {
            let (lower_corner, upper_corner) = read_corners(element, &ctx, "Envelope")?;
            let meta = ctx.meta([&lower_corner, &upper_corner], "Envelope")?;
            Ok(Geometry::Envelope(Envelope {
                lower_corner,
                upper_corner,
                meta,
            }))
        }
        "Box" => {
            let (lower, upper) = read_corners(element, &ctx, "Box")?;
            let bbox = match (lower.as_slice(), upper.as_slice()) {
                ([min_x, min_y, ..], [max_x, max_y, ..]) => [*min_x, *min_y, *max_x, *max_y],
                _ => {
                    return Err(GmlError::coordinates(
                        "Box corners need at least two components",
                    ));
                }
            };
            let mut meta = ctx.meta([&lower, &upper], "Box")?;
            meta.dimension = 2;
            Ok(Geometry::Box(BoxGeometry { bbox, meta }))
        }
        "Curve" => {
            let coordinates = read_curve_positions(element, &ctx)?;
            let meta = ctx.meta(&coordinates, "Curve")?;
            Ok(Geometry::Curve(Curve { coordinates, meta }))
        }
        "Surface" => {
            let patches = read_patches(element, &ctx)?;
            let meta = ctx.meta(patches.iter().flatten().flatten(), "Surface")?;
            Ok(Geometry::Surface(Surface { patches, meta }))
        }
        "MultiPoint" => {
            let points = member_elements(element, &["pointMember"], &["pointMembers"])?
                .into_iter()
                .map(|member| match read_geometry(member, &ctx)? {
                    Geometry::Point(point) => Ok(point.coordinates),
                    other => Err(unexpected_member("MultiPoint", other.type_name())),
                })
                .collect::<Result<Vec<_>>>()?;
            let meta = ctx.aggregate_meta(points.iter());
            Ok(Geometry::MultiPoint(MultiPoint { points, meta }))
        }
        "MultiLineString" | "MultiCurve" => {
            let line_strings = member_elements(
                element,
                &["lineStringMember", "curveMember"],
                &["lineStringMembers", "curveMembers"],
            )?
            .into_iter()
            .map(|member| match read_geometry(member, &ctx)? {
                Geometry::LineString(g) => Ok(g.coordinates),
                Geometry::Curve(g) => Ok(g.coordinates),
                Geometry::LinearRing(g) => Ok(g.coordinates),
                other => Err(unexpected_member("MultiLineString", other.type_name())),
            })
            .collect::<Result<Vec<_>>>()?;
            let meta = ctx.aggregate_meta(line_strings.iter().flatten());
            Ok(Geometry::MultiLineString(MultiLineString { line_strings, meta }))
        }
        "MultiPolygon" | "MultiSurface" => {
            let mut polygons = Vec::new();
            for member in member_elements(
                element,
                &["polygonMember", "surfaceMember"],
                &["polygonMembers", "surfaceMembers"],
            )? {
                match read_geometry(member, &ctx)? {
                    Geometry::Polygon(polygon) => polygons.push(polygon.rings),
                    Geometry::Surface(surface) => polygons.extend(surface.patches),
                    other => return Err(unexpected_member("MultiPolygon", other.type_name())),
                }
            }
            let meta = ctx.aggregate_meta(polygons.iter().flatten().flatten());
            Ok(Geometry::MultiPolygon(MultiPolygon { polygons, meta }))
        }
        other => Err(GmlError::UnsupportedGeometryType(other.to_string())),
    }
}

fn unexpected_member(aggregate: &str, found: &str) -> GmlError {
    GmlError::UnsupportedGeometryType(format!("{found} inside {aggregate}"))
}

/// Geometry elements of an aggregate, from singular member wrappers (one
/// geometry each) and plural wrappers (many), in encounter order.
fn member_elements<'a>(
    element: &'a XmlElement,
    single: &[&str],
    plural: &[&str],
) -> Result<Vec<&'a XmlElement>> {
    let mut members = Vec::new();
    for child in &element.children {
        let name = child.local_name.as_str();
        if single.contains(&name) {
            let geometry = child.first_child().ok_or_else(|| {
                GmlError::missing(format!("{} {name} content", element.local_name))
            })?;
            members.push(geometry);
        } else if plural.contains(&name) {
            members.extend(child.children.iter());
        }
    }
    Ok(members)
}

/// The single position of a point-like element.
fn read_point_position(element: &XmlElement, ctx: &Context, construct: &str) -> Result<Position> {
    read_positions(element, ctx, construct)?
        .into_iter()
        .next()
        .ok_or_else(|| GmlError::coordinates(format!("{construct} has no position")))
}

/// Positions of a coordinate-bearing element, whichever encoding it uses:
/// `posList`, `coordinates`, a run of `pos`, or GML 2 `coord` elements.
///
/// All tuples share one length, matching `srsDimension` when declared.
fn read_positions(element: &XmlElement, ctx: &Context, construct: &str) -> Result<Vec<Position>> {
    if let Some(pos_list) = element.child("posList") {
        let ctx = ctx.enter(pos_list);
        return coords::parse_current(pos_list.text_content(), ctx.dimension.unwrap_or(2));
    }

    let positions = if let Some(coordinates) = element.child("coordinates") {
        read_legacy_coordinates(coordinates)?
    } else if element.child("pos").is_some() {
        element
            .children_named("pos")
            .map(|pos| read_pos(pos, ctx))
            .collect::<Result<Vec<_>>>()?
    } else if element.child("coord").is_some() {
        element
            .children_named("coord")
            .map(read_coord)
            .collect::<Result<Vec<_>>>()?
    } else {
        return Err(GmlError::missing(format!("{construct} coordinates")));
    };
    ctx.check_tuples(&positions, construct)?;
    Ok(positions)
}

fn read_legacy_coordinates(coordinates: &XmlElement) -> Result<Vec<Position>> {
    let separators = LegacySeparators::from_attributes(
        coordinates.attr("cs"),
        coordinates.attr("ts"),
        coordinates.attr("decimal"),
    );
    coords::parse_legacy(coordinates.text_content(), separators)
}

/// One `pos` (or `lowerCorner`/`upperCorner`). Without a declared
/// dimension the value count is the dimension.
fn read_pos(pos: &XmlElement, ctx: &Context) -> Result<Position> {
    let ctx = ctx.enter(pos);
    let values = coords::parse_scalars(pos.text_content())?;
    match ctx.dimension {
        Some(dimension) if values.len() != dimension => Err(GmlError::coordinates(format!(
            "{} has {} values, expected {dimension}",
            pos.local_name,
            values.len()
        ))),
        _ => Ok(values),
    }
}

/// GML 2 `<coord><X/><Y/><Z/></coord>`.
fn read_coord(coord: &XmlElement) -> Result<Position> {
    let axis = |name: &str| coord.child(name).map(|el| coords::parse_scalar(&el.text));
    let x = axis("X").ok_or_else(|| GmlError::missing("coord X"))??;
    let y = axis("Y").ok_or_else(|| GmlError::missing("coord Y"))??;
    let mut position = vec![x, y];
    if let Some(z) = axis("Z") {
        position.push(z?);
    }
    Ok(position)
}

/// Lower and upper corner of an envelope-like element.
fn read_corners(element: &XmlElement, ctx: &Context, construct: &str) -> Result<(Position, Position)> {
    if let (Some(lower), Some(upper)) = (element.child("lowerCorner"), element.child("upperCorner")) {
        return Ok((read_pos(lower, ctx)?, read_pos(upper, ctx)?));
    }

    let positions = read_positions(element, ctx, construct)?;
    match <[Position; 2]>::try_from(positions) {
        Ok([lower, upper]) => Ok((lower, upper)),
        Err(positions) => Err(GmlError::coordinates(format!(
            "{construct} needs 2 corner positions, found {}",
            positions.len()
        ))),
    }
}

/// Exterior ring followed by interior rings.
fn read_rings(element: &XmlElement, ctx: &Context, construct: &str) -> Result<Vec<Ring>> {
    let exterior = element
        .child("exterior")
        .or_else(|| element.child("outerBoundaryIs"))
        .ok_or_else(|| GmlError::missing(format!("{construct} exterior")))?;
    let exterior_ring = exterior
        .first_child()
        .ok_or_else(|| GmlError::missing(format!("{construct} exterior ring")))?;

    let mut rings = vec![read_ring(exterior_ring, &ctx.enter(exterior))?];

    for wrapper in element
        .children
        .iter()
        .filter(|c| c.local_name == "interior" || c.local_name == "innerBoundaryIs")
    {
        if wrapper.children.is_empty() {
            return Err(GmlError::missing(format!("{construct} interior ring")));
        }
        let wrapper_ctx = ctx.enter(wrapper);
        for ring in &wrapper.children {
            rings.push(read_ring(ring, &wrapper_ctx)?);
        }
    }
    Ok(rings)
}

/// A `LinearRing`, or a GML 3 `Ring` built from curve members.
fn read_ring(ring: &XmlElement, parent: &Context) -> Result<Ring> {
    let ctx = parent.enter(ring);
    match ring.local_name.as_str() {
        "LinearRing" => read_positions(ring, &ctx, "LinearRing"),
        "Ring" => {
            let mut positions = Vec::new();
            for member in ring.children_named("curveMember") {
                let curve = member
                    .first_child()
                    .ok_or_else(|| GmlError::missing("Ring curveMember content"))?;
                let segment = match read_geometry(curve, &ctx)? {
                    Geometry::Curve(g) => g.coordinates,
                    Geometry::LineString(g) => g.coordinates,
                    other => return Err(unexpected_member("Ring", other.type_name())),
                };
                append_segment(&mut positions, segment);
            }
            if positions.is_empty() {
                return Err(GmlError::missing("Ring curveMember"));
            }
            Ok(positions)
        }
        other => Err(GmlError::UnsupportedGeometryType(other.to_string())),
    }
}

/// Positions of all curve segments joined end to end.
fn read_curve_positions(element: &XmlElement, ctx: &Context) -> Result<Vec<Position>> {
    let Some(segments) = element.child("segments") else {
        return Err(GmlError::missing("Curve segments"));
    };
    let mut positions = Vec::new();
    for segment in &segments.children {
        let segment_ctx = ctx.enter(segment);
        append_segment(
            &mut positions,
            read_positions(segment, &segment_ctx, &segment.local_name)?,
        );
    }
    if positions.is_empty() {
        return Err(GmlError::missing("Curve segment"));
    }
    Ok(positions)
}

/// Append a segment, skipping its first position if it repeats the joint.
fn append_segment(positions: &mut Vec<Position>, segment: Vec<Position>) {
    let mut segment = segment.into_iter().peekable();
    if let (Some(last), Some(first)) = (positions.last(), segment.peek()) {
        if last == first {
            segment.next();
        }
    }
    positions.extend(segment);
}

/// Polygon patches of a surface.
fn read_patches(element: &XmlElement, ctx: &Context) -> Result<Vec<Vec<Ring>>> {
    let patches = element
        .child("patches")
        .or_else(|| element.child("polygonPatches"))
        .ok_or_else(|| GmlError::missing("Surface patches"))?;
    if patches.children.is_empty() {
        return Err(GmlError::missing("Surface PolygonPatch"));
    }
    patches
        .children
        .iter()
        .map(|patch| read_rings(patch, &ctx.enter(patch), &patch.local_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Dialect;
    use crate::xml::parse_document;

    fn read(xml: &str) -> Result<Geometry> {
        let root = parse_document(xml).unwrap().unwrap();
        read_geometry(&root, &Context::new(Dialect::Current))
    }

    #[test]
    fn test_point_pos_without_dimension_uses_value_count() {
        let Geometry::Point(point) = read("<gml:Point><gml:pos>1 2 3</gml:pos></gml:Point>").unwrap() else {
            panic!("expected point");
        };
        assert_eq!(point.coordinates, vec![1.0, 2.0, 3.0]);
        assert_eq!(point.meta.dimension, 3);
    }

    #[test]
    fn test_gml2_coord_elements() {
        let Geometry::Point(point) =
            read("<gml:Point><gml:coord><gml:X>5</gml:X><gml:Y>6</gml:Y></gml:coord></gml:Point>").unwrap()
        else {
            panic!("expected point");
        };
        assert_eq!(point.coordinates, vec![5.0, 6.0]);
    }

    #[test]
    fn test_ring_overrides_polygon_dimension() {
        let xml = r#"<gml:Polygon srsDimension="2" srsName="EPSG:4979">
            <gml:exterior><gml:LinearRing srsDimension="3">
                <gml:posList>0 0 1 4 0 1 4 4 1 0 0 1</gml:posList>
            </gml:LinearRing></gml:exterior>
        </gml:Polygon>"#;
        let Geometry::Polygon(polygon) = read(xml).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.rings[0].len(), 4);
        assert_eq!(polygon.rings[0][1], vec![4.0, 0.0, 1.0]);
        assert_eq!(polygon.meta.dimension, 3);
        assert_eq!(polygon.meta.srs_name.as_deref(), Some("EPSG:4979"));
    }

    #[test]
    fn test_polygon_without_exterior_fails() {
        let err = read("<gml:Polygon><gml:interior/></gml:Polygon>").unwrap_err();
        assert!(matches!(err, GmlError::MissingRequiredElement(m) if m == "Polygon exterior"));
    }

    #[test]
    fn test_line_string_without_coordinates_fails() {
        let err = read("<gml:LineString/>").unwrap_err();
        assert!(matches!(err, GmlError::MissingRequiredElement(m) if m == "LineString coordinates"));
    }

    #[test]
    fn test_curve_segments_are_joined() {
        let xml = r#"<gml:Curve><gml:segments>
            <gml:LineStringSegment><gml:posList>0 0 1 1</gml:posList></gml:LineStringSegment>
            <gml:LineStringSegment><gml:posList>1 1 2 0</gml:posList></gml:LineStringSegment>
        </gml:segments></gml:Curve>"#;
        let Geometry::Curve(curve) = read(xml).unwrap() else {
            panic!("expected curve");
        };
        assert_eq!(curve.coordinates, vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.0]]);
    }

    #[test]
    fn test_multi_surface_reads_as_multi_polygon() {
        let xml = r#"<gml:MultiSurface><gml:surfaceMember><gml:Polygon><gml:exterior><gml:LinearRing>
            <gml:posList>0 0 1 0 1 1 0 0</gml:posList>
        </gml:LinearRing></gml:exterior></gml:Polygon></gml:surfaceMember></gml:MultiSurface>"#;
        let Geometry::MultiPolygon(multi) = read(xml).unwrap() else {
            panic!("expected multipolygon");
        };
        assert_eq!(multi.polygons.len(), 1);
    }

    #[test]
    fn test_surface_patches_share_dimension() {
        let xml = r#"<gml:Surface><gml:patches>
            <gml:PolygonPatch><gml:exterior><gml:LinearRing>
                <gml:posList>0 0 1 0 1 1 0 0</gml:posList>
            </gml:LinearRing></gml:exterior></gml:PolygonPatch>
            <gml:PolygonPatch srsDimension="3"><gml:exterior><gml:LinearRing>
                <gml:posList>0 0 1 1 0 1 1 1 1 0 0 1</gml:posList>
            </gml:LinearRing></gml:exterior></gml:PolygonPatch>
        </gml:patches></gml:Surface>"#;
        let err = read(xml).unwrap_err();
        assert!(matches!(err, GmlError::InvalidCoordinateText(m) if m.contains("Surface")));
    }

    #[test]
    fn test_box_from_legacy_coordinates() {
        let Geometry::Box(bbox) =
            read("<gml:Box><gml:coordinates>1,2 3,4</gml:coordinates></gml:Box>").unwrap()
        else {
            panic!("expected box");
        };
        assert_eq!(bbox.bbox, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_unknown_geometry_is_unsupported() {
        let err = read("<gml:InvalidGeometry/>").unwrap_err();
        assert!(matches!(err, GmlError::UnsupportedGeometryType(name) if name == "InvalidGeometry"));
    }
}
