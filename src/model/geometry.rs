//! Geometry variants.

use serde::{Deserialize, Serialize};

use crate::base::Dialect;

/// One coordinate tuple: x, y and an optional z.
pub type Position = Vec<f64>;

/// Closed sequence of positions (first equals last, not enforced).
pub type Ring = Vec<Position>;

/// Attributes shared by every geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryMeta {
    /// `srsName` attribute, inherited from the enclosing geometry if absent.
    pub srs_name: Option<String>,
    /// Tuple length (`srsDimension`), 2 or 3.
    pub dimension: usize,
    /// Dialect of the source document.
    pub dialect: Dialect,
}

impl GeometryMeta {
    pub fn new(dimension: usize, dialect: Dialect) -> Self {
        Self {
            srs_name: None,
            dimension,
            dialect,
        }
    }
}

impl Default for GeometryMeta {
    fn default() -> Self {
        Self::new(2, Dialect::Current)
    }
}

fn dimension_of<'a>(mut positions: impl Iterator<Item = &'a Position>) -> usize {
    positions
        .next()
        .map(Vec::len)
        .filter(|d| *d > 0)
        .unwrap_or(2)
}

/// A single position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub coordinates: Position,
    pub meta: GeometryMeta,
}

impl Point {
    pub fn new(coordinates: Position) -> Self {
        let meta = GeometryMeta::new(dimension_of(std::iter::once(&coordinates)), Dialect::Current);
        Self { coordinates, meta }
    }
}

/// An ordered sequence of positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    pub coordinates: Vec<Position>,
    pub meta: GeometryMeta,
}

impl LineString {
    pub fn new(coordinates: Vec<Position>) -> Self {
        let meta = GeometryMeta::new(dimension_of(coordinates.iter()), Dialect::Current);
        Self { coordinates, meta }
    }
}

/// A closed line string used as a polygon boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRing {
    pub coordinates: Ring,
    pub meta: GeometryMeta,
}

impl LinearRing {
    pub fn new(coordinates: Ring) -> Self {
        let meta = GeometryMeta::new(dimension_of(coordinates.iter()), Dialect::Current);
        Self { coordinates, meta }
    }
}

/// A polygon; `rings[0]` is the exterior, the rest are holes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub rings: Vec<Ring>,
    pub meta: GeometryMeta,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        let meta = GeometryMeta::new(dimension_of(rings.iter().flatten()), Dialect::Current);
        Self { rings, meta }
    }

    pub fn exterior(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn interiors(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }
}

/// Bounding box given by its lower and upper corners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub lower_corner: Position,
    pub upper_corner: Position,
    pub meta: GeometryMeta,
}

impl Envelope {
    pub fn new(lower_corner: Position, upper_corner: Position) -> Self {
        let meta = GeometryMeta::new(dimension_of(std::iter::once(&lower_corner)), Dialect::Current);
        Self {
            lower_corner,
            upper_corner,
            meta,
        }
    }

    /// Build a 2D envelope from `[minX, minY, maxX, maxY]`.
    pub fn from_bbox(bbox: [f64; 4]) -> Self {
        Self::new(vec![bbox[0], bbox[1]], vec![bbox[2], bbox[3]])
    }

    /// `[minX, minY, maxX, maxY]`; missing components read as 0.
    pub fn bbox(&self) -> [f64; 4] {
        let at = |p: &Position, i: usize| p.get(i).copied().unwrap_or(0.0);
        [
            at(&self.lower_corner, 0),
            at(&self.lower_corner, 1),
            at(&self.upper_corner, 0),
            at(&self.upper_corner, 1),
        ]
    }
}

/// GML 2 `Box`: raw `[minX, minY, maxX, maxY]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub bbox: [f64; 4],
    pub meta: GeometryMeta,
}

impl BoxGeometry {
    pub fn new(bbox: [f64; 4]) -> Self {
        Self {
            bbox,
            meta: GeometryMeta::default(),
        }
    }

    /// The same extent as an [`Envelope`].
    pub fn to_envelope(&self) -> Envelope {
        let mut envelope = Envelope::from_bbox(self.bbox);
        envelope.meta = self.meta.clone();
        envelope.meta.dimension = 2;
        envelope
    }
}

/// A curve made of line segments, flattened to one position sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub coordinates: Vec<Position>,
    pub meta: GeometryMeta,
}

impl Curve {
    pub fn new(coordinates: Vec<Position>) -> Self {
        let meta = GeometryMeta::new(dimension_of(coordinates.iter()), Dialect::Current);
        Self { coordinates, meta }
    }
}

/// A surface made of polygon patches, each a list of rings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub patches: Vec<Vec<Ring>>,
    pub meta: GeometryMeta,
}

impl Surface {
    pub fn new(patches: Vec<Vec<Ring>>) -> Self {
        let meta = GeometryMeta::new(
            dimension_of(patches.iter().flatten().flatten()),
            Dialect::Current,
        );
        Self { patches, meta }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiPoint {
    pub points: Vec<Position>,
    pub meta: GeometryMeta,
}

impl MultiPoint {
    pub fn new(points: Vec<Position>) -> Self {
        let meta = GeometryMeta::new(dimension_of(points.iter()), Dialect::Current);
        Self { points, meta }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiLineString {
    pub line_strings: Vec<Vec<Position>>,
    pub meta: GeometryMeta,
}

impl MultiLineString {
    pub fn new(line_strings: Vec<Vec<Position>>) -> Self {
        let meta = GeometryMeta::new(dimension_of(line_strings.iter().flatten()), Dialect::Current);
        Self { line_strings, meta }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon {
    pub polygons: Vec<Vec<Ring>>,
    pub meta: GeometryMeta,
}

impl MultiPolygon {
    pub fn new(polygons: Vec<Vec<Ring>>) -> Self {
        let meta = GeometryMeta::new(
            dimension_of(polygons.iter().flatten().flatten()),
            Dialect::Current,
        );
        Self { polygons, meta }
    }
}

/// Discriminated union of every geometry kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    LinearRing(LinearRing),
    Polygon(Polygon),
    Envelope(Envelope),
    Box(BoxGeometry),
    Curve(Curve),
    Surface(Surface),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
}

impl Geometry {
    /// GML element name of this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::LinearRing(_) => "LinearRing",
            Geometry::Polygon(_) => "Polygon",
            Geometry::Envelope(_) => "Envelope",
            Geometry::Box(_) => "Box",
            Geometry::Curve(_) => "Curve",
            Geometry::Surface(_) => "Surface",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn meta(&self) -> &GeometryMeta {
        match self {
            Geometry::Point(g) => &g.meta,
            Geometry::LineString(g) => &g.meta,
            Geometry::LinearRing(g) => &g.meta,
            Geometry::Polygon(g) => &g.meta,
            Geometry::Envelope(g) => &g.meta,
            Geometry::Box(g) => &g.meta,
            Geometry::Curve(g) => &g.meta,
            Geometry::Surface(g) => &g.meta,
            Geometry::MultiPoint(g) => &g.meta,
            Geometry::MultiLineString(g) => &g.meta,
            Geometry::MultiPolygon(g) => &g.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut GeometryMeta {
        match self {
            Geometry::Point(g) => &mut g.meta,
            Geometry::LineString(g) => &mut g.meta,
            Geometry::LinearRing(g) => &mut g.meta,
            Geometry::Polygon(g) => &mut g.meta,
            Geometry::Envelope(g) => &mut g.meta,
            Geometry::Box(g) => &mut g.meta,
            Geometry::Curve(g) => &mut g.meta,
            Geometry::Surface(g) => &mut g.meta,
            Geometry::MultiPoint(g) => &mut g.meta,
            Geometry::MultiLineString(g) => &mut g.meta,
            Geometry::MultiPolygon(g) => &mut g.meta,
        }
    }

    pub fn with_srs_name(mut self, srs_name: impl Into<String>) -> Self {
        self.meta_mut().srs_name = Some(srs_name.into());
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.meta_mut().dialect = dialect;
        self
    }
}

impl From<Point> for Geometry {
    fn from(g: Point) -> Self {
        Geometry::Point(g)
    }
}

impl From<LineString> for Geometry {
    fn from(g: LineString) -> Self {
        Geometry::LineString(g)
    }
}

impl From<LinearRing> for Geometry {
    fn from(g: LinearRing) -> Self {
        Geometry::LinearRing(g)
    }
}

impl From<Polygon> for Geometry {
    fn from(g: Polygon) -> Self {
        Geometry::Polygon(g)
    }
}

impl From<Envelope> for Geometry {
    fn from(g: Envelope) -> Self {
        Geometry::Envelope(g)
    }
}

impl From<BoxGeometry> for Geometry {
    fn from(g: BoxGeometry) -> Self {
        Geometry::Box(g)
    }
}

impl From<Curve> for Geometry {
    fn from(g: Curve) -> Self {
        Geometry::Curve(g)
    }
}

impl From<Surface> for Geometry {
    fn from(g: Surface) -> Self {
        Geometry::Surface(g)
    }
}

impl From<MultiPoint> for Geometry {
    fn from(g: MultiPoint) -> Self {
        Geometry::MultiPoint(g)
    }
}

impl From<MultiLineString> for Geometry {
    fn from(g: MultiLineString) -> Self {
        Geometry::MultiLineString(g)
    }
}

impl From<MultiPolygon> for Geometry {
    fn from(g: MultiPolygon) -> Self {
        Geometry::MultiPolygon(g)
    }
}
