//! Coverage readers (GML 3.2 + GMLCOV + SWE encoding).

use tracing::trace;

use super::context::Context;
use super::feature::read_bounded_by;
use super::geometry::read_geometry;
use crate::base::constants::{COVERAGE_ELEMENTS, DATA_TYPE_DEFINITION};
use crate::coords::{self, LegacySeparators};
use crate::error::{GmlError, Result};
use crate::model::{
    Coverage, Geometry, GridCoverage, GridDomain, GridLimits, MultiPointCoverage, Position,
    RangeField, RangeSet, RectifiedGridCoverage, TemporalAxis,
};
use crate::xml::XmlElement;

/// Read any coverage element.
pub(crate) fn read_coverage(element: &XmlElement, ctx: &Context) -> Result<Coverage> {
    trace!(coverage = %element.local_name, "reading coverage");
    let kind = element.local_name.as_str();
    if !COVERAGE_ELEMENTS.contains(&kind) {
        return Err(GmlError::UnsupportedCoverageType(kind.to_string()));
    }
    let parts = CommonParts::read(element, ctx)?;
    let domain_set = element
        .child("domainSet")
        .ok_or_else(|| GmlError::missing(format!("{kind} domainSet")))?;

    match kind {
        "RectifiedGridCoverage" => {
            let grid = domain_set
                .child("RectifiedGrid")
                .ok_or_else(|| GmlError::missing("RectifiedGrid"))?;
            let domain = read_grid_domain(grid)?;
            let (origin, origin_srs) = read_origin(grid, ctx)?;
            let offset_vectors = grid
                .children_named("offsetVector")
                .map(|v| coords::parse_scalars(v.text_content()))
                .collect::<Result<Vec<Position>>>()?;
            let srs_name = origin_srs.or_else(|| {
                parts
                    .bounded_by
                    .as_ref()
                    .and_then(|b| b.meta.srs_name.clone())
            });
            Ok(Coverage::RectifiedGrid(RectifiedGridCoverage {
                id: parts.id,
                bounded_by: parts.bounded_by,
                domain,
                srs_name,
                origin,
                offset_vectors,
                range_type: parts.range_type,
                range_set: parts.range_set,
                temporal: parts.temporal,
            }))
        }
        "GridCoverage" | "ReferenceableGridCoverage" => {
            let grid = domain_set
                .children
                .iter()
                .find(|c| c.child("limits").is_some())
                .ok_or_else(|| GmlError::missing(format!("{kind} grid")))?;
            let coverage = GridCoverage {
                id: parts.id,
                bounded_by: parts.bounded_by,
                domain: read_grid_domain(grid)?,
                range_type: parts.range_type,
                range_set: parts.range_set,
                temporal: parts.temporal,
            };
            Ok(if kind == "GridCoverage" {
                Coverage::Grid(coverage)
            } else {
                Coverage::ReferenceableGrid(coverage)
            })
        }
        "MultiPointCoverage" => {
            let multi_point = domain_set
                .child("MultiPoint")
                .ok_or_else(|| GmlError::missing("MultiPointCoverage MultiPoint"))?;
            let Geometry::MultiPoint(domain) = read_geometry(multi_point, ctx)? else {
                return Err(GmlError::missing("MultiPointCoverage MultiPoint"));
            };
            Ok(Coverage::MultiPoint(MultiPointCoverage {
                id: parts.id,
                bounded_by: parts.bounded_by,
                domain,
                range_type: parts.range_type,
                range_set: parts.range_set,
                temporal: parts.temporal,
            }))
        }
        other => Err(GmlError::UnsupportedCoverageType(other.to_string())),
    }
}

/// Parts shared by every coverage kind.
struct CommonParts {
    id: Option<String>,
    bounded_by: Option<crate::model::Envelope>,
    range_type: Vec<RangeField>,
    range_set: RangeSet,
    temporal: Option<TemporalAxis>,
}

impl CommonParts {
    fn read(element: &XmlElement, ctx: &Context) -> Result<Self> {
        let bounded_by = match element.child("boundedBy") {
            Some(b) => read_bounded_by(b, ctx)?,
            None => None,
        };
        let range_set = match element.child("rangeSet") {
            Some(r) => read_range_set(r)?,
            None => RangeSet::default(),
        };
        let range_type = element
            .child("rangeType")
            .map(read_range_type)
            .unwrap_or_default();
        let temporal = element
            .child("metadata")
            .and_then(|m| m.find_descendant(&|d: &XmlElement| d.local_name == "TimePeriod"))
            .map(read_time_period);

        Ok(Self {
            id: element.gml_id().map(str::to_string),
            bounded_by,
            range_type,
            range_set,
            temporal,
        })
    }
}

fn read_grid_domain(grid: &XmlElement) -> Result<GridDomain> {
    let envelope = grid
        .child("limits")
        .and_then(|l| l.child("GridEnvelope"))
        .ok_or_else(|| GmlError::missing(format!("{} limits", grid.local_name)))?;
    let index = |name: &str| -> Result<Vec<i64>> {
        let text = envelope
            .child(name)
            .and_then(XmlElement::text_content)
            .ok_or_else(|| GmlError::missing(format!("GridEnvelope {name}")))?;
        text.split_whitespace()
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| GmlError::coordinates(format!("non-integer grid index {v:?}")))
            })
            .collect()
    };
    let limits = GridLimits::new(index("low")?, index("high")?);

    let labels = grid
        .child("axisLabels")
        .and_then(XmlElement::text_content)
        .or_else(|| grid.attr("axisLabels"))
        .map(|l| l.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default();

    let mut domain = GridDomain::new(limits).with_axis_labels(labels);
    if let Some(dimension) = grid.attr("dimension").and_then(|d| d.trim().parse().ok()) {
        domain.dimension = dimension;
    }
    Ok(domain)
}

/// Origin position and its srsName.
fn read_origin(grid: &XmlElement, ctx: &Context) -> Result<(Position, Option<String>)> {
    let origin = grid
        .child("origin")
        .ok_or_else(|| GmlError::missing("RectifiedGrid origin"))?;
    match origin.first_child() {
        Some(point) => match read_geometry(point, ctx)? {
            Geometry::Point(p) => Ok((p.coordinates, p.meta.srs_name)),
            other => Err(GmlError::UnsupportedGeometryType(format!(
                "{} as grid origin",
                other.type_name()
            ))),
        },
        // GML 3.1 style `<gml:origin><gml:pos>` is not wrapped in a Point.
        None => Ok((coords::parse_scalars(origin.text_content())?, None)),
    }
}

fn read_range_set(range_set: &XmlElement) -> Result<RangeSet> {
    if let Some(file) = range_set.child("File") {
        let file_name = file
            .child("fileName")
            .or_else(|| file.child("fileReference"))
            .and_then(XmlElement::text_content)
            .ok_or_else(|| GmlError::missing("File fileName"))?;
        return Ok(RangeSet::File {
            file_name: file_name.to_string(),
            file_structure: file
                .child("fileStructure")
                .and_then(XmlElement::text_content)
                .map(str::to_string),
        });
    }

    let Some(tuple_list) = range_set
        .child("DataBlock")
        .and_then(|d| d.child("tupleList"))
    else {
        return Ok(RangeSet::default());
    };
    let tuples = match tuple_list.text_content() {
        None => Vec::new(),
        Some(text) => {
            let separators = LegacySeparators::from_attributes(
                tuple_list.attr("cs"),
                tuple_list.attr("ts"),
                None,
            );
            coords::parse_legacy(Some(text), separators)?
        }
    };
    Ok(RangeSet::Inline { tuples })
}

fn read_range_type(range_type: &XmlElement) -> Vec<RangeField> {
    let Some(record) = range_type.child("DataRecord") else {
        return Vec::new();
    };
    record
        .children_named("field")
        .map(|field| {
            let mut range_field = RangeField::new(field.attr("name").unwrap_or_default());
            if let Some(quantity) = field.first_child() {
                range_field.description = quantity
                    .child("description")
                    .and_then(XmlElement::text_content)
                    .map(str::to_string);
                range_field.uom = quantity
                    .child("uom")
                    .and_then(|u| u.attr("code"))
                    .map(str::to_string);
                range_field.data_type = quantity.attr("definition").map(|d| {
                    d.strip_prefix(DATA_TYPE_DEFINITION)
                        .unwrap_or(d)
                        .to_string()
                });
            }
            range_field
        })
        .collect()
}

fn read_time_period(period: &XmlElement) -> TemporalAxis {
    let text = |name: &str| {
        period
            .child(name)
            .and_then(XmlElement::text_content)
            .map(str::to_string)
    };
    let interval = period.child("timeInterval");
    TemporalAxis {
        start: text("beginPosition").unwrap_or_default(),
        end: text("endPosition").unwrap_or_default(),
        resolution: interval
            .and_then(XmlElement::text_content)
            .map(str::to_string),
        uom: interval.and_then(|i| i.attr("unit")).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Dialect;
    use crate::xml::parse_document;

    const RECTIFIED: &str = r#"<gmlcov:RectifiedGridCoverage
        xmlns:gml="http://www.opengis.net/gml/3.2"
        xmlns:gmlcov="http://www.opengis.net/gmlcov/1.0"
        xmlns:swe="http://www.opengis.net/swe/2.0" gml:id="dem">
      <gml:domainSet>
        <gml:RectifiedGrid gml:id="dem-grid" dimension="2">
          <gml:limits><gml:GridEnvelope><gml:low>0 0</gml:low><gml:high>99 49</gml:high></gml:GridEnvelope></gml:limits>
          <gml:axisLabels>x y</gml:axisLabels>
          <gml:origin><gml:Point gml:id="dem-origin" srsName="EPSG:32633"><gml:pos>500000 4000000</gml:pos></gml:Point></gml:origin>
          <gml:offsetVector>30 0</gml:offsetVector>
          <gml:offsetVector>0 -30</gml:offsetVector>
        </gml:RectifiedGrid>
      </gml:domainSet>
      <gml:rangeSet><gml:File><gml:fileName>dem.tif</gml:fileName><gml:fileStructure>Record Interleaved</gml:fileStructure></gml:File></gml:rangeSet>
      <gmlcov:rangeType><swe:DataRecord>
        <swe:field name="elevation"><swe:Quantity definition="http://www.opengis.net/def/dataType/OGC/0/float32">
          <swe:description>Height</swe:description><swe:uom code="m"/>
        </swe:Quantity></swe:field>
      </swe:DataRecord></gmlcov:rangeType>
    </gmlcov:RectifiedGridCoverage>"#;

    #[test]
    fn test_rectified_grid_coverage() {
        let root = parse_document(RECTIFIED).unwrap().unwrap();
        let Coverage::RectifiedGrid(coverage) =
            read_coverage(&root, &Context::new(Dialect::Current)).unwrap()
        else {
            panic!("expected rectified grid");
        };
        assert_eq!(coverage.id.as_deref(), Some("dem"));
        assert_eq!(coverage.domain.limits.extents(), vec![100, 50]);
        assert_eq!(coverage.domain.axis_labels, vec!["x", "y"]);
        assert_eq!(coverage.srs_name.as_deref(), Some("EPSG:32633"));
        assert_eq!(coverage.offset_vectors, vec![vec![30.0, 0.0], vec![0.0, -30.0]]);
        assert_eq!(coverage.grid_to_world(&[1.0, 1.0]), vec![500030.0, 3999970.0]);
        assert_eq!(
            coverage.range_set,
            RangeSet::File {
                file_name: "dem.tif".into(),
                file_structure: Some("Record Interleaved".into()),
            }
        );
        let field = &coverage.range_type[0];
        assert_eq!(field.name, "elevation");
        assert_eq!(field.uom.as_deref(), Some("m"));
        assert_eq!(field.data_type.as_deref(), Some("float32"));
    }

    #[test]
    fn test_grid_coverage_requires_limits() {
        let root = parse_document(
            r#"<gmlcov:GridCoverage><gml:domainSet><gml:Grid/></gml:domainSet></gmlcov:GridCoverage>"#,
        )
        .unwrap()
        .unwrap();
        let err = read_coverage(&root, &Context::new(Dialect::Current)).unwrap_err();
        assert!(matches!(err, GmlError::MissingRequiredElement(_)));
    }

    #[test]
    fn test_inline_tuple_list() {
        let root = parse_document(
            r#"<gml:rangeSet><gml:DataBlock><gml:tupleList>1,2 3,4</gml:tupleList></gml:DataBlock></gml:rangeSet>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            read_range_set(&root).unwrap(),
            RangeSet::Inline {
                tuples: vec![vec![1.0, 2.0], vec![3.0, 4.0]]
            }
        );
    }
}
