//! Coverage Generator: GML 3.2 + GMLCOV + SWE coverage documents.

use super::feature::bounded_by_fragment;
use super::fragment::{Fragment, Tag};
use super::geometry::geometry_fragment;
use crate::base::Dialect;
use crate::base::constants::DATA_TYPE_DEFINITION;
use crate::coords::{format_coordinates, format_position};
use crate::error::Result;
use crate::model::{Coverage, Geometry, GridDomain, RangeField, RangeSet, TemporalAxis};

/// Serialize a coverage as a complete element (namespaces not yet declared).
pub(crate) fn coverage_fragment(coverage: &Coverage) -> Result<Fragment> {
    let id = coverage.id().unwrap_or("coverage");
    let tag = Tag::new(format!("gmlcov:{}", coverage.type_name())).attr_opt("gml:id", coverage.id());

    let mut out = Fragment::new();
    out.open(0, &tag);

    if let Some(envelope) = coverage.bounded_by() {
        out.splice(0, bounded_by_fragment(envelope, Dialect::Current)?);
    }

    out.open(1, &Tag::new("gml:domainSet"));
    match coverage {
        Coverage::RectifiedGrid(c) => {
            let grid = Tag::new("gml:RectifiedGrid")
                .attr("gml:id", format!("{id}-grid"))
                .attr("dimension", c.domain.dimension.to_string());
            out.open(2, &grid);
            grid_lines(&mut out, 3, &c.domain);
            out.open(3, &Tag::new("gml:origin"));
            let point = Tag::new("gml:Point")
                .attr("gml:id", format!("{id}-origin"))
                .attr_opt("srsName", c.srs_name.as_deref());
            out.open(4, &point);
            out.leaf(5, &Tag::new("gml:pos"), &format_position(&c.origin));
            out.close(4, point.name());
            out.close(3, "gml:origin");
            for vector in &c.offset_vectors {
                let offset = Tag::new("gml:offsetVector").attr_opt("srsName", c.srs_name.as_deref());
                out.leaf(3, &offset, &format_position(vector));
            }
            out.close(2, grid.name());
        }
        Coverage::Grid(c) | Coverage::ReferenceableGrid(c) => {
            let grid = Tag::new("gml:Grid")
                .attr("gml:id", format!("{id}-grid"))
                .attr("dimension", c.domain.dimension.to_string());
            out.open(2, &grid);
            grid_lines(&mut out, 3, &c.domain);
            out.close(2, grid.name());
        }
        Coverage::MultiPoint(c) => {
            out.splice(1, geometry_fragment(&Geometry::MultiPoint(c.domain.clone()), Dialect::Current)?);
        }
    }
    out.close(1, "gml:domainSet");

    out.splice(0, range_set_fragment(coverage.range_set()));

    if !coverage.range_type().is_empty() {
        out.splice(0, range_type_fragment(coverage.range_type()));
    }

    if let Some(temporal) = coverage.temporal() {
        out.splice(0, temporal_fragment(temporal, id));
    }

    out.close(0, tag.name());
    Ok(out)
}

fn grid_lines(out: &mut Fragment, level: usize, domain: &GridDomain) {
    let join = |values: &[i64]| {
        values
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };
    out.open(level, &Tag::new("gml:limits"));
    out.open(level + 1, &Tag::new("gml:GridEnvelope"));
    out.leaf(level + 2, &Tag::new("gml:low"), &join(&domain.limits.low));
    out.leaf(level + 2, &Tag::new("gml:high"), &join(&domain.limits.high));
    out.close(level + 1, "gml:GridEnvelope");
    out.close(level, "gml:limits");
    if !domain.axis_labels.is_empty() {
        out.leaf(level, &Tag::new("gml:axisLabels"), &domain.axis_labels.join(" "));
    }
}

/// `File` reference, or a `DataBlock` (empty when there are no values).
fn range_set_fragment(range_set: &RangeSet) -> Fragment {
    let mut out = Fragment::new();
    out.open(0, &Tag::new("gml:rangeSet"));
    match range_set {
        RangeSet::File {
            file_name,
            file_structure,
        } => {
            out.open(1, &Tag::new("gml:File"));
            out.empty(2, &Tag::new("gml:rangeParameters"));
            out.leaf(2, &Tag::new("gml:fileName"), file_name);
            if let Some(structure) = file_structure {
                out.leaf(2, &Tag::new("gml:fileStructure"), structure);
            }
            out.close(1, "gml:File");
        }
        RangeSet::Inline { tuples } => {
            out.open(1, &Tag::new("gml:DataBlock"));
            out.empty(2, &Tag::new("gml:rangeParameters"));
            if tuples.is_empty() {
                out.empty(2, &Tag::new("gml:tupleList"));
            } else {
                let text = format_coordinates(tuples, Dialect::Legacy);
                out.leaf(2, &Tag::new("gml:tupleList"), &text);
            }
            out.close(1, "gml:DataBlock");
        }
    }
    out.close(0, "gml:rangeSet");
    out
}

fn range_type_fragment(fields: &[RangeField]) -> Fragment {
    let mut out = Fragment::new();
    out.open(0, &Tag::new("gmlcov:rangeType"));
    out.open(1, &Tag::new("swe:DataRecord"));
    for field in fields {
        let definition = field.data_type.as_deref().map(|t| {
            if t.contains("://") {
                t.to_string()
            } else {
                format!("{DATA_TYPE_DEFINITION}{t}")
            }
        });
        out.open(2, &Tag::new("swe:field").attr("name", field.name.as_str()));
        let quantity = Tag::new("swe:Quantity").attr_opt("definition", definition.as_deref());
        out.open(3, &quantity);
        if let Some(description) = &field.description {
            out.leaf(4, &Tag::new("swe:description"), description);
        }
        if let Some(uom) = &field.uom {
            out.empty(4, &Tag::new("swe:uom").attr("code", uom.as_str()));
        }
        out.close(3, quantity.name());
        out.close(2, "swe:field");
    }
    out.close(1, "swe:DataRecord");
    out.close(0, "gmlcov:rangeType");
    out
}

fn temporal_fragment(temporal: &TemporalAxis, id: &str) -> Fragment {
    let mut out = Fragment::new();
    out.open(0, &Tag::new("gmlcov:metadata"));
    out.open(1, &Tag::new("gmlcov:Extension"));
    let period = Tag::new("gml:TimePeriod").attr("gml:id", format!("{id}-time"));
    out.open(2, &period);
    out.leaf(3, &Tag::new("gml:beginPosition"), &temporal.start);
    out.leaf(3, &Tag::new("gml:endPosition"), &temporal.end);
    if let Some(resolution) = &temporal.resolution {
        let interval = Tag::new("gml:timeInterval").attr_opt("unit", temporal.uom.as_deref());
        out.leaf(3, &interval, resolution);
    }
    out.close(2, period.name());
    out.close(1, "gmlcov:Extension");
    out.close(0, "gmlcov:metadata");
    out
}
