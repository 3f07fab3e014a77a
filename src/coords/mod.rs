//! Coordinate Codec: dimension-aware text ⇄ tuple conversion.
//!
//! Two encodings exist:
//!
//! ```text
//! legacy   <gml:coordinates>1,2 3,4 5,6</gml:coordinates>
//!          tuples split on `ts` (whitespace), components on `cs` (comma)
//!
//! current  <gml:posList srsDimension="2">1 2 3 4 5 6</gml:posList>
//!          flat scalar stream regrouped every `dimension` values
//! ```

use crate::base::Dialect;
use crate::error::{GmlError, Result};
use crate::model::Position;

/// Coordinate data either already grouped into tuples or flat.
#[derive(Clone, Debug, PartialEq)]
pub enum CoordinateData {
    Flat(Vec<f64>),
    Nested(Vec<Position>),
}

/// Separators of a legacy `gml:coordinates` element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacySeparators {
    /// Tuple component separator (`cs`).
    pub cs: char,
    /// Tuple separator (`ts`); whitespace means "any whitespace run".
    pub ts: char,
    /// Decimal mark (`decimal`).
    pub decimal: char,
}

impl Default for LegacySeparators {
    fn default() -> Self {
        Self {
            cs: ',',
            ts: ' ',
            decimal: '.',
        }
    }
}

impl LegacySeparators {
    /// Separators from `cs`/`ts`/`decimal` attribute values, falling back
    /// to the GML defaults for absent or empty attributes.
    pub fn from_attributes(cs: Option<&str>, ts: Option<&str>, decimal: Option<&str>) -> Self {
        let first = |value: Option<&str>, default: char| {
            value.and_then(|v| v.chars().next()).unwrap_or(default)
        };
        let defaults = Self::default();
        Self {
            cs: first(cs, defaults.cs),
            ts: first(ts, defaults.ts),
            decimal: first(decimal, defaults.decimal),
        }
    }
}

/// Parse coordinate text in the given dialect.
///
/// `text` of `None` (element absent) fails like non-numeric content does.
pub fn parse_coordinates(
    text: Option<&str>,
    dialect: Dialect,
    dimension: usize,
) -> Result<Vec<Position>> {
    match dialect {
        Dialect::Legacy => parse_legacy(text, LegacySeparators::default()),
        Dialect::Current => parse_current(text, dimension),
    }
}

/// Parse legacy `coordinates` text with explicit separators.
///
/// Every tuple must have the same number of components.
pub fn parse_legacy(text: Option<&str>, separators: LegacySeparators) -> Result<Vec<Position>> {
    let text = require_text(text)?;

    let groups: Vec<&str> = if separators.ts.is_whitespace() {
        text.split_whitespace().collect()
    } else {
        text.split(separators.ts)
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect()
    };

    let tuples = groups
        .into_iter()
        .map(|group| {
            group
                .split(separators.cs)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_scalar_with(s, separators.decimal))
                .collect::<Result<Position>>()
        })
        .collect::<Result<Vec<Position>>>()?;

    if let Some(first) = tuples.first() {
        if let Some(bad) = tuples.iter().find(|t| t.len() != first.len()) {
            return Err(GmlError::coordinates(format!(
                "mixed tuple dimensions ({} and {})",
                first.len(),
                bad.len()
            )));
        }
    }
    Ok(tuples)
}

/// Parse current (`pos`/`posList`) text, regrouping by `dimension`.
///
/// Unlike [`to_tuples`], a value count that is not a multiple of
/// `dimension` is an error.
pub fn parse_current(text: Option<&str>, dimension: usize) -> Result<Vec<Position>> {
    let flat = parse_scalars(text)?;
    let dimension = dimension.max(1);
    if flat.len() % dimension != 0 {
        return Err(GmlError::coordinates(format!(
            "{} values do not divide into tuples of {dimension}",
            flat.len()
        )));
    }
    Ok(to_tuples(CoordinateData::Flat(flat), dimension))
}

/// Parse a whitespace-separated scalar stream.
pub fn parse_scalars(text: Option<&str>) -> Result<Vec<f64>> {
    require_text(text)?
        .split_whitespace()
        .map(parse_scalar)
        .collect()
}

/// Parse one numeric scalar.
pub fn parse_scalar(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| GmlError::coordinates(format!("non-numeric value {s:?}")))
}

fn parse_scalar_with(s: &str, decimal: char) -> Result<f64> {
    if decimal == '.' {
        parse_scalar(s)
    } else {
        parse_scalar(&s.replace(decimal, "."))
    }
}

fn require_text(text: Option<&str>) -> Result<&str> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GmlError::coordinates("coordinate text is absent"))
}

/// Group coordinate data into tuples of `dimension`.
///
/// Nested data is returned unchanged. Flat data is grouped every
/// `dimension` values; a trailing partial group is dropped without error.
pub fn to_tuples(data: CoordinateData, dimension: usize) -> Vec<Position> {
    match data {
        CoordinateData::Nested(tuples) => tuples,
        CoordinateData::Flat(flat) => {
            let dimension = dimension.max(1);
            flat.chunks_exact(dimension).map(<[f64]>::to_vec).collect()
        }
    }
}

/// Flatten tuples into one scalar stream.
pub fn flatten(tuples: &[Position]) -> Vec<f64> {
    tuples.iter().flatten().copied().collect()
}

/// Encode tuples as coordinate text in the given dialect.
///
/// Legacy joins components with `,` and tuples with a space; current emits
/// one space-joined flat stream.
pub fn format_coordinates(tuples: &[Position], dialect: Dialect) -> String {
    match dialect {
        Dialect::Legacy => tuples
            .iter()
            .map(|t| join(t, ","))
            .collect::<Vec<_>>()
            .join(" "),
        Dialect::Current => join(&flatten(tuples), " "),
    }
}

/// Encode one tuple as `pos` text.
pub fn format_position(position: &[f64]) -> String {
    join(position, " ")
}

fn join(values: &[f64], separator: &str) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_splits_tuples_then_components() {
        let tuples = parse_coordinates(Some("1,2 3,4\n 5,6"), Dialect::Legacy, 2).unwrap();
        assert_eq!(tuples, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
    }

    #[test]
    fn test_legacy_tuple_length_comes_from_text() {
        let tuples = parse_coordinates(Some("1,2,3 4,5,6"), Dialect::Legacy, 2).unwrap();
        assert_eq!(tuples, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_legacy_rejects_mixed_dimensions() {
        let err = parse_coordinates(Some("1,2 3,4,5"), Dialect::Legacy, 2).unwrap_err();
        assert!(matches!(err, GmlError::InvalidCoordinateText(_)));
    }

    #[test]
    fn test_legacy_custom_separators() {
        let separators = LegacySeparators::from_attributes(Some(" "), Some(";"), Some(","));
        let tuples = parse_legacy(Some("1,5 2,5;3 4"), separators).unwrap();
        assert_eq!(tuples, vec![vec![1.5, 2.5], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_current_regroups_by_dimension() {
        let text = Some("1 2 3 4 5 6");
        assert_eq!(
            parse_coordinates(text, Dialect::Current, 2).unwrap(),
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]
        );
        assert_eq!(
            parse_coordinates(text, Dialect::Current, 3).unwrap(),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn test_non_numeric_and_absent_text_fail() {
        assert!(matches!(
            parse_coordinates(Some("1 two"), Dialect::Current, 2),
            Err(GmlError::InvalidCoordinateText(_))
        ));
        assert!(matches!(
            parse_coordinates(None, Dialect::Legacy, 2),
            Err(GmlError::InvalidCoordinateText(_))
        ));
        assert!(matches!(
            parse_coordinates(Some("   "), Dialect::Current, 2),
            Err(GmlError::InvalidCoordinateText(_))
        ));
    }

    #[test]
    fn test_current_rejects_partial_tuple() {
        let err = parse_coordinates(Some("1 2 3 4 5"), Dialect::Current, 2).unwrap_err();
        assert!(matches!(err, GmlError::InvalidCoordinateText(m) if m.contains("5 values")));
    }

    #[test]
    fn test_to_tuples_is_idempotent_on_nested_data() {
        let nested = vec![vec![1.0, 2.0, 3.0]];
        assert_eq!(
            to_tuples(CoordinateData::Nested(nested.clone()), 2),
            nested
        );
    }

    #[test]
    fn test_to_tuples_drops_trailing_partial_group() {
        let tuples = to_tuples(CoordinateData::Flat(vec![1.0, 2.0, 3.0, 4.0, 5.0]), 2);
        assert_eq!(tuples, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_to_tuples_reconstructs_flattened_tuples() {
        for dimension in [2usize, 3] {
            let tuples: Vec<Position> = (0..5)
                .map(|i| (0..dimension).map(|d| (i * 10 + d) as f64 + 0.5).collect())
                .collect();
            let rebuilt = to_tuples(CoordinateData::Flat(flatten(&tuples)), dimension);
            assert_eq!(rebuilt, tuples);
        }
    }

    #[test]
    fn test_format_both_dialects() {
        let tuples = vec![vec![10.0, 20.5], vec![-1.0, 0.25]];
        assert_eq!(format_coordinates(&tuples, Dialect::Legacy), "10,20.5 -1,0.25");
        assert_eq!(format_coordinates(&tuples, Dialect::Current), "10 20.5 -1 0.25");
        assert_eq!(format_position(&[1.0, 2.0, 3.0]), "1 2 3");
    }
}
