//! OWS ExceptionReport detection and decoding.
//!
//! Services answer failed requests with an exception report instead of
//! GML. These documents are protocol-valid, so they are recognised before
//! GML parsing and surfaced as a structured [`GmlError::OwsException`].
//!
//! ```xml
//! <ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
//!   <ows:Exception exceptionCode="InvalidParameterValue" locator="typeName">
//!     <ows:ExceptionText>Unknown feature type</ows:ExceptionText>
//!   </ows:Exception>
//! </ows:ExceptionReport>
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GmlError, Result};
use crate::xml::{XmlElement, parse_document, read_root_name};

/// Root names treated as exception reports.
const REPORT_ELEMENTS: &[&str] = &["ExceptionReport", "ServiceExceptionReport"];

/// One exception inside a report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwsExceptionEntry {
    pub code: String,
    pub locator: Option<String>,
    /// Message lines in document order.
    pub messages: Vec<String>,
}

/// A decoded exception report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwsExceptionReport {
    pub version: Option<String>,
    pub exceptions: Vec<OwsExceptionEntry>,
}

impl fmt::Display for OwsExceptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OWS exception report")?;
        if let Some(version) = &self.version {
            write!(f, " (version {version})")?;
        }
        write!(f, ":")?;
        for (i, entry) in self.exceptions.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, " [{}]", entry.code)?;
            if let Some(locator) = &entry.locator {
                write!(f, " at {locator}")?;
            }
            if !entry.messages.is_empty() {
                write!(f, " {}", entry.messages.join(" "))?;
            }
        }
        Ok(())
    }
}

/// True if the document's root is an exception report, with or without a
/// namespace prefix.
///
/// Malformed or empty documents are not exception reports.
pub fn is_ows_exception_report(xml: &str) -> bool {
    matches!(
        read_root_name(xml),
        Ok(Some(root)) if REPORT_ELEMENTS.contains(&root.local_name.as_str())
    )
}

/// Decode an exception report document.
pub fn parse_exception_report(xml: &str) -> Result<OwsExceptionReport> {
    let root = parse_document(xml)?.ok_or(GmlError::NoGmlRootFound)?;
    if !is_report_root(&root) {
        return Err(GmlError::xml(format!(
            "expected an exception report, found <{}>",
            root.name
        )));
    }
    Ok(decode_exception_report(&root))
}

pub(crate) fn is_report_root(root: &XmlElement) -> bool {
    REPORT_ELEMENTS.contains(&root.local_name.as_str())
}

/// Decode an already parsed report root.
pub(crate) fn decode_exception_report(root: &XmlElement) -> OwsExceptionReport {
    let exceptions = root
        .children
        .iter()
        .filter(|c| c.local_name == "Exception" || c.local_name == "ServiceException")
        .map(decode_entry)
        .collect();

    OwsExceptionReport {
        version: root.attr("version").map(str::to_string),
        exceptions,
    }
}

fn decode_entry(element: &XmlElement) -> OwsExceptionEntry {
    let code = element
        .attr("exceptionCode")
        .or_else(|| element.attr("code"))
        .unwrap_or("NoApplicableCode")
        .to_string();

    let mut messages: Vec<String> = element
        .children_named("ExceptionText")
        .filter_map(XmlElement::text_content)
        .map(str::to_string)
        .collect();
    // ServiceException carries its message as direct text.
    if messages.is_empty() {
        messages.extend(element.text_content().map(str::to_string));
    }

    OwsExceptionEntry {
        code,
        locator: element.attr("locator").map(str::to_string),
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="typeName">
    <ows:ExceptionText>Unknown feature type</ows:ExceptionText>
    <ows:ExceptionText>roads:missing</ows:ExceptionText>
  </ows:Exception>
  <ows:Exception exceptionCode="NoApplicableCode"/>
</ows:ExceptionReport>"#;

    #[test]
    fn test_detects_prefixed_and_unprefixed_reports() {
        assert!(is_ows_exception_report(REPORT));
        assert!(is_ows_exception_report(
            r#"<ExceptionReport version="1.1.0"><Exception exceptionCode="X"/></ExceptionReport>"#
        ));
        assert!(!is_ows_exception_report(
            "<gml:Point><gml:pos>10 20</gml:pos></gml:Point>"
        ));
        assert!(!is_ows_exception_report(""));
    }

    #[test]
    fn test_decodes_every_exception() {
        let report = parse_exception_report(REPORT).unwrap();
        assert_eq!(report.version.as_deref(), Some("2.0.0"));
        assert_eq!(report.exceptions.len(), 2);

        let first = &report.exceptions[0];
        assert_eq!(first.code, "InvalidParameterValue");
        assert_eq!(first.locator.as_deref(), Some("typeName"));
        assert_eq!(first.messages, vec!["Unknown feature type", "roads:missing"]);

        assert_eq!(report.exceptions[1].code, "NoApplicableCode");
        assert!(report.exceptions[1].messages.is_empty());
    }

    #[test]
    fn test_message_concatenates_codes_and_text() {
        let report = parse_exception_report(REPORT).unwrap();
        let message = GmlError::OwsException(report).to_string();
        assert_eq!(
            message,
            "OWS exception report (version 2.0.0): [InvalidParameterValue] at typeName \
             Unknown feature type roads:missing; [NoApplicableCode]"
        );
    }

    #[test]
    fn test_service_exception_report() {
        let report = parse_exception_report(
            r#"<ServiceExceptionReport version="1.2.0"><ServiceException code="LayerNotDefined">No such layer</ServiceException></ServiceExceptionReport>"#,
        )
        .unwrap();
        assert_eq!(report.exceptions[0].code, "LayerNotDefined");
        assert_eq!(report.exceptions[0].messages, vec!["No such layer"]);
    }

    #[test]
    fn test_rejects_non_report_document() {
        assert!(parse_exception_report("<gml:Point/>").is_err());
    }
}
