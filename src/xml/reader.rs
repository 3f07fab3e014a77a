//! quick-xml backed tree reader with namespace resolution.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::element::{XmlAttribute, XmlElement};
use crate::error::{GmlError, Result};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Name of a document's root element, read without building a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootName {
    pub name: String,
    pub local_name: String,
    pub namespace: Option<String>,
}

/// Parse a whole document into an element tree.
///
/// Returns `Ok(None)` when the document has no root element at all.
pub fn parse_document(xml: &str) -> Result<Option<XmlElement>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut builder = TreeBuilder::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => builder.open(e)?,
            Ok(Event::Empty(ref e)) => {
                // Self-closing element - handle as start + end
                builder.open(e)?;
                builder.close();
            }
            Ok(Event::End(_)) => builder.close(),
            Ok(Event::Text(ref t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| GmlError::xml(format!("Text error: {e}")))?;
                builder.text(&text);
            }
            Ok(Event::CData(ref c)) => builder.text(&String::from_utf8_lossy(c)),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GmlError::xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = builder.stack.last() {
        return Err(GmlError::xml(format!(
            "Unexpected end of document inside <{}>",
            open.name
        )));
    }

    Ok(builder.root)
}

/// Read only the root element's name and namespace.
///
/// Used to classify a document (e.g. exception reports) before paying for
/// a full tree. Only declarations on the root itself are considered.
pub fn read_root_name(xml: &str) -> Result<Option<RootName>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let mut builder = TreeBuilder::default();
                builder.open(e)?;
                let root = builder.stack.pop().unwrap_or_default();
                return Ok(Some(RootName {
                    name: root.name,
                    local_name: root.local_name,
                    namespace: root.namespace,
                }));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => {
                return Err(GmlError::xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Incremental tree construction state.
#[derive(Default)]
struct TreeBuilder {
    /// Open elements, innermost last.
    stack: Vec<XmlElement>,
    /// Completed root element.
    root: Option<XmlElement>,
}

impl TreeBuilder {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let name = decode(e.name().as_ref())?;

        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr =
                attr_result.map_err(|e| GmlError::xml(format!("Attribute error: {e}")))?;
            let key = decode(attr.key.as_ref())?;
            let value = attr
                .unescape_value()
                .map_err(|e| GmlError::xml(format!("Attribute value error: {e}")))?
                .into_owned();

            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((key, value));
            }
        }

        let (prefix, local_name) = split_qname(&name);
        // Default namespace applies to unprefixed elements only.
        let namespace = self.resolve(&declarations, prefix.unwrap_or(""));
        let attributes = raw_attributes
            .into_iter()
            .map(|(key, value)| {
                let (prefix, local) = split_qname(&key);
                XmlAttribute {
                    namespace: prefix.and_then(|p| self.resolve(&declarations, p)),
                    local_name: local.to_string(),
                    name: key,
                    value,
                }
            })
            .collect();

        self.stack.push(XmlElement {
            local_name: local_name.to_string(),
            name,
            namespace,
            attributes,
            namespace_declarations: declarations,
            children: Vec::new(),
            text: String::new(),
        });
        Ok(())
    }

    fn close(&mut self) {
        let Some(element) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if self.root.is_none() {
                    self.root = Some(element);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(current) = self.stack.last_mut() {
            if !current.text.is_empty() {
                current.text.push(' ');
            }
            current.text.push_str(text);
        }
    }

    /// Resolve `prefix` against the declarations of the element being opened
    /// and then every open ancestor.
    fn resolve(&self, own: &[(String, String)], prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE.to_string());
        }
        std::iter::once(own)
            .chain(
                self.stack
                    .iter()
                    .rev()
                    .map(|el| el.namespace_declarations.as_slice()),
            )
            .flat_map(|decls| decls.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn decode(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| GmlError::xml(format!("Invalid UTF-8 in name: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolves_prefixes_in_scope() {
        let xml = r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0"
                        xmlns:gml="http://www.opengis.net/gml/3.2">
            <wfs:member><app:Road xmlns:app="urn:app" gml:id="r1"><app:name>Main</app:name></app:Road></wfs:member>
        </wfs:FeatureCollection>"#;
        let root = parse_document(xml).unwrap().unwrap();
        assert_eq!(root.local_name, "FeatureCollection");
        assert_eq!(root.namespace.as_deref(), Some("http://www.opengis.net/wfs/2.0"));

        let road = root.child("member").unwrap().first_child().unwrap();
        assert_eq!(road.namespace.as_deref(), Some("urn:app"));
        assert_eq!(road.gml_id(), Some("r1"));
        assert!(!road.is_gml());
        assert_eq!(road.child("name").unwrap().text_content(), Some("Main"));
    }

    #[test]
    fn test_default_namespace_and_unbound_prefix() {
        let root = parse_document(r#"<Point xmlns="http://www.opengis.net/gml"><pos>1 2</pos></Point>"#)
            .unwrap()
            .unwrap();
        assert!(root.is_gml());
        assert!(root.child("pos").unwrap().is_gml());

        let bare = parse_document("<gml:Point><gml:pos>1 2</gml:pos></gml:Point>")
            .unwrap()
            .unwrap();
        assert_eq!(bare.namespace, None);
        assert!(bare.is_gml());
    }

    #[test]
    fn test_text_is_unescaped_and_cdata_kept() {
        let root = parse_document("<a><b>x &amp; y</b><c><![CDATA[<raw>]]></c></a>")
            .unwrap()
            .unwrap();
        assert_eq!(root.child("b").unwrap().text, "x & y");
        assert_eq!(root.child("c").unwrap().text, "<raw>");
    }

    #[test]
    fn test_empty_document_has_no_root() {
        assert_eq!(parse_document("<?xml version=\"1.0\"?>").unwrap(), None);
        assert_eq!(parse_document("").unwrap(), None);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(matches!(parse_document("<a><b></a>"), Err(GmlError::Xml(_))));
    }

    #[test]
    fn test_read_root_name() {
        let root = read_root_name(
            r#"<?xml version="1.0"?><ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1"/>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(root.local_name, "ExceptionReport");
        assert_eq!(root.namespace.as_deref(), Some("http://www.opengis.net/ows/1.1"));
    }
}
