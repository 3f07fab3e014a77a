//! Owned element tree nodes.

use crate::base::constants::namespace;

/// A resolved attribute on an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Qualified name as written (`gml:id`, `srsName`).
    pub name: String,
    /// Name without prefix.
    pub local_name: String,
    /// Namespace URI; unprefixed attributes have none.
    pub namespace: Option<String>,
    /// Unescaped value.
    pub value: String,
}

impl XmlAttribute {
    /// Prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }
}

/// An element with its attributes, child elements and concatenated text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written.
    pub name: String,
    /// Name without prefix.
    pub local_name: String,
    /// Resolved namespace URI, `None` if the prefix is unbound.
    pub namespace: Option<String>,
    /// Attributes other than namespace declarations, in document order.
    pub attributes: Vec<XmlAttribute>,
    /// `xmlns` declarations made on this element as (prefix, uri);
    /// the default namespace has an empty prefix.
    pub namespace_declarations: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Trimmed character data directly inside this element.
    pub text: String,
}

impl XmlElement {
    /// Prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// True for elements in either GML namespace.
    ///
    /// An unbound `gml:` prefix also counts, so bare fragments without
    /// namespace declarations are still recognised.
    pub fn is_gml(&self) -> bool {
        match self.namespace.as_deref() {
            Some(uri) => is_gml_namespace(uri),
            None => self.prefix() == Some("gml"),
        }
    }

    /// Value of the first attribute with this local name, in any namespace.
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// The `gml:id` attribute.
    pub fn gml_id(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == "id" && is_gml_attribute(a))
            .map(|a| a.value.as_str())
    }

    /// First child element with this local name.
    pub fn child(&self, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name == local_name)
    }

    /// All child elements with this local name, in document order.
    pub fn children_named<'a>(
        &'a self,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.local_name == local_name)
    }

    /// First child element of any name.
    pub fn first_child(&self) -> Option<&XmlElement> {
        self.children.first()
    }

    /// Trimmed text content, `None` when empty.
    pub fn text_content(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Depth-first search over descendants (excluding `self`).
    pub fn find_descendant<P>(&self, predicate: &P) -> Option<&XmlElement>
    where
        P: Fn(&XmlElement) -> bool,
    {
        for child in &self.children {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(predicate) {
                return Some(found);
            }
        }
        None
    }
}

/// True if `uri` is the GML 2/3.1 or GML 3.2 namespace.
pub fn is_gml_namespace(uri: &str) -> bool {
    matches!(
        uri.trim_end_matches('/'),
        namespace::GML_LEGACY | namespace::GML_32
    )
}

fn is_gml_attribute(attr: &XmlAttribute) -> bool {
    match attr.namespace.as_deref() {
        Some(uri) => is_gml_namespace(uri),
        None => attr.prefix() == Some("gml"),
    }
}
