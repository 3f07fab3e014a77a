//! Line-based XML assembly.
//!
//! Every element is emitted as whole lines of `(level, text)`. A nested
//! fragment produced by a sub-generator is spliced under its parent by
//! shifting all of its lines one level deeper, so sub-generators never need
//! to know where they end up.

use quick_xml::escape::escape;

use super::GeneratorOptions;
use crate::error::{GmlError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Line {
    level: usize,
    text: String,
}

/// A start tag under construction.
#[derive(Clone, Debug)]
pub(crate) struct Tag {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Tag {
    /// A tag for a caller-supplied name, rejected unless it is an XML name.
    pub fn checked(name: &str) -> Result<Self> {
        if is_xml_name(name) {
            Ok(Self::new(name))
        } else {
            Err(GmlError::InvalidElementName(name.to_string()))
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn attr_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn render_attributes(&self) -> String {
        self.attributes
            .iter()
            .map(|(k, v)| format!(" {k}=\"{}\"", escape(v.as_str())))
            .collect()
    }

    fn start(&self) -> String {
        format!("<{}{}>", self.name, self.render_attributes())
    }

    fn empty(&self) -> String {
        format!("<{}{}/>", self.name, self.render_attributes())
    }
}

/// An ordered list of indented lines forming complete elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Fragment {
    lines: Vec<Line>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, level: usize, text: String) {
        self.lines.push(Line { level, text });
    }

    pub fn open(&mut self, level: usize, tag: &Tag) {
        self.push(level, tag.start());
    }

    pub fn close(&mut self, level: usize, name: &str) {
        self.push(level, format!("</{name}>"));
    }

    pub fn empty(&mut self, level: usize, tag: &Tag) {
        self.push(level, tag.empty());
    }

    /// `<tag>text</tag>` on one line; `text` is escaped.
    pub fn leaf(&mut self, level: usize, tag: &Tag, text: &str) {
        let line = format!("{}{}</{}>", tag.start(), escape(text), tag.name);
        self.push(level, line);
    }

    /// Append `child` with every line one level below `parent_level`.
    pub fn splice(&mut self, parent_level: usize, child: Fragment) {
        for line in child.lines {
            self.push(parent_level + 1 + line.level, line.text);
        }
    }

    /// Add namespace declarations to the outermost start tag.
    pub fn declare_namespaces(&mut self, declarations: &[(&str, &str)]) {
        let Some(first) = self.lines.first_mut() else {
            return;
        };
        let insert_at = first
            .text
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(first.text.len());
        let attributes: String = declarations
            .iter()
            .map(|(prefix, uri)| format!(" xmlns:{prefix}=\"{uri}\""))
            .collect();
        first.text.insert_str(insert_at, &attributes);
    }

    pub fn render(&self, options: &GeneratorOptions) -> String {
        let mut out = String::new();
        if options.xml_declaration {
            out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            if options.pretty {
                out.push('\n');
            }
        }
        for line in &self.lines {
            if options.pretty {
                out.push_str(&options.indent(line.level));
                out.push_str(&line.text);
                out.push('\n');
            } else {
                out.push_str(&line.text);
            }
        }
        out
    }
}

/// An optional prefix and a local part, each starting with a letter or `_`
/// and continuing with letters, digits, `-`, `.` or `_`.
fn is_xml_name(name: &str) -> bool {
    let is_part = |part: &str| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_'))
    };
    match name.split_once(':') {
        Some((prefix, local)) => is_part(prefix) && is_part(local),
        None => is_part(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_tag_names() {
        for name in ["name", "app:road_class", "_id", "höhe", "v1.2-b"] {
            assert!(Tag::checked(name).is_ok(), "{name} rejected");
        }
        for name in ["my key", "1st", "", "a:b:c", ":x", "x:", "a<b"] {
            assert!(
                matches!(Tag::checked(name), Err(GmlError::InvalidElementName(n)) if n == name),
                "{name} accepted"
            );
        }
    }

    #[test]
    fn test_splice_reindents_child() {
        let mut child = Fragment::new();
        child.open(0, &Tag::new("b"));
        child.leaf(1, &Tag::new("c"), "x");
        child.close(0, "b");

        let mut parent = Fragment::new();
        parent.open(0, &Tag::new("a"));
        parent.splice(0, child);
        parent.close(0, "a");

        let pretty = parent.render(&GeneratorOptions::default());
        assert_eq!(pretty, "<a>\n  <b>\n    <c>x</c>\n  </b>\n</a>\n");
        let compact = parent.render(&GeneratorOptions::default().with_pretty(false));
        assert_eq!(compact, "<a><b><c>x</c></b></a>");
    }

    #[test]
    fn test_text_and_attributes_are_escaped() {
        let mut fragment = Fragment::new();
        fragment.leaf(0, &Tag::new("name").attr("title", "\"q\" & 'a'"), "<b> & c");
        let out = fragment.render(&GeneratorOptions::default().with_pretty(false));
        assert_eq!(
            out,
            "<name title=\"&quot;q&quot; &amp; &apos;a&apos;\">&lt;b&gt; &amp; c</name>"
        );
    }

    #[test]
    fn test_declare_namespaces_on_root() {
        let mut fragment = Fragment::new();
        fragment.empty(0, &Tag::new("gml:Point"));
        fragment.declare_namespaces(&[("gml", "urn:g")]);
        let out = fragment.render(&GeneratorOptions::default().with_pretty(false));
        assert_eq!(out, r#"<gml:Point xmlns:gml="urn:g"/>"#);
    }
}
