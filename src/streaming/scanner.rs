//! Wrapper scanner over the accumulation buffer.
//!
//! Finds complete `featureMember` / `member` elements by tag text, without
//! parsing the document. Wrappers are assumed not to nest inside a
//! same-named wrapper; a nested one ends at the first matching close tag.

use crate::base::constants::{FEATURE_MEMBER, MEMBER};
use crate::xml::parse_document;

/// A complete wrapper element found in the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Wrapper {
    /// Byte offset of the `<` of the start tag.
    pub start: usize,
    /// Byte offset just past the `>` of the end tag.
    pub end: usize,
    /// Local name of the wrapper element.
    pub local_name: &'static str,
}

/// All complete wrappers in `buffer`, in buffer order.
///
/// Both wrapper families are scanned independently. A `member` that starts
/// before the furthest `featureMember` ends, or inside a `featureMember`
/// that is still incomplete, is discarded so that nothing is extracted
/// twice.
pub(crate) fn find_wrappers(buffer: &str) -> Vec<Wrapper> {
    let (legacy, legacy_pending) = scan_family(buffer, FEATURE_MEMBER);
    let legacy_end = legacy.iter().map(|w| w.end).max().unwrap_or(0);
    let (current, _) = scan_family(buffer, MEMBER);
    let current = current.into_iter().filter(|w| {
        w.start >= legacy_end && legacy_pending.is_none_or(|pending| w.start < pending)
    });

    let mut wrappers: Vec<Wrapper> = legacy.into_iter().chain(current).collect();
    wrappers.sort_by_key(|w| w.start);
    wrappers
}

/// Complete wrappers of one family, and the start of the first incomplete
/// one, if any.
fn scan_family(buffer: &str, local_name: &'static str) -> (Vec<Wrapper>, Option<usize>) {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = buffer[cursor..].find('<') {
        let start = cursor + offset;
        let Some(tag) = StartTag::at(buffer, start) else {
            break;
        };
        cursor = tag.end;

        let Some(qname) = tag.qname else {
            continue;
        };
        let local = qname.rsplit(':').next().unwrap_or(qname);
        if local != local_name || tag.self_closing {
            continue;
        }

        match find_close(buffer, tag.end, qname) {
            Some(end) => {
                found.push(Wrapper {
                    start,
                    end,
                    local_name,
                });
                cursor = end;
            }
            // Later wrappers cannot be complete before this one is.
            None => return (found, Some(start)),
        }
    }
    (found, None)
}

/// A tag starting at a `<`.
struct StartTag<'a> {
    /// Qualified name of an element start tag; `None` for end tags,
    /// comments and processing instructions.
    qname: Option<&'a str>,
    self_closing: bool,
    /// Offset just past the closing `>`.
    end: usize,
}

impl<'a> StartTag<'a> {
    /// `None` when the tag is not yet complete in the buffer.
    fn at(buffer: &'a str, start: usize) -> Option<Self> {
        let rest = &buffer[start + 1..];
        let close = rest.find('>')?;
        let end = start + 1 + close + 1;
        let body = &rest[..close];

        if body.starts_with(['/', '?', '!']) {
            return Some(Self {
                qname: None,
                self_closing: false,
                end,
            });
        }
        let name_len = body
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(body.len());
        Some(Self {
            qname: Some(&body[..name_len]).filter(|n| !n.is_empty()),
            self_closing: body.ends_with('/'),
            end,
        })
    }
}

/// Offset just past `</qname>` at or after `from`.
fn find_close(buffer: &str, from: usize, qname: &str) -> Option<usize> {
    let needle = format!("</{qname}");
    let mut cursor = from;
    loop {
        let at = cursor + buffer[cursor..].find(&needle)?;
        let after = at + needle.len();
        let rest = buffer[after..].trim_start();
        if rest.starts_with('>') {
            return Some(buffer.len() - rest.len() + 1);
        }
        // `</wfs:memberX>` or an incomplete close tag.
        if rest.is_empty() {
            return None;
        }
        cursor = after;
    }
}

/// Namespace declarations of the document's root element, once its start
/// tag is complete in `buffer`.
pub(crate) fn root_declarations(buffer: &str) -> Option<Vec<(String, String)>> {
    let mut cursor = 0;
    while let Some(offset) = buffer[cursor..].find('<') {
        let start = cursor + offset;
        let tag = StartTag::at(buffer, start)?;
        if tag.qname.is_none() {
            cursor = tag.end;
            continue;
        }
        let text = &buffer[start..tag.end];
        let standalone = if tag.self_closing {
            text.to_string()
        } else {
            format!("{}/>", &text[..text.len() - 1])
        };
        let declarations = parse_document(&standalone)
            .ok()
            .flatten()
            .map(|root| root.namespace_declarations)
            .unwrap_or_default();
        return Some(declarations);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_members_only() {
        let buffer = "<wfs:FeatureCollection><wfs:member><a/></wfs:member><wfs:member><b>";
        let wrappers = find_wrappers(buffer);
        assert_eq!(wrappers.len(), 1);
        assert_eq!(&buffer[wrappers[0].start..wrappers[0].end], "<wfs:member><a/></wfs:member>");
    }

    #[test]
    fn test_member_inside_feature_member_is_not_duplicated() {
        let buffer = "<gml:featureMember><app:T><app:member>x</app:member></app:T></gml:featureMember>";
        let wrappers = find_wrappers(buffer);
        assert_eq!(wrappers.len(), 1);
        assert_eq!(wrappers[0].local_name, "featureMember");
        assert_eq!(wrappers[0].end, buffer.len());
    }

    #[test]
    fn test_member_inside_incomplete_feature_member_waits() {
        let buffer = "<gml:featureMember><a/></gml:featureMember><gml:featureMember><app:T><app:member>x</app:member>";
        let wrappers = find_wrappers(buffer);
        assert_eq!(wrappers.len(), 1);
        assert_eq!(wrappers[0].local_name, "featureMember");
    }

    #[test]
    fn test_similar_names_are_not_wrappers() {
        let buffer = "<members><wfs:memberOf>x</wfs:memberOf></members>";
        assert!(find_wrappers(buffer).is_empty());
    }

    #[test]
    fn test_close_tag_split_across_chunks() {
        assert!(find_wrappers("<wfs:member><a/></wfs:mem").is_empty());
        assert_eq!(find_wrappers("<wfs:member><a/></wfs:member >").len(), 1);
    }

    #[test]
    fn test_root_declarations() {
        let buffer = r#"<?xml version="1.0"?><!-- c --><wfs:FeatureCollection xmlns:wfs="urn:w" xmlns:app="urn:a"><wfs:mem"#;
        let declarations = root_declarations(buffer).unwrap();
        assert_eq!(
            declarations,
            vec![
                ("wfs".to_string(), "urn:w".to_string()),
                ("app".to_string(), "urn:a".to_string())
            ]
        );
        assert_eq!(root_declarations("<wfs:FeatureCollection xmlns:wfs="), None);
    }
}
