//! Minimal namespace-aware element tree
//!
//! Midpoint documents are small enough to hold in memory, and the client only
//! needs a handful of operations on them: read attributes, walk prefixed
//! paths, find descendants and serialize a subtree back so it can be embedded
//! in another document. Names are resolved with [`quick_xml::NsReader`], so
//! an element is identified by its namespace URI and local name regardless of
//! the prefix the server chose.

use crate::error::{MidpointError, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Resolved namespace URI
    pub namespace: Option<String>,
    /// Local name, without prefix
    pub name: String,
    /// Attributes other than namespace declarations, keyed by qualified name
    pub attributes: Vec<(String, String)>,
    /// Prefixed namespace declarations in scope at this element
    pub scope: Vec<(String, String)>,
    pub children: Vec<Node>,
}

fn resolved_namespace(ns: ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    }
}

fn utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl Element {
    fn from_start(
        namespace: Option<String>,
        start: &BytesStart<'_>,
        inherited: &[(String, String)],
    ) -> Result<Self> {
        let mut attributes = Vec::new();
        let mut scope = inherited.to_vec();

        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.as_namespace_binding() {
                Some(PrefixDeclaration::Named(prefix)) => {
                    let prefix = utf8(prefix);
                    scope.retain(|(p, _)| *p != prefix);
                    scope.push((prefix, value));
                }
                // The default namespace is carried by `namespace` itself
                Some(PrefixDeclaration::Default) => {}
                None => attributes.push((utf8(attr.key.as_ref()), value)),
            }
        }

        Ok(Self {
            namespace,
            name: utf8(start.local_name().as_ref()),
            attributes,
            scope,
            children: Vec::new(),
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(namespace, name))
    }

    /// Concatenated direct text content, trimmed
    pub fn text(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                text.push_str(t);
            }
        }
        text.trim().to_string()
    }

    /// All descendants (depth-first, document order) with the given name
    pub fn descendants_named<'a>(
        &'a self,
        namespace: Option<&str>,
        name: &str,
    ) -> Vec<&'a Element> {
        let mut found = Vec::new();
        for child in self.child_elements() {
            if child.is(namespace, name) {
                found.push(child);
            }
            found.extend(child.descendants_named(namespace, name));
        }
        found
    }

    /// Walk a relative `prefix:name/prefix:name` path.
    ///
    /// Prefixes are looked up in `prefixes`; an unprefixed step matches
    /// elements without a namespace.
    pub fn select<'a>(&'a self, path: &str, prefixes: &[(&str, &str)]) -> Vec<&'a Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            let (namespace, name) = match step.split_once(':') {
                Some((prefix, name)) => {
                    let uri = prefixes.iter().find(|(p, _)| *p == prefix).map(|(_, u)| *u);
                    match uri {
                        Some(uri) => (Some(uri), name),
                        None => return Vec::new(),
                    }
                }
                None => (None, step),
            };
            current = current
                .into_iter()
                .flat_map(|e| e.child_elements().filter(move |c| c.is(namespace, name)))
                .collect();
        }
        current
    }

    /// Serialize this element as a standalone fragment.
    ///
    /// Every prefixed declaration in scope is repeated on the fragment root so
    /// qualified attribute values such as `xsi:type="c:RoleType"` stay valid
    /// once the fragment is embedded elsewhere.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out, None);
        out
    }

    fn write_into(&self, out: &mut String, parent: Option<(Option<&str>, &[(String, String)])>) {
        out.push('<');
        out.push_str(&self.name);

        let (parent_ns, parent_scope) = match parent {
            Some((ns, scope)) => (ns, scope),
            None => (None, &[][..]),
        };
        let declare_default = match parent {
            Some(_) => self.namespace.as_deref() != parent_ns,
            None => self.namespace.is_some(),
        };
        if declare_default {
            out.push_str(&format!(
                " xmlns=\"{}\"",
                escape(self.namespace.as_deref().unwrap_or(""))
            ));
        }
        for (prefix, uri) in &self.scope {
            if !parent_scope.iter().any(|(p, u)| p == prefix && u == uri) {
                out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(uri.as_str())));
            }
        }
        for (key, value) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                Node::Element(e) => {
                    e.write_into(out, Some((self.namespace.as_deref(), self.scope.as_slice())))
                }
                Node::Text(t) => out.push_str(&escape(t.as_str())),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Parse a document and return its root element
pub fn parse(document: &[u8]) -> Result<Element> {
    let text = std::str::from_utf8(document)
        .map_err(|e| MidpointError::MalformedDocument(format!("document is not UTF-8: {e}")))?;

    // Text is kept verbatim; re-serialized fragments must not alter content
    let mut reader = NsReader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let namespace = resolved_namespace(ns);
        match event {
            Event::Start(e) => {
                let inherited = stack.last().map(|p| p.scope.as_slice()).unwrap_or(&[]);
                let element = Element::from_start(namespace, &e, inherited)?;
                stack.push(element);
            }
            Event::Empty(e) => {
                let inherited = stack.last().map(|p| p.scope.as_slice()).unwrap_or(&[]);
                let element = Element::from_start(namespace, &e, inherited)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    MidpointError::MalformedDocument("unbalanced end tag".to_string())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(e.unescape()?.into_owned()));
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(utf8(&e.into_inner())));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(MidpointError::MalformedDocument(format!(
            "unclosed element <{}>",
            stack[stack.len() - 1].name
        )));
    }
    root.ok_or_else(|| MidpointError::MalformedDocument("no root element".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(MidpointError::MalformedDocument(
            "more than one root element".to_string(),
        ));
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: &str = "urn:common";
    const A: &str = "urn:api";

    #[test]
    fn test_parse_resolves_namespaces() {
        let doc = br#"<c:role xmlns:c="urn:common" oid="r1"><c:name>role01</c:name></c:role>"#;
        let root = parse(doc).unwrap();
        assert!(root.is(Some(C), "role"));
        assert_eq!(root.attribute("oid"), Some("r1"));
        assert_eq!(root.child(Some(C), "name").unwrap().text(), "role01");
    }

    #[test]
    fn test_default_namespace_applies_to_children() {
        let doc = br#"<role xmlns="urn:common"><name>r</name></role>"#;
        let root = parse(doc).unwrap();
        assert!(root.child(Some(C), "name").is_some());
        assert!(root.child(None, "name").is_none());
    }

    #[test]
    fn test_select_path() {
        let doc = br#"<systemConfiguration xmlns="urn:common">
            <logging>
                <classLogger id="1"><package>a</package></classLogger>
                <classLogger id="2"><package>b</package></classLogger>
            </logging>
        </systemConfiguration>"#;
        let root = parse(doc).unwrap();
        let loggers = root.select("c:logging/c:classLogger", &[("c", C)]);
        assert_eq!(loggers.len(), 2);
        assert_eq!(loggers[1].attribute("id"), Some("2"));
        assert!(root.select("x:logging", &[("c", C)]).is_empty());
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = br#"<a xmlns="urn:common"><b><s>1</s></b><s>2</s></a>"#;
        let root = parse(doc).unwrap();
        let found: Vec<String> = root
            .descendants_named(Some(C), "s")
            .iter()
            .map(|e| e.text())
            .collect();
        assert_eq!(found, vec!["1", "2"]);
    }

    #[test]
    fn test_fragment_keeps_namespaces() {
        let doc = br#"<apti:objectListType xmlns:apti="urn:api" xmlns:c="urn:common">
            <apti:object oid="r1" type="c:RoleType"><c:name>x &amp; y</c:name></apti:object>
        </apti:objectListType>"#;
        let root = parse(doc).unwrap();
        let object = root.child(Some(A), "object").unwrap();
        let fragment = object.to_xml_string();

        assert!(fragment.contains("xmlns:c=\"urn:common\""));
        assert!(fragment.contains("x &amp; y"));

        let reparsed = parse(fragment.as_bytes()).unwrap();
        assert!(reparsed.is(Some(A), "object"));
        assert_eq!(reparsed.attribute("oid"), Some("r1"));
        assert_eq!(reparsed.child(Some(C), "name").unwrap().text(), "x & y");
    }

    #[test]
    fn test_fragment_keeps_text_verbatim() {
        let doc = b"<widget xmlns=\"urn:common\">\n  <label>  Padded label  </label>\n  <code>\n    return 1\n</code>\n</widget>";
        let root = parse(doc).unwrap();
        assert_eq!(root.child(Some(C), "label").unwrap().text(), "Padded label");

        let fragment = root.to_xml_string();
        assert!(fragment.contains("<label>  Padded label  </label>"));
        assert!(fragment.contains("<code>\n    return 1\n</code>"));
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse(b"<a><b></a>").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"<a>").is_err());
    }
}
