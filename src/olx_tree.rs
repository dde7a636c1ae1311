//! Order-preserving OLX document tree.
//!
//! One `quick-xml` pass produces one tree. The grouped-by-tag view that
//! some extraction rules need is derived from the same tree through the
//! read-only lookup helpers (`children_named`, `first_child_named`), so
//! the two shapes can never disagree about the source.
//!
//! Text nodes and attribute values are stored in their raw, still-escaped
//! source form and written back verbatim, so entities and whitespace
//! survive a parse/serialize round trip.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{BuildError, StructuralParseError};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        }
    }

    pub fn is_whitespace_text(&self) -> bool {
        match self {
            XmlNode::Text(t) => t.trim().is_empty(),
            XmlNode::Element(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    /// Attribute name/value pairs in source order, values raw (escaped).
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        XmlElement {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Raw (still-escaped) attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value with entities decoded, for semantic reads.
    pub fn attr_unescaped(&self, name: &str) -> Option<String> {
        self.attr(name).map(unescape_value)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes.push((name.to_string(), value.to_string()));
    }

    pub fn push_element(&mut self, el: XmlElement) {
        self.children.push(XmlNode::Element(el));
    }

    pub fn push_text(&mut self, text: &str) {
        self.children.push(XmlNode::Text(text.to_string()));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements().filter(move |el| el.name == name)
    }

    pub fn first_child_named(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    pub fn has_child_named(&self, name: &str) -> bool {
        self.first_child_named(name).is_some()
    }

    /// Concatenated direct text children, entities decoded.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            if let XmlNode::Text(t) = child {
                text.push_str(&unescape_value(t));
            }
        }
        text
    }

    /// Text of the whole subtree, entities decoded. Used for heuristics
    /// that look at the wording of a node regardless of inline markup.
    pub fn deep_text(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(t) => text.push_str(&unescape_value(t)),
                XmlNode::Element(el) => text.push_str(&el.deep_text()),
            }
        }
        text
    }

    pub fn contains_tag(&self, name: &str) -> bool {
        self.child_elements()
            .any(|el| el.name == name || el.contains_tag(name))
    }
}

fn unescape_value(raw: &str) -> String {
    match quick_xml::escape::unescape(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Escape plain text for embedding as a text node.
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape plain text for embedding as a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

fn element_from_start(e: &BytesStart) -> Result<XmlElement, StructuralParseError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| StructuralParseError::Malformed(err.to_string()))?
        .to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| StructuralParseError::Malformed(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| StructuralParseError::Malformed(err.to_string()))?
            .to_string();
        let value = std::str::from_utf8(&attr.value)
            .map_err(|err| StructuralParseError::Malformed(err.to_string()))?
            .to_string();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn parse_nodes(input: &str) -> Result<Vec<XmlNode>, StructuralParseError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut top_level: Vec<XmlNode> = Vec::new();

    fn attach(node: XmlNode, stack: &mut [XmlElement], top_level: &mut Vec<XmlNode>) {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        } else {
            top_level.push(node);
        }
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element_from_start(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let el = element_from_start(&e)?;
                attach(XmlNode::Element(el), &mut stack, &mut top_level);
            }
            Ok(Event::End(_)) => {
                // Mismatched end tags are rejected by the reader itself.
                if let Some(el) = stack.pop() {
                    attach(XmlNode::Element(el), &mut stack, &mut top_level);
                }
            }
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref())
                    .map_err(|err| StructuralParseError::Malformed(err.to_string()))?;
                attach(XmlNode::Text(raw.to_string()), &mut stack, &mut top_level);
            }
            Ok(Event::CData(e)) => {
                let raw = std::str::from_utf8(e.as_ref())
                    .map_err(|err| StructuralParseError::Malformed(err.to_string()))?;
                attach(XmlNode::Text(raw.to_string()), &mut stack, &mut top_level);
            }
            Ok(Event::Decl(_)) | Ok(Event::Comment(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(StructuralParseError::Malformed(format!(
                    "XML parse error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    if !stack.is_empty() {
        return Err(StructuralParseError::Malformed(
            "unclosed element at end of input".to_string(),
        ));
    }
    Ok(top_level)
}

/// Parse a full OLX document; the single root element is returned.
pub fn parse_document(olx: &str) -> Result<XmlElement, StructuralParseError> {
    let nodes = parse_nodes(olx)?;
    let mut root = None;
    for node in nodes {
        match node {
            XmlNode::Element(el) => {
                if root.is_some() {
                    return Err(StructuralParseError::Malformed(
                        "multiple root elements".to_string(),
                    ));
                }
                root = Some(el);
            }
            XmlNode::Text(t) => {
                if !t.trim().is_empty() {
                    return Err(StructuralParseError::Malformed(
                        "text outside the root element".to_string(),
                    ));
                }
            }
        }
    }
    root.ok_or_else(|| StructuralParseError::Malformed("no root element".to_string()))
}

/// Parse a markup fragment (question text, feedback, hint bodies) into a
/// node list. Fragments may mix text and elements at the top level.
pub fn parse_fragment(fragment: &str) -> Result<Vec<XmlNode>, BuildError> {
    parse_nodes(fragment).map_err(|e| BuildError::MalformedFragment(e.to_string()))
}

pub fn serialize_element(el: &XmlElement) -> String {
    let mut out = String::new();
    write_element(el, &mut out);
    out
}

pub fn serialize_nodes(nodes: &[XmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

/// Serialize the children of an element, without the element's own tags.
pub fn serialize_children(el: &XmlElement) -> String {
    serialize_nodes(&el.children)
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Element(el) => write_element(el, out),
        XmlNode::Text(t) => out.push_str(t),
    }
}

fn write_element(el: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }
    out.push('>');
    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}
