//! Generic XML document tree
//!
//! Elements that carry nothing but text collapse to [`Node::Scalar`]; anything
//! with attributes or child elements becomes an [`Element`] whose children are
//! grouped by tag name (first-seen order) while document order is kept on the
//! side for readers that need it.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(String),
    Element(Element),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<(String, Vec<Node>)>,
    pub text: String,
    /// (group index, index within group) for every child in document order
    order: Vec<(usize, usize)>,
}

impl Node {
    /// Text content of the node, trimmed
    pub fn text(&self) -> &str {
        match self {
            Node::Scalar(text) => text.trim(),
            Node::Element(element) => element.text.trim(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Scalar(_) => None,
            Node::Element(element) => element.attributes.get(name).map(String::as_str),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Scalar(_) => None,
        }
    }

    /// Children named `name`; scalars have none
    pub fn children_named(&self, name: &str) -> &[Node] {
        match self {
            Node::Element(element) => element.children_named(name),
            Node::Scalar(_) => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children_named(name).first()
    }

    /// Children in document order, with their tag names
    pub fn iter_children(&self) -> Vec<(&str, &Node)> {
        match self {
            Node::Element(element) => element.iter_children(),
            Node::Scalar(_) => Vec::new(),
        }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn children_named(&self, name: &str) -> &[Node] {
        self.children
            .iter()
            .find(|(child_name, _)| child_name == name)
            .map(|(_, nodes)| nodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children_named(name).first()
    }

    pub fn has_child(&self, name: &str) -> bool {
        !self.children_named(name).is_empty()
    }

    /// Trimmed text of the first child called `name`
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Node::text)
    }

    pub fn iter_children(&self) -> Vec<(&str, &Node)> {
        self.order
            .iter()
            .filter_map(|&(group, index)| {
                let (name, nodes) = self.children.get(group)?;
                nodes.get(index).map(|node| (name.as_str(), node))
            })
            .collect()
    }

    pub fn push_child(&mut self, name: impl Into<String>, node: Node) {
        let name = name.into();
        let group = match self.children.iter().position(|(n, _)| *n == name) {
            Some(group) => group,
            None => {
                self.children.push((name, Vec::new()));
                self.children.len() - 1
            }
        };
        self.children[group].1.push(node);
        self.order.push((group, self.children[group].1.len() - 1));
    }

    fn into_node(self) -> Node {
        if self.attributes.is_empty() && self.children.is_empty() {
            Node::Scalar(self.text)
        } else {
            Node::Element(self)
        }
    }
}

/// Project a node's attributes into a flat map, filling absent keys from `defaults`
pub fn extract_attributes(node: &Node, defaults: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut attributes: BTreeMap<String, String> = defaults
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    if let Node::Element(element) = node {
        for (key, value) in &element.attributes {
            attributes.insert(key.clone(), value.clone());
        }
    }
    attributes
}

/// Parse an XML document and return its root element.
///
/// The root is always returned as an [`Element`], even when it carries only text.
pub fn parse_document(bytes: &[u8], source: &str) -> Result<Element> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| Error::manifest(source, format!("not valid UTF-8: {}", e)))?;
    let content = content.trim_start_matches('\u{feff}');

    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::manifest(
                source,
                format!("malformed XML at byte {}: {}", reader.buffer_position(), e),
            )
        })?;

        match event {
            Event::Start(start) => {
                stack.push(open_element(&start, source)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start, source)?;
                close_element(element, &mut stack, &mut root, source)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::manifest(source, format!("bad text content: {}", e)))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::manifest(source, "unbalanced closing tag"))?;
                close_element(element, &mut stack, &mut root, source)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::manifest(source, "unexpected end of document"));
    }
    root.ok_or_else(|| Error::manifest(source, "document has no root element"))
}

fn open_element(start: &BytesStart, source: &str) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::manifest(source, format!("bad attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::manifest(source, format!("bad attribute value: {}", e)))?;
        element.attributes.insert(key, value.into_owned());
    }
    Ok(element)
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
    source: &str,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            let name = element.name.clone();
            parent.push_child(name, element.into_node());
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(Error::manifest(source, "more than one root element")),
    }
}
