//! Minimal owned XML tree used for layer persistence.
//!
//! Elements are detached values: a document hands out new elements through
//! [`XmlDocument::create_element`], callers fill them in and append them to a
//! parent. Parsing and serialization go through quick-xml.

use std::fmt::Display;
use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XmlError;

// =============================================================================
// Element
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute, replacing any existing value under the same name.
    /// Attribute order is insertion order, which keeps output stable.
    pub fn set_attribute(&mut self, name: &str, value: impl Display) {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Append a child and return a handle to it in its new position.
    pub fn append_child(&mut self, child: XmlElement) -> &mut XmlElement {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn first_child_element(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn first_child_element_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn child_elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Remove every direct child with the given name, returning how many went.
    pub fn remove_child_elements(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.name != name);
        before - self.children.len()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        let start = BytesStart::new(self.name.as_str()).with_attributes(
            self.attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        if self.children.is_empty() && self.text.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|e| XmlError::Write(e.to_string()))?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| XmlError::Write(e.to_string()))?;
        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(|e| XmlError::Write(e.to_string()))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| XmlError::Write(e.to_string()))?;
        Ok(())
    }
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDocument {
    doc_type: String,
    root: Option<XmlElement>,
}

impl XmlDocument {
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            root: None,
        }
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Create a detached element owned by the caller.
    pub fn create_element(&self, name: &str) -> XmlElement {
        XmlElement::new(name)
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.root.as_mut()
    }

    pub fn set_root(&mut self, root: XmlElement) {
        self.root = Some(root);
    }

    pub fn take_root(&mut self) -> Option<XmlElement> {
        self.root.take()
    }

    /// Parse a complete document. Whitespace-only text runs are dropped.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        let mut doc = XmlDocument::default();
        // Open elements, innermost last
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from_start(e));
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e);
                    attach(&mut doc, &mut stack, element)?;
                }
                Ok(Event::End(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let element = match stack.pop() {
                        Some(el) if el.name == name => el,
                        _ => return Err(XmlError::UnbalancedTag(name)),
                    };
                    attach(&mut doc, &mut stack, element)?;
                }
                Ok(Event::Text(ref e)) => {
                    let raw = String::from_utf8_lossy(&e[..]);
                    if let Some(current) = stack.last_mut() {
                        if !raw.trim().is_empty() {
                            current.text.push_str(&unescape_xml(&raw));
                        }
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&e[..]));
                    }
                }
                Ok(Event::GeneralRef(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        let name = String::from_utf8_lossy(&e[..]);
                        current.text.push_str(&unescape_xml(&format!("&{name};")));
                    }
                }
                Ok(Event::DocType(ref e)) => {
                    let raw = String::from_utf8_lossy(&e[..]);
                    doc.doc_type = raw.trim().to_string();
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XmlError::Parse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }
        if doc.root.is_none() {
            return Err(XmlError::NoRoot);
        }
        Ok(doc)
    }

    /// Serialize with the given indent width (0 = single line).
    pub fn to_xml_string(&self, indent: usize) -> Result<String, XmlError> {
        let root = self.root.as_ref().ok_or(XmlError::NoRoot)?;

        let mut writer = if indent > 0 {
            Writer::new_with_indent(Cursor::new(Vec::new()), b' ', indent)
        } else {
            Writer::new(Cursor::new(Vec::new()))
        };

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| XmlError::Write(e.to_string()))?;
        if !self.doc_type.is_empty() {
            writer
                .write_event(Event::DocType(BytesText::from_escaped(self.doc_type.as_str())))
                .map_err(|e| XmlError::Write(e.to_string()))?;
        }
        root.write_to(&mut writer)?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| XmlError::Write(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, XmlError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn save(&self, path: &Path, indent: usize) -> Result<(), XmlError> {
        let xml = self.to_xml_string(indent)?;
        std::fs::write(path, xml)?;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn element_from_start(e: &BytesStart) -> XmlElement {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).to_string());
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = String::from_utf8_lossy(&attr.value);
        element.attributes.push((key, unescape_xml(&raw)));
    }
    element
}

/// Hand a finished element to its parent, or make it the document root.
fn attach(
    doc: &mut XmlDocument,
    stack: &mut [XmlElement],
    element: XmlElement,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if doc.root.is_none() => {
            doc.root = Some(element);
            Ok(())
        }
        None => Err(XmlError::MultipleRoots),
    }
}

/// Unescape the 5 predefined XML entities plus numeric character references.
fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        match resolve_entity(entity) {
            Some(ch) => out.push(ch),
            None => out.push_str(&tail[..=semi]),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "quot" => Some('"'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
