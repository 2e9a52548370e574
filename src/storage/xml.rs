//! quick-xml bridge for [`Document`]
//!
//! Whitespace-only text is dropped on read; output is re-indented with two
//! spaces. Comments, CDATA, processing instructions and the declaration
//! survive a round trip.

use std::borrow::Cow;
use std::fmt;

use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::domain::{Attribute, Declaration, Document, Element, Node};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("Unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("Unclosed element <{0}>")]
    Unclosed(String),

    #[error("Document has no root element")]
    NoRoot,

    #[error("Element <{0}> appears after the root element")]
    MultipleRoots(String),

    #[error("Failed to write XML: {0}")]
    Write(String),
}

/// Parses project XML into an owned tree
pub fn parse(text: &str) -> Result<Document, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut builder = TreeBuilder::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            XmlError::Parse(format!("{} (at byte {})", e, reader.buffer_position()))
        })?;

        match event {
            Event::Decl(decl) => builder.declaration = Some(declaration(&decl)?),
            Event::Start(start) => {
                let element = start_element(&start)?;
                builder.open.push(element);
            }
            Event::Empty(start) => {
                let element = start_element(&start)?;
                builder.attach(Node::Element(element))?;
            }
            Event::End(end) => {
                let element = builder.open.pop().ok_or_else(|| {
                    XmlError::UnexpectedEnd(String::from_utf8_lossy(end.name().as_ref()).into_owned())
                })?;
                builder.attach(Node::Element(element))?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(parse_err)?;
                if !text.trim().is_empty() {
                    builder.attach(Node::Text(text.into_owned()))?;
                }
            }
            Event::CData(data) => {
                builder.attach(Node::CData(String::from_utf8_lossy(&data).into_owned()))?;
            }
            Event::Comment(comment) => {
                builder.attach(Node::Comment(String::from_utf8_lossy(&comment).into_owned()))?;
            }
            Event::PI(pi) => {
                builder.attach(Node::ProcessingInstruction(
                    String::from_utf8_lossy(&pi).into_owned(),
                ))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    builder.finish()
}

/// Serializes a document with two-space indentation and a trailing newline
pub fn to_string(document: &Document) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    if let Some(decl) = &document.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))
            .map_err(write_err)?;
    }

    for node in &document.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &document.root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(write_err)
}

#[derive(Default)]
struct TreeBuilder {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    open: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) -> Result<(), XmlError> {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        match node {
            Node::Element(element) if self.root.is_some() => {
                Err(XmlError::MultipleRoots(element.name))
            }
            Node::Element(element) => {
                self.root = Some(element);
                Ok(())
            }
            // Trailing comments and stray text outside the root are dropped
            other if self.root.is_none() && !matches!(other, Node::Text(_)) => {
                self.prolog.push(other);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn finish(mut self) -> Result<Document, XmlError> {
        if let Some(unclosed) = self.open.pop() {
            return Err(XmlError::Unclosed(unclosed.name));
        }
        let root = self.root.ok_or(XmlError::NoRoot)?;

        Ok(Document {
            declaration: self.declaration,
            prolog: self.prolog,
            root,
        })
    }
}

fn declaration(decl: &BytesDecl<'_>) -> Result<Declaration, XmlError> {
    let version = decl.version().map_err(parse_err)?;
    let encoding = decl.encoding().transpose().map_err(parse_err)?;
    let standalone = decl.standalone().transpose().map_err(parse_err)?;

    Ok(Declaration {
        version: String::from_utf8_lossy(&version).into_owned(),
        encoding: encoding.map(|e| String::from_utf8_lossy(&e).into_owned()),
        standalone: standalone.map(|s| String::from_utf8_lossy(&s).into_owned()),
    })
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(parse_err)?
        .to_string();
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(parse_err)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(parse_err)?;
        let value = attr.unescape_value().map_err(parse_err)?;
        element.attributes.push(Attribute::new(key, value.into_owned()));
    }

    Ok(element)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        // Single quotes stay literal so MSBuild conditions remain readable
        let escaped = partial_escape(&attr.value).replace('"', "&quot;");
        start.push_attribute(XmlAttribute {
            key: QName(attr.name.as_bytes()),
            value: Cow::Owned(escaped.into_bytes()),
        });
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_err);
    }

    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_err)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), XmlError> {
    let event = match node {
        Node::Element(element) => return write_element(writer, element),
        Node::Text(text) => Event::Text(BytesText::from_escaped(partial_escape(text))),
        Node::CData(data) => Event::CData(BytesCData::new(data.as_str())),
        Node::Comment(comment) => Event::Comment(BytesText::from_escaped(comment.as_str())),
        Node::ProcessingInstruction(content) => Event::PI(BytesPI::new(content.as_str())),
    };
    writer.write_event(event).map_err(write_err)
}

fn parse_err(err: impl fmt::Display) -> XmlError {
    XmlError::Parse(err.to_string())
}

fn write_err(err: impl fmt::Display) -> XmlError {
    XmlError::Write(err.to_string())
}
