//! Parsing XML bytes into a [`Document`].

use quick_xml::Reader;
use quick_xml::events::{BytesDecl, BytesStart, Event};

use crate::dom::{Attribute, Declaration, Document, Element, Node};
use crate::error::XmlError;

/// Parse a complete XML document.
///
/// Whitespace is preserved so that serializing an unmodified tree keeps the
/// original layout.
///
/// # Errors
///
/// Returns `XmlError` if the input is not well-formed, is not UTF-8, or has no
/// root element.
pub fn parse(xml: &[u8]) -> Result<Document, XmlError> {
    let mut reader = Reader::from_reader(xml);
    let mut builder = TreeBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = read_element(&e, false)?;
                builder.stack.push(element);
            }
            Event::Empty(e) => {
                let element = read_element(&e, true)?;
                builder.attach(Node::Element(element))?;
            }
            Event::End(_) => {
                let element = builder.stack.pop().ok_or_else(|| {
                    XmlError::UnexpectedElement("closing tag without opening tag".to_owned())
                })?;
                builder.attach(Node::Element(element))?;
            }
            Event::Text(e) => builder.attach_text(raw_string(&e)?),
            Event::GeneralRef(e) => builder.attach_text(format!("&{};", raw_string(&e)?)),
            Event::CData(e) => builder.attach(Node::CData(raw_string(&e)?))?,
            Event::Comment(e) => builder.attach(Node::Comment(raw_string(&e)?))?,
            Event::PI(e) => builder.attach(Node::ProcessingInstruction(raw_string(&e)?))?,
            Event::DocType(e) => builder.attach(Node::DocType(raw_string(&e)?))?,
            Event::Decl(e) => builder.attach(Node::Declaration(read_declaration(&e)?))?,
            Event::Eof => break,
        }
    }

    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    prolog: Vec<Node>,
    epilog: Vec<Node>,
    stack: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) -> Result<(), XmlError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(XmlError::UnexpectedElement(format!(
                        "second root element <{}>",
                        element.name
                    )));
                }
                self.root = Some(element);
            }
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
        Ok(())
    }

    /// Attach text, merging with a directly preceding text node.
    fn attach_text(&mut self, text: String) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None if self.root.is_none() => &mut self.prolog,
            None => &mut self.epilog,
        };
        if let Some(Node::Text(previous)) = siblings.last_mut() {
            previous.push_str(&text);
        } else {
            siblings.push(Node::Text(text));
        }
    }

    fn finish(self) -> Result<Document, XmlError> {
        if let Some(open) = self.stack.last() {
            return Err(XmlError::UnexpectedElement(format!(
                "unclosed element <{}>",
                open.name
            )));
        }
        let root = self
            .root
            .ok_or_else(|| XmlError::MissingElement("root element".to_owned()))?;
        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn read_element(start: &BytesStart<'_>, self_closing: bool) -> Result<Element, XmlError> {
    let mut element = Element::new(raw_string(start.name().as_ref())?);
    element.self_closing = self_closing;
    for attr in start.attributes() {
        let attr = attr?;
        let name = raw_string(attr.key.as_ref())?;
        let raw = raw_string(&attr.value)?;
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| XmlError::ParseError(format!("attribute {name}: {e}")))?
            .into_owned();
        element.attributes.push(Attribute { name, value });
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration, XmlError> {
    let version = decl.version().map_err(decl_error)?;
    let encoding = decl.encoding().transpose().map_err(decl_error)?;
    let standalone = decl.standalone().transpose().map_err(decl_error)?;
    Ok(Declaration {
        version: raw_string(&version)?,
        encoding: encoding.map(|v| raw_string(&v)).transpose()?,
        standalone: standalone.map(|v| raw_string(&v)).transpose()?,
    })
}

fn decl_error(err: impl std::fmt::Display) -> XmlError {
    XmlError::ParseError(format!("XML declaration: {err}"))
}

fn raw_string(bytes: &[u8]) -> Result<String, XmlError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| XmlError::ParseError(e.to_string()))
}
