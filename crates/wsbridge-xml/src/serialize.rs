//! Serializing a [`Document`] back to XML bytes.

use std::io::{self, Write};

use bytes::Bytes;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use crate::dom::{Document, Element, Node};
use crate::error::XmlError;

/// Serialize a document into a single contiguous buffer.
///
/// # Errors
///
/// Returns `XmlError` if writing fails.
pub fn to_bytes(document: &Document) -> Result<Bytes, XmlError> {
    let mut buf = Vec::with_capacity(4096);
    write_document(&mut buf, document)?;
    Ok(Bytes::from(buf))
}

/// Serialize a document into any writer.
///
/// # Errors
///
/// Returns `io::Error` if the underlying writer fails.
pub fn write_document<W: Write>(out: W, document: &Document) -> io::Result<()> {
    let mut writer = Writer::new(out);
    for node in &document.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &document.root)?;
    for node in &document.epilog {
        write_node(&mut writer, node)?;
    }
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> io::Result<()> {
    match node {
        Node::Element(element) => write_element(writer, element),
        Node::Text(raw) => writer.write_event(Event::Text(BytesText::from_escaped(raw.as_str()))),
        Node::CData(content) => writer.write_event(Event::CData(BytesCData::new(content.as_str()))),
        Node::Comment(raw) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(raw.as_str())))
        }
        Node::ProcessingInstruction(content) => {
            writer.write_event(Event::PI(BytesPI::new(content.as_str())))
        }
        Node::Declaration(decl) => writer.write_event(Event::Decl(BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        ))),
        Node::DocType(raw) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(raw.as_str())))
        }
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> io::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        // Escapes the value.
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() && element.self_closing {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}
