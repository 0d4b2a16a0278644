//! Owned, mutable XML tree.
//!
//! The tree keeps enough of the original markup (declaration, comments,
//! processing instructions, raw text) that a parse/serialize cycle without
//! modifications reproduces an equivalent document. Element and attribute
//! positions are addressed by [`ElementPath`] and [`AttributePath`], which stay
//! valid as long as only attribute values are modified.

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Nodes before the root element (declaration, comments, doctype, whitespace).
    pub prolog: Vec<Node>,
    /// The document element.
    pub root: Element,
    /// Nodes after the root element.
    pub epilog: Vec<Node>,
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the source (e.g. `wsdl:port`).
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Child nodes in source order.
    pub children: Vec<Node>,
    /// Whether the element was written as `<name/>`.
    pub self_closing: bool,
}

/// An attribute with its unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name as written in the source (e.g. `xsi:type`).
    pub name: String,
    /// Unescaped value; escaping is reapplied on serialization.
    pub value: String,
}

/// The XML declaration (`<?xml version="1.0" ...?>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The `version` pseudo-attribute.
    pub version: String,
    /// The `encoding` pseudo-attribute, if present.
    pub encoding: Option<String>,
    /// The `standalone` pseudo-attribute, if present.
    pub standalone: Option<String>,
}

/// A node in the document tree.
///
/// Textual variants hold the raw (still escaped) source content so that entity
/// references survive a round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A child element.
    Element(Element),
    /// Character data, escaped.
    Text(String),
    /// A `<![CDATA[...]]>` section.
    CData(String),
    /// A comment body.
    Comment(String),
    /// A processing instruction body (target and content).
    ProcessingInstruction(String),
    /// The XML declaration.
    Declaration(Declaration),
    /// A `<!DOCTYPE ...>` body.
    DocType(String),
}

/// Position of an element as child indices walked from the root element.
///
/// The empty path is the root element. Ordering paths lexicographically gives
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementPath(Vec<usize>);

/// Position of an attribute: its owning element and index in that element's
/// attribute list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributePath {
    /// The owning element.
    pub element: ElementPath,
    /// Index into [`Element::attributes`].
    pub index: usize,
}

/// A node selected by a location expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    /// A selected element.
    Element(ElementPath),
    /// A selected attribute.
    Attribute(AttributePath),
}

/// Returns the part of a qualified name after the namespace prefix.
#[must_use]
pub fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map_or(qualified, |(_, local)| local)
}

impl ElementPath {
    /// The path of the root element.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// The path of the child node at `index` below this element.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Child indices from the root element.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl Element {
    /// Create an element with no attributes or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// The element name without its namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Look up an attribute value by qualified name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Iterate over child elements together with their index in [`Element::children`].
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Element(el) => Some((i, el)),
                _ => None,
            })
    }
}

impl Document {
    /// Resolve an element path.
    #[must_use]
    pub fn element(&self, path: &ElementPath) -> Option<&Element> {
        let mut current = &self.root;
        for &index in path.indices() {
            match current.children.get(index) {
                Some(Node::Element(el)) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Resolve an element path mutably.
    pub fn element_mut(&mut self, path: &ElementPath) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &index in path.indices() {
            match current.children.get_mut(index) {
                Some(Node::Element(el)) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Resolve an attribute path.
    #[must_use]
    pub fn attribute(&self, path: &AttributePath) -> Option<&Attribute> {
        self.element(&path.element)?.attributes.get(path.index)
    }

    /// Resolve an attribute path mutably.
    pub fn attribute_mut(&mut self, path: &AttributePath) -> Option<&mut Attribute> {
        self.element_mut(&path.element)?
            .attributes
            .get_mut(path.index)
    }
}
