//! Compiled location expressions.
//!
//! A [`LocationExpression`] is a small subset of XPath location paths, enough
//! to select the address attributes of WSDL and XSD documents:
//!
//! ```text
//! //@location                     every `location` attribute
//! //@schemaLocation               every `schemaLocation` attribute
//! //xsd:import/@schemaLocation    `schemaLocation` on `xsd:import` elements
//! /definitions/service//address   elements (not attributes)
//! ```
//!
//! Separators are `/` (child) and `//` (descendant). Element name tests are
//! `name`, `prefix:name` or `*`; an unprefixed element test matches on local
//! name. Attribute tests (`@name`, `@prefix:name`, `@*`) compare the qualified
//! name exactly, so `//@schemaLocation` does not select `xsi:schemaLocation`.
//! An attribute step may only appear last.

use std::fmt;
use std::str::FromStr;

use crate::dom::{AttributePath, Document, Element, ElementPath, NodeRef};
use crate::error::XmlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
}

/// A compiled, immutable location expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationExpression {
    source: String,
    elements: Vec<Step>,
    attribute: Option<Step>,
}

impl LocationExpression {
    /// Compile an expression.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidExpression`] if the expression is not an
    /// absolute location path in the supported subset.
    pub fn compile(source: &str) -> Result<Self, XmlError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(XmlError::InvalidExpression("empty expression".to_owned()));
        }
        if !trimmed.starts_with('/') {
            return Err(XmlError::InvalidExpression(format!(
                "'{trimmed}' is not an absolute location path"
            )));
        }

        let mut elements = Vec::new();
        let mut attribute = None;
        let mut rest = trimmed;

        while !rest.is_empty() {
            if attribute.is_some() {
                return Err(XmlError::InvalidExpression(format!(
                    "attribute step must be the last step in '{trimmed}'"
                )));
            }
            let (axis, after) = if let Some(after) = rest.strip_prefix("//") {
                (Axis::Descendant, after)
            } else if let Some(after) = rest.strip_prefix('/') {
                (Axis::Child, after)
            } else {
                return Err(XmlError::InvalidExpression(format!(
                    "expected '/' in '{trimmed}'"
                )));
            };
            let end = after.find('/').unwrap_or(after.len());
            let token = &after[..end];
            rest = &after[end..];

            if token.is_empty() {
                return Err(XmlError::InvalidExpression(format!(
                    "empty step in '{trimmed}'"
                )));
            }
            if let Some(name) = token.strip_prefix('@') {
                attribute = Some(Step {
                    axis,
                    test: parse_name_test(name, trimmed)?,
                });
            } else {
                elements.push(Step {
                    axis,
                    test: parse_name_test(token, trimmed)?,
                });
            }
        }

        Ok(Self {
            source: trimmed.to_owned(),
            elements,
            attribute,
        })
    }

    /// The expression text this was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether this expression selects attributes rather than elements.
    #[must_use]
    pub fn selects_attributes(&self) -> bool {
        self.attribute.is_some()
    }

    /// Evaluate against a document, returning matches in document order
    /// without duplicates.
    #[must_use]
    pub fn evaluate(&self, document: &Document) -> Vec<NodeRef> {
        // `None` stands for the document node, which is the initial context.
        let mut context: Option<Vec<ElementPath>> = None;

        for step in &self.elements {
            let mut next = Vec::new();
            match &context {
                None => match step.axis {
                    Axis::Child => next.push(ElementPath::root()),
                    Axis::Descendant => {
                        collect_subtree(&document.root, &ElementPath::root(), true, &mut next);
                    }
                },
                Some(paths) => {
                    for path in paths {
                        let Some(element) = document.element(path) else {
                            continue;
                        };
                        match step.axis {
                            Axis::Child => next.extend(
                                element.child_elements().map(|(i, _)| path.child(i)),
                            ),
                            Axis::Descendant => {
                                collect_subtree(element, path, false, &mut next);
                            }
                        }
                    }
                }
            }
            next.retain(|p| {
                document
                    .element(p)
                    .is_some_and(|el| matches_element(&step.test, el))
            });
            next.sort();
            next.dedup();
            context = Some(next);
        }

        let Some(attribute) = &self.attribute else {
            return context
                .unwrap_or_default()
                .into_iter()
                .map(NodeRef::Element)
                .collect();
        };

        let owners = match (&context, attribute.axis) {
            // The document node has no attributes of its own.
            (None, Axis::Child) => Vec::new(),
            (None, Axis::Descendant) => {
                let mut all = Vec::new();
                collect_subtree(&document.root, &ElementPath::root(), true, &mut all);
                all
            }
            (Some(paths), Axis::Child) => paths.clone(),
            (Some(paths), Axis::Descendant) => {
                let mut all = Vec::new();
                for path in paths {
                    if let Some(element) = document.element(path) {
                        collect_subtree(element, path, true, &mut all);
                    }
                }
                all.sort();
                all.dedup();
                all
            }
        };

        let mut matches = Vec::new();
        for owner in owners {
            let Some(element) = document.element(&owner) else {
                continue;
            };
            for (index, attr) in element.attributes.iter().enumerate() {
                if matches_attribute(&attribute.test, &attr.name) {
                    matches.push(NodeRef::Attribute(AttributePath {
                        element: owner.clone(),
                        index,
                    }));
                }
            }
        }
        matches
    }
}

impl FromStr for LocationExpression {
    type Err = XmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for LocationExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Push `element` (optionally) and all of its descendants in document order.
fn collect_subtree(
    element: &Element,
    path: &ElementPath,
    include_self: bool,
    out: &mut Vec<ElementPath>,
) {
    if include_self {
        out.push(path.clone());
    }
    for (index, child) in element.child_elements() {
        collect_subtree(child, &path.child(index), true, out);
    }
}

fn matches_element(test: &NameTest, element: &Element) -> bool {
    match test {
        NameTest::Any => true,
        NameTest::Name(name) if name.contains(':') => element.name == *name,
        NameTest::Name(name) => element.local_name() == name,
    }
}

fn matches_attribute(test: &NameTest, qualified: &str) -> bool {
    match test {
        NameTest::Any => true,
        NameTest::Name(name) => qualified == name,
    }
}

fn parse_name_test(token: &str, expression: &str) -> Result<NameTest, XmlError> {
    if token == "*" {
        return Ok(NameTest::Any);
    }
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    };
    let valid = match token.split_once(':') {
        Some((prefix, local)) => valid_part(prefix) && valid_part(local),
        None => valid_part(token),
    };
    if valid {
        Ok(NameTest::Name(token.to_owned()))
    } else {
        Err(XmlError::InvalidExpression(format!(
            "invalid name test '{token}' in '{expression}'"
        )))
    }
}
