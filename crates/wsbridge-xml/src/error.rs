//! XML error types.

use std::io;

/// Errors that can occur while parsing, serializing, or querying XML documents.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// Text or attribute content could not be decoded.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// A location expression could not be compiled.
    #[error("invalid location expression: {0}")]
    InvalidExpression(String),
}

impl XmlError {
    /// Returns `true` if this error means the input was not well-formed XML,
    /// as opposed to a failure of the writer or an invalid expression.
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::QuickXml(_)
                | Self::Attribute(_)
                | Self::MissingElement(_)
                | Self::UnexpectedElement(_)
                | Self::ParseError(_)
        )
    }
}
