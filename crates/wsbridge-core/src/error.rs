//! Error types for the wsbridge core.

use wsbridge_xml::XmlError;

use crate::document::DocumentKind;

/// Core error type for startup and configuration.
#[derive(Debug, thiserror::Error)]
pub enum WsBridgeError {
    /// A published document is not well-formed XML.
    #[error("invalid document '{name}': {source}")]
    Document {
        /// Logical name of the document.
        name: String,
        /// Underlying XML error.
        #[source]
        source: XmlError,
    },

    /// Two documents of the same kind were published under one name.
    #[error("duplicate {kind} document '{name}'")]
    Duplicate {
        /// Kind of both documents.
        kind: DocumentKind,
        /// The clashing name.
        name: String,
    },

    /// Reading a file or directory failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for core operations.
pub type WsBridgeResult<T> = Result<T, WsBridgeError>;
