//! Errors that end an exchange with a 500.

use wsbridge_xml::XmlError;

use crate::receiver::ReceiverError;

/// A failure the handlers cannot turn into a determinate response themselves.
///
/// These reach the service boundary, where they are logged and answered with
/// an empty 500.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The request body stream failed before it was fully received.
    #[error("failed to read request body: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The message engine failed with something other than malformed input.
    #[error("message engine failed: {0}")]
    Receiver(#[source] ReceiverError),

    /// The blocking worker running the engine panicked or was cancelled.
    #[error("message engine worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// A rewritten document could not be serialized.
    #[error("failed to serialize document '{name}': {source}")]
    Serialize {
        /// Logical name of the document.
        name: String,
        /// Underlying XML error.
        #[source]
        source: XmlError,
    },
}
