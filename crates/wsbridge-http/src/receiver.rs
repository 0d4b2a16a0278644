//! The message-engine boundary.
//!
//! A [`MessageReceiver`] is the synchronous engine the message path bridges
//! into. It is invoked once per exchange on a blocking worker with a
//! [`ServerConnection`] and signals its outcome through the connection's
//! fault operations or by returning a [`ReceiverError`].

use std::fmt;

use wsbridge_xml::XmlError;

use crate::connection::ServerConnection;

/// Namespace of SOAP 1.1 envelope fault codes.
pub const SOAP11_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace of SOAP 1.2 envelope fault codes.
pub const SOAP12_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

const SOAP11_CODES: &[&str] = &["Client", "Server", "VersionMismatch", "MustUnderstand"];
const SOAP12_CODES: &[&str] = &[
    "Sender",
    "Receiver",
    "VersionMismatch",
    "MustUnderstand",
    "DataEncodingUnknown",
];

/// A synchronous message engine.
///
/// Implementations may block. They read the request through
/// [`ServerConnection::request_stream`], write at most one response through
/// [`ServerConnection::send`], and report faults through the connection.
pub trait MessageReceiver: Send + Sync + 'static {
    /// Process one exchange.
    fn receive(&self, connection: &mut ServerConnection) -> Result<(), ReceiverError>;
}

/// Errors a [`MessageReceiver`] can raise.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// The request body is not well-formed; answered with 400 and no body.
    #[error("invalid XML in request: {0}")]
    InvalidXml(String),

    /// A response header name or value was rejected.
    #[error("invalid response header: {0}")]
    InvalidHeader(String),

    /// Reading the request or writing the response failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other engine failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<XmlError> for ReceiverError {
    fn from(err: XmlError) -> Self {
        if err.is_malformed_input() {
            Self::InvalidXml(err.to_string())
        } else {
            Self::Other(err.into())
        }
    }
}

/// A qualified fault code as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaultCode {
    namespace: Option<String>,
    local_part: String,
}

impl FaultCode {
    /// Create a fault code from a namespace URI and local part.
    #[must_use]
    pub fn new(namespace: Option<&str>, local_part: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(ToOwned::to_owned),
            local_part: local_part.into(),
        }
    }

    /// SOAP 1.2 `Sender`.
    #[must_use]
    pub fn soap12_sender() -> Self {
        Self::new(Some(SOAP12_ENVELOPE_NS), "Sender")
    }

    /// SOAP 1.2 `Receiver`.
    #[must_use]
    pub fn soap12_receiver() -> Self {
        Self::new(Some(SOAP12_ENVELOPE_NS), "Receiver")
    }

    /// SOAP 1.1 `Client`.
    #[must_use]
    pub fn soap11_client() -> Self {
        Self::new(Some(SOAP11_ENVELOPE_NS), "Client")
    }

    /// SOAP 1.1 `Server`.
    #[must_use]
    pub fn soap11_server() -> Self {
        Self::new(Some(SOAP11_ENVELOPE_NS), "Server")
    }

    /// Namespace URI, if qualified.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local part.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// Whether the fault blames the sender (SOAP 1.2 `Sender`, SOAP 1.1
    /// `Client`).
    #[must_use]
    pub fn is_sender(&self) -> bool {
        match self.namespace() {
            Some(SOAP12_ENVELOPE_NS) => self.local_part == "Sender",
            Some(SOAP11_ENVELOPE_NS) => self.local_part == "Client",
            _ => false,
        }
    }

    /// Whether this is one of the standard SOAP 1.1 or 1.2 envelope codes.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        match self.namespace() {
            Some(SOAP12_ENVELOPE_NS) => SOAP12_CODES.contains(&self.local_part.as_str()),
            Some(SOAP11_ENVELOPE_NS) => SOAP11_CODES.contains(&self.local_part.as_str()),
            _ => false,
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local_part),
            None => f.write_str(&self.local_part),
        }
    }
}

/// A receiver with no engine behind it: every exchange is answered as
/// endpoint-not-found.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotImplementedReceiver;

impl MessageReceiver for NotImplementedReceiver {
    fn receive(&self, connection: &mut ServerConnection) -> Result<(), ReceiverError> {
        connection.endpoint_not_found();
        Ok(())
    }
}
