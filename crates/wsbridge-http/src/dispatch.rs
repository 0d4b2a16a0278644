//! Routing an exchange to exactly one handler.
//!
//! The set of handlers is closed: a request is a WSDL fetch, an XSD fetch, or
//! a message. A document request whose name is not published is not an error;
//! it falls through to the message path like any other request.

use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use http::Method;
use http_body::Body;
use tracing::debug;
use wsbridge_core::{DocumentKind, DocumentRegistry, DocumentSource, last_modified};

use crate::body::WsResponseBody;
use crate::error::BridgeError;
use crate::handler::document::{serve_wsdl, serve_xsd};
use crate::handler::message::serve_message;
use crate::receiver::MessageReceiver;
use crate::rewrite::LocationRewriter;
use crate::router::{Classification, classify};

/// The handler chosen for a request.
#[derive(Debug, Clone, Copy)]
pub enum Route<'a> {
    /// A published WSDL definition.
    Wsdl(&'a DocumentSource),
    /// A published XSD schema.
    Xsd(&'a DocumentSource),
    /// The message receiver.
    Message,
}

impl Route<'_> {
    /// Short name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wsdl(_) => "wsdl",
            Self::Xsd(_) => "xsd",
            Self::Message => "message",
        }
    }
}

struct DispatcherInner {
    registry: DocumentRegistry,
    rewriter: LocationRewriter,
    receiver: Arc<dyn MessageReceiver>,
}

/// Holds the published documents, the compiled rewrite settings, and the
/// message receiver. Cheap to clone; all state is read-only.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.inner.registry)
            .field("rewriter", &self.inner.rewriter)
            .field("receiver", &"...")
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        registry: DocumentRegistry,
        rewriter: LocationRewriter,
        receiver: Arc<dyn MessageReceiver>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                registry,
                rewriter,
                receiver,
            }),
        }
    }

    /// Pick the handler for a request.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Route<'_> {
        match classify(method, path) {
            Classification::Document { kind, name } => {
                match (kind, self.inner.registry.get(kind, &name)) {
                    (DocumentKind::Wsdl, Some(source)) => Route::Wsdl(source),
                    (DocumentKind::Xsd, Some(source)) => Route::Xsd(source),
                    (_, None) => {
                        debug!(%kind, name = %name, "document not published, using message path");
                        Route::Message
                    }
                }
            }
            Classification::Message => Route::Message,
        }
    }

    /// Last-modified time of whatever the request routes to. Message
    /// exchanges and documents without a file origin have none.
    #[must_use]
    pub fn last_modified(&self, method: &Method, path: &str) -> Option<SystemTime> {
        match self.route(method, path) {
            Route::Wsdl(source) | Route::Xsd(source) => source.last_modified(),
            Route::Message => None,
        }
    }

    /// [`last_modified`](Self::last_modified) in epoch milliseconds, `-1`
    /// when unknown.
    #[must_use]
    pub fn last_modified_millis(&self, method: &Method, path: &str) -> i64 {
        last_modified::as_epoch_millis(self.last_modified(method, path))
    }

    /// Run one exchange through the routed handler.
    pub async fn dispatch<B>(
        &self,
        req: http::Request<B>,
    ) -> Result<http::Response<WsResponseBody>, BridgeError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let route = self.route(&parts.method, parts.uri.path());
        debug!(route = route.as_str(), method = %parts.method, path = parts.uri.path(), "routed request");

        match route {
            Route::Wsdl(source) => serve_wsdl(&parts, source, &self.inner.rewriter),
            Route::Xsd(source) => serve_xsd(&parts, source, &self.inner.rewriter),
            Route::Message => {
                serve_message(parts, body, Arc::clone(&self.inner.receiver)).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wsbridge_core::WsBridgeConfig;

    use super::*;
    use crate::receiver::NotImplementedReceiver;

    fn dispatcher_with_file(dir: &std::path::Path) -> Dispatcher {
        std::fs::write(
            dir.join("echo.wsdl"),
            r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"/>"#,
        )
        .expect("write wsdl");
        let registry = DocumentRegistry::builder()
            .load_dir(dir)
            .expect("loadable")
            .add(
                DocumentKind::Xsd,
                DocumentSource::from_bytes("types", "<schema/>").expect("valid"),
            )
            .expect("unique")
            .build();
        let rewriter =
            LocationRewriter::from_config(&WsBridgeConfig::default()).expect("valid expressions");
        Dispatcher::new(registry, rewriter, Arc::new(NotImplementedReceiver))
    }

    #[test]
    fn test_should_route_published_documents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let dispatcher = dispatcher_with_file(dir.path());
        assert!(matches!(
            dispatcher.route(&Method::GET, "/ws/echo.wsdl"),
            Route::Wsdl(s) if s.name() == "echo"
        ));
        assert!(matches!(
            dispatcher.route(&Method::GET, "/any/where/types.xsd"),
            Route::Xsd(s) if s.name() == "types"
        ));
    }

    #[test]
    fn test_should_fall_through_to_message_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let dispatcher = dispatcher_with_file(dir.path());
        for (method, path) in [
            (Method::GET, "/ws/missing.wsdl"),
            (Method::GET, "/ws/echo.xsd"),
            (Method::GET, "/ws/types.wsdl"),
            (Method::POST, "/ws/echo.wsdl"),
            (Method::GET, "/ws/echo"),
        ] {
            assert!(
                matches!(dispatcher.route(&method, path), Route::Message),
                "{method} {path}"
            );
        }
    }

    #[test]
    fn test_should_report_last_modified_per_route() {
        let dir = tempfile::tempdir().expect("temp dir");
        let dispatcher = dispatcher_with_file(dir.path());
        let expected = std::fs::metadata(dir.path().join("echo.wsdl"))
            .and_then(|m| m.modified())
            .expect("mtime");
        assert_eq!(
            dispatcher.last_modified(&Method::GET, "/ws/echo.wsdl"),
            Some(expected)
        );
        assert!(dispatcher.last_modified_millis(&Method::GET, "/ws/echo.wsdl") > 0);
        // In-memory documents and messages have no timestamp.
        assert_eq!(dispatcher.last_modified_millis(&Method::GET, "/ws/types.xsd"), -1);
        assert_eq!(dispatcher.last_modified_millis(&Method::POST, "/ws"), -1);
    }
}
