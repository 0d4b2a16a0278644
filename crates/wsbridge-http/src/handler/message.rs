//! The message path: bridge the request body into the engine and back.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body::Body;
use tracing::{debug, warn};

use crate::body::WsResponseBody;
use crate::connection::{AccumulatedBody, ServerConnection};
use crate::error::BridgeError;
use crate::handler::{empty_response, method_not_allowed};
use crate::receiver::{MessageReceiver, ReceiverError};
use crate::request::RequestBase;

/// Run one message exchange.
///
/// Only POST is accepted. The body is collected in full, then the receiver
/// runs on a blocking worker so a slow engine does not stall the runtime.
/// Malformed input becomes 400 with no body; any other receiver failure is
/// returned as an error.
pub async fn serve_message<B>(
    parts: http::request::Parts,
    body: B,
    receiver: Arc<dyn MessageReceiver>,
) -> Result<http::Response<WsResponseBody>, BridgeError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if parts.method != Method::POST {
        return Ok(method_not_allowed(&Method::POST));
    }

    let body = AccumulatedBody::collect(body)
        .await
        .map_err(|err| BridgeError::Body(err.into()))?;
    debug!(len = body.len(), "collected message body");

    let uri = RequestBase::from_parts(&parts).exchange_uri(&parts.uri);
    let connection = ServerConnection::new(uri, parts.headers, body);

    let (connection, result) = tokio::task::spawn_blocking(move || {
        let mut connection = connection;
        let result = receiver.receive(&mut connection);
        (connection, result)
    })
    .await?;

    match result {
        Ok(()) => Ok(connection.close()),
        Err(ReceiverError::InvalidXml(reason)) => {
            warn!(%reason, "rejecting malformed message");
            Ok(empty_response(StatusCode::BAD_REQUEST))
        }
        Err(err) => Err(BridgeError::Receiver(err)),
    }
}
