//! The hyper `Service` wrapping the [`Dispatcher`].
//!
//! [`WsBridgeService`] assigns each exchange a request id, runs it through the
//! dispatcher, and adds the common response headers. It never fails: a
//! [`BridgeError`](crate::error::BridgeError) is logged and answered with an
//! empty 500.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::StatusCode;
use http::header::{HeaderValue, SERVER};
use http_body::Body;
use hyper::service::Service;
use tracing::{debug, error};
use uuid::Uuid;

use crate::body::WsResponseBody;
use crate::dispatch::Dispatcher;
use crate::handler::empty_response;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const SERVER_NAME: &str = "wsbridge";

/// hyper service for wsbridge exchanges.
#[derive(Debug, Clone)]
pub struct WsBridgeService {
    dispatcher: Dispatcher,
}

impl WsBridgeService {
    /// Wrap a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

impl<B> Service<http::Request<B>> for WsBridgeService
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = http::Response<WsResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let method = req.method().clone();
            let uri = req.uri().clone();
            debug!(%method, %uri, request_id, "processing request");

            let response = match dispatcher.dispatch(req).await {
                Ok(response) => response,
                Err(err) => {
                    error!(%method, %uri, error = %err, request_id, "exchange failed");
                    empty_response(StatusCode::INTERNAL_SERVER_ERROR)
                }
            };

            debug!(status = %response.status(), request_id, "completed request");
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Add the request id and server headers to every response.
fn add_common_headers(
    mut response: http::Response<WsResponseBody>,
    request_id: &str,
) -> http::Response<WsResponseBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}
