//! Exchange handlers: one for published documents, one for messages.

pub mod document;
pub mod message;

use http::header::{ALLOW, HeaderValue};
use http::{Method, StatusCode};

use crate::body::WsResponseBody;

/// A response with `status` and no body.
#[must_use]
pub(crate) fn empty_response(status: StatusCode) -> http::Response<WsResponseBody> {
    let mut response = http::Response::new(WsResponseBody::empty());
    *response.status_mut() = status;
    response
}

/// 405 naming the single method the handler accepts.
#[must_use]
pub(crate) fn method_not_allowed(allowed: &Method) -> http::Response<WsResponseBody> {
    let mut response = empty_response(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}
