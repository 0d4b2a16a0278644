//! The stream bridge between the async transport and a blocking engine.
//!
//! The request body arrives as a sequence of chunks. [`AccumulatedBody::collect`]
//! drains all of them before the engine runs, so the whole body is held in
//! memory; there is no read-while-receiving mode. The engine then reads the
//! chunks through [`std::io::Read`] in arrival order, each chunk exactly once.
//!
//! On the way out the engine writes one response into a single buffer owned by
//! the [`ServerConnection`], and [`ServerConnection::close`] turns that buffer
//! and the set-once [`ExchangeStatus`] into the HTTP response.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use bytes::{Buf, Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body::Body;
use http_body_util::BodyExt;
use tracing::{debug, warn};

use crate::body::WsResponseBody;
use crate::receiver::{FaultCode, ReceiverError};
use crate::status::ExchangeStatus;

/// A fully received request body, readable front to back.
#[derive(Debug, Default)]
pub struct AccumulatedBody {
    chunks: VecDeque<Bytes>,
    remaining: usize,
}

impl AccumulatedBody {
    /// Create an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `body` to the end, keeping its data frames in order.
    ///
    /// Trailers are ignored.
    pub async fn collect<B>(body: B) -> Result<Self, B::Error>
    where
        B: Body<Data = Bytes>,
    {
        let mut body = std::pin::pin!(body);
        let mut acc = Self::new();
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame?.into_data() {
                acc.push(data);
            }
        }
        Ok(acc)
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.remaining += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Bytes not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remaining
    }

    /// Whether everything has been read (or nothing was received).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Concatenate the unread chunks into one buffer.
    #[must_use]
    pub fn into_bytes(mut self) -> Bytes {
        match self.chunks.len() {
            0 => Bytes::new(),
            1 => self.chunks.pop_front().unwrap_or_default(),
            _ => {
                let mut out = BytesMut::with_capacity(self.remaining);
                for chunk in self.chunks {
                    out.extend_from_slice(&chunk);
                }
                out.freeze()
            }
        }
    }
}

impl Read for AccumulatedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(front) = self.chunks.front_mut() else {
            return Ok(0);
        };
        let n = front.len().min(buf.len());
        buf[..n].copy_from_slice(&front[..n]);
        front.advance(n);
        if front.is_empty() {
            self.chunks.pop_front();
        }
        self.remaining -= n;
        Ok(n)
    }
}

/// The engine's view of one exchange.
///
/// Exposes the request headers, URI, and body; collects response headers and
/// the single response buffer; and derives the status from the engine's fault
/// signals. The first status-affecting call wins, later ones are ignored.
#[derive(Debug)]
pub struct ServerConnection {
    uri: String,
    request_headers: HeaderMap,
    request_body: AccumulatedBody,
    status: ExchangeStatus,
    response_headers: HeaderMap,
    response: Vec<u8>,
    sent: bool,
}

impl ServerConnection {
    /// Create a connection for an exchange whose body has been collected.
    #[must_use]
    pub fn new(uri: String, request_headers: HeaderMap, request_body: AccumulatedBody) -> Self {
        Self {
            uri,
            request_headers,
            request_body,
            status: ExchangeStatus::Unset,
            response_headers: HeaderMap::new(),
            response: Vec::new(),
            sent: false,
        }
    }

    /// The exchange URI: `scheme://host:port/path?query`.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Names of the request headers.
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.request_headers.keys().map(HeaderName::as_str)
    }

    /// All values of a request header. Values that are not visible ASCII are
    /// skipped.
    pub fn request_headers(&self, name: &str) -> impl Iterator<Item = &str> {
        self.request_headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }

    /// The request body as a blocking reader.
    pub fn request_stream(&mut self) -> &mut AccumulatedBody {
        &mut self.request_body
    }

    /// Append a response header.
    pub fn add_response_header(&mut self, name: &str, value: &str) -> Result<(), ReceiverError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ReceiverError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ReceiverError::InvalidHeader(format!("{name}: {e}")))?;
        self.response_headers.append(name, value);
        Ok(())
    }

    /// Write the response. May be called once per exchange.
    ///
    /// A successful write fixes the status at 200 unless a fault signal came
    /// first.
    pub fn send<F>(&mut self, write: F) -> Result<(), ReceiverError>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        if self.sent {
            return Err(ReceiverError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "response already sent for this exchange",
            )));
        }
        self.sent = true;
        write(&mut self.response)?;
        self.apply(StatusCode::OK, "send");
        Ok(())
    }

    /// Write `payload` as the response.
    pub fn send_bytes(&mut self, payload: &[u8]) -> Result<(), ReceiverError> {
        self.send(|out| out.write_all(payload))
    }

    /// No endpoint can handle the message: 404.
    pub fn endpoint_not_found(&mut self) {
        self.apply(StatusCode::NOT_FOUND, "endpoint not found");
    }

    /// Report the fault code of the response, `None` for a non-fault
    /// response.
    ///
    /// Sender faults give 400, every other code 500, `None` 200.
    pub fn set_fault_code(&mut self, fault_code: Option<&FaultCode>) {
        let status = match fault_code {
            None => StatusCode::OK,
            Some(code) if code.is_sender() => StatusCode::BAD_REQUEST,
            Some(code) => {
                if !code.is_standard() {
                    warn!(fault_code = %code, "unrecognized fault code, answering 500");
                }
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        self.apply(status, "fault code");
    }

    /// Legacy fault flag: `true` gives 500, `false` 200.
    pub fn set_fault(&mut self, fault: bool) {
        let status = if fault {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        self.apply(status, "fault flag");
    }

    /// Transport-level errors are never reported through the connection.
    #[must_use]
    pub fn has_error(&self) -> bool {
        false
    }

    /// Always `None`; see [`has_error`](Self::has_error).
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        None
    }

    /// The status as it stands.
    #[must_use]
    pub fn status(&self) -> ExchangeStatus {
        self.status
    }

    /// Finish the exchange. An unset status becomes 202.
    #[must_use]
    pub fn close(self) -> http::Response<WsResponseBody> {
        let status = self.status.resolve_or(StatusCode::ACCEPTED);
        let body = if self.response.is_empty() {
            WsResponseBody::empty()
        } else {
            WsResponseBody::from_bytes(self.response)
        };
        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = self.response_headers;
        response
    }

    fn apply(&mut self, status: StatusCode, signal: &'static str) {
        if !self.status.set_once(status) {
            debug!(
                signal,
                ignored = %status,
                current = ?self.status,
                "status already set, ignoring signal"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http_body::Frame;
    use http_body_util::{BodyExt, StreamBody};

    use super::*;

    type ChunkStream = StreamBody<futures::stream::Iter<std::vec::IntoIter<FrameResult>>>;
    type FrameResult = Result<Frame<Bytes>, Infallible>;

    fn stream_of(chunks: &[&'static str]) -> ChunkStream {
        let frames: Vec<FrameResult> = chunks
            .iter()
            .map(|c| Ok(Frame::data(Bytes::from_static(c.as_bytes()))))
            .collect();
        StreamBody::new(futures::stream::iter(frames))
    }

    fn connection(body: &'static str) -> ServerConnection {
        let mut acc = AccumulatedBody::new();
        acc.push(Bytes::from_static(body.as_bytes()));
        ServerConnection::new(
            "http://example.com:80/ws".to_owned(),
            HeaderMap::new(),
            acc,
        )
    }

    async fn body_bytes(response: http::Response<WsResponseBody>) -> Bytes {
        response
            .into_body()
            .collect()
            .await
            .expect("infallible body")
            .to_bytes()
    }

    #[tokio::test]
    async fn test_should_concatenate_chunks_in_order() {
        let mut acc = AccumulatedBody::collect(stream_of(&["ab", "cd", "ef"]))
            .await
            .expect("infallible");
        assert_eq!(acc.len(), 6);
        let mut out = String::new();
        acc.read_to_string(&mut out).expect("in-memory read");
        assert_eq!(out, "abcdef");
        assert!(acc.is_empty());
    }

    #[tokio::test]
    async fn test_should_keep_every_chunk_for_any_count() {
        for count in 1..=20 {
            let chunks: Vec<&'static str> = (0..count)
                .map(|i| if i % 2 == 0 { "x" } else { "yz" })
                .collect();
            let expected: String = chunks.concat();
            let acc = AccumulatedBody::collect(stream_of(&chunks))
                .await
                .expect("infallible");
            assert_eq!(acc.into_bytes(), Bytes::from(expected));
        }
    }

    #[tokio::test]
    async fn test_should_skip_empty_chunks() {
        let acc = AccumulatedBody::collect(stream_of(&["", "a", "", "b"]))
            .await
            .expect("infallible");
        assert_eq!(acc.into_bytes(), Bytes::from_static(b"ab"));
    }

    #[test]
    fn test_should_read_across_chunk_boundaries_with_small_buffer() {
        let mut acc = AccumulatedBody::new();
        acc.push(Bytes::from_static(b"abc"));
        acc.push(Bytes::from_static(b"de"));
        let mut buf = [0_u8; 2];
        let mut out = Vec::new();
        loop {
            let n = acc.read(&mut buf).expect("in-memory read");
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"abcde");
    }

    #[tokio::test]
    async fn test_should_answer_404_with_empty_body_on_endpoint_not_found() {
        let mut conn = connection("<x/>");
        conn.endpoint_not_found();
        let response = conn.close();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());
    }

    #[test]
    fn test_should_derive_status_from_fault_code() {
        let cases = [
            (Some(FaultCode::soap12_sender()), StatusCode::BAD_REQUEST),
            (Some(FaultCode::soap11_client()), StatusCode::BAD_REQUEST),
            (Some(FaultCode::soap12_receiver()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                Some(FaultCode::new(Some("urn:custom"), "Oops")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (None, StatusCode::OK),
        ];
        for (code, expected) in cases {
            let mut conn = connection("");
            conn.set_fault_code(code.as_ref());
            assert_eq!(conn.close().status(), expected, "fault code {code:?}");
        }
    }

    #[test]
    fn test_should_keep_first_status_signal() {
        let mut conn = connection("");
        conn.endpoint_not_found();
        conn.set_fault_code(Some(&FaultCode::soap12_sender()));
        conn.set_fault(false);
        assert_eq!(conn.close().status(), StatusCode::NOT_FOUND);

        let mut conn = connection("");
        conn.set_fault_code(Some(&FaultCode::soap12_sender()));
        conn.send_bytes(b"<fault/>").expect("first send");
        assert_eq!(conn.close().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_map_legacy_fault_flag() {
        let mut conn = connection("");
        conn.set_fault(true);
        assert_eq!(conn.close().status(), StatusCode::INTERNAL_SERVER_ERROR);
        let mut conn = connection("");
        conn.set_fault(false);
        assert_eq!(conn.close().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_answer_200_after_send() {
        let mut conn = connection("<ping/>");
        let mut request = String::new();
        conn.request_stream()
            .read_to_string(&mut request)
            .expect("in-memory read");
        conn.send_bytes(format!("<pong>{request}</pong>").as_bytes())
            .expect("first send");
        let response = conn.close();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, Bytes::from_static(b"<pong><ping/></pong>"));
    }

    #[test]
    fn test_should_reject_second_send() {
        let mut conn = connection("");
        conn.send_bytes(b"one").expect("first send");
        let err = conn.send_bytes(b"two").unwrap_err();
        assert!(matches!(err, ReceiverError::Io(ref e) if e.kind() == io::ErrorKind::AlreadyExists));
    }

    #[test]
    fn test_should_default_to_202_without_signal() {
        let conn = connection("<x/>");
        assert!(!conn.status().is_set());
        let response = conn.close();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_should_expose_request_headers_and_append_response_headers() {
        let mut headers = HeaderMap::new();
        headers.append("soapaction", HeaderValue::from_static("\"urn:echo\""));
        headers.append("x-multi", HeaderValue::from_static("a"));
        headers.append("x-multi", HeaderValue::from_static("b"));
        let mut conn = ServerConnection::new(
            "http://example.com:80/ws".to_owned(),
            headers,
            AccumulatedBody::new(),
        );
        let mut names: Vec<&str> = conn.header_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["soapaction", "x-multi"]);
        assert_eq!(conn.request_headers("X-Multi").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(conn.request_headers("absent").count(), 0);
        assert_eq!(conn.uri(), "http://example.com:80/ws");
        assert!(!conn.has_error());
        assert!(conn.error_message().is_none());

        conn.add_response_header("X-Trace", "1").expect("valid header");
        conn.add_response_header("X-Trace", "2").expect("valid header");
        assert!(conn.add_response_header("bad header", "x").is_err());
        let response = conn.close();
        assert_eq!(response.headers().get_all("x-trace").iter().count(), 2);
    }
}
