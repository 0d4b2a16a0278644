//! WSDL and XSD fetches.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{CONTENT_TYPE, HeaderValue, IF_MODIFIED_SINCE, LAST_MODIFIED};
use http::{HeaderMap, Method, StatusCode};
use tracing::debug;
use wsbridge_core::{DocumentKind, DocumentSource};

use crate::body::WsResponseBody;
use crate::error::BridgeError;
use crate::handler::{empty_response, method_not_allowed};
use crate::request::{RequestBase, format_http_date, parse_http_date};
use crate::rewrite::LocationRewriter;

/// Serve a WSDL definition.
///
/// Applies the location rewrite and the schema-location rewrite when each is
/// enabled.
pub fn serve_wsdl(
    parts: &http::request::Parts,
    source: &DocumentSource,
    rewriter: &LocationRewriter,
) -> Result<http::Response<WsResponseBody>, BridgeError> {
    serve_document(DocumentKind::Wsdl, parts, source, rewriter)
}

/// Serve an XSD schema.
///
/// Applies the schema-location rewrite when enabled.
pub fn serve_xsd(
    parts: &http::request::Parts,
    source: &DocumentSource,
    rewriter: &LocationRewriter,
) -> Result<http::Response<WsResponseBody>, BridgeError> {
    serve_document(DocumentKind::Xsd, parts, source, rewriter)
}

fn serve_document(
    kind: DocumentKind,
    parts: &http::request::Parts,
    source: &DocumentSource,
    rewriter: &LocationRewriter,
) -> Result<http::Response<WsResponseBody>, BridgeError> {
    if parts.method != Method::GET {
        return Ok(method_not_allowed(&Method::GET));
    }

    let last_modified = source.last_modified().map(DateTime::<Utc>::from);
    if let Some(last_modified) = last_modified {
        if not_modified(&parts.headers, last_modified) {
            debug!(%kind, name = source.name(), "document not modified");
            let mut response = empty_response(StatusCode::NOT_MODIFIED);
            set_last_modified(response.headers_mut(), last_modified);
            return Ok(response);
        }
    }

    let payload = if rewriter.applies_to(kind) {
        let origin = RequestBase::from_parts(parts).origin();
        let mut document = source.document().clone();
        let changed = rewriter.rewrite(kind, &mut document, &origin);
        debug!(%kind, name = source.name(), %origin, changed, "rewrote document locations");
        wsbridge_xml::to_bytes(&document).map_err(|err| BridgeError::Serialize {
            name: source.name().to_owned(),
            source: err,
        })?
    } else {
        source.content().clone()
    };

    Ok(xml_response(payload, last_modified))
}

fn xml_response(
    payload: Bytes,
    last_modified: Option<DateTime<Utc>>,
) -> http::Response<WsResponseBody> {
    let mut response = http::Response::new(WsResponseBody::from_bytes(payload));
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime::TEXT_XML.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Some(last_modified) = last_modified {
        set_last_modified(headers, last_modified);
    }
    response
}

fn set_last_modified(headers: &mut HeaderMap, time: DateTime<Utc>) {
    if let Ok(value) = HeaderValue::from_str(&format_http_date(time)) {
        headers.insert(LAST_MODIFIED, value);
    }
}

/// HTTP dates have one-second resolution, so compare whole seconds.
fn not_modified(headers: &HeaderMap, last_modified: DateTime<Utc>) -> bool {
    headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
        .is_some_and(|since| last_modified.timestamp() <= since.timestamp())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use http_body_util::BodyExt;
    use wsbridge_core::WsBridgeConfig;

    use super::*;

    const WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/">
  <import location="/ws/common.wsdl"/>
  <service name="Echo"><port name="EchoPort"><soap:address location="http://localhost:9000/ws/echo"/></port></service>
</definitions>"#;

    const XSD: &str = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"><xsd:include schemaLocation="/ws/common.xsd"/></xsd:schema>"#;

    fn request(method: Method, uri: &str) -> http::request::Parts {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "example.com:8080")
            .body(())
            .expect("valid request")
            .into_parts()
            .0
    }

    fn rewriter(wsdl: bool, schema: bool) -> LocationRewriter {
        let config = WsBridgeConfig::builder()
            .transform_wsdl_locations(wsdl)
            .transform_schema_locations(schema)
            .context_path("/ctx".to_owned())
            .build();
        LocationRewriter::from_config(&config).expect("valid expressions")
    }

    async fn body_string(response: http::Response<WsResponseBody>) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("infallible body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn test_should_serve_document_verbatim_when_rewrite_disabled() {
        let source = DocumentSource::from_bytes("echo", WSDL).expect("valid");
        let response = serve_wsdl(
            &request(Method::GET, "/ws/echo.wsdl"),
            &source,
            &rewriter(false, false),
        )
        .expect("served");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/xml");
        assert!(response.headers().get(LAST_MODIFIED).is_none());
        assert_eq!(body_string(response).await, WSDL);
    }

    #[tokio::test]
    async fn test_should_reject_non_get_without_body() {
        let source = DocumentSource::from_bytes("types", XSD).expect("valid");
        for method in [Method::POST, Method::PUT, Method::HEAD, Method::DELETE] {
            let response = serve_xsd(
                &request(method.clone(), "/ws/types.xsd"),
                &source,
                &rewriter(true, true),
            )
            .expect("served");
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(response.headers()[http::header::ALLOW], "GET");
            assert!(body_string(response).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_should_rewrite_wsdl_locations_for_request_origin() {
        let source = DocumentSource::from_bytes("echo", WSDL).expect("valid");
        let response = serve_wsdl(
            &request(Method::GET, "/ctx/ws/echo.wsdl"),
            &source,
            &rewriter(true, false),
        )
        .expect("served");
        let body = body_string(response).await;
        assert!(body.contains(r#"location="http://example.com:8080/ctx/ws/common.wsdl""#));
        assert!(body.contains(r#"location="http://example.com:8080/ws/echo""#));
        assert!(body.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    }

    #[tokio::test]
    async fn test_should_rewrite_only_schema_locations_in_xsd() {
        let source = DocumentSource::from_bytes("types", XSD).expect("valid");
        let response = serve_xsd(
            &request(Method::GET, "/ctx/ws/types.xsd"),
            &source,
            &rewriter(false, true),
        )
        .expect("served");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/xml");
        let body = body_string(response).await;
        assert!(body.contains(r#"schemaLocation="http://example.com:8080/ctx/ws/common.xsd""#));
    }

    #[tokio::test]
    async fn test_should_ignore_wsdl_flag_for_xsd() {
        let source = DocumentSource::from_bytes("types", XSD).expect("valid");
        let response = serve_xsd(
            &request(Method::GET, "/ws/types.xsd"),
            &source,
            &rewriter(true, false),
        )
        .expect("served");
        assert_eq!(body_string(response).await, XSD);
    }

    #[tokio::test]
    async fn test_should_answer_not_modified_for_fresh_copy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("echo.wsdl");
        std::fs::write(&path, WSDL).expect("write wsdl");
        let source = DocumentSource::from_file("echo", &path).expect("loadable");
        let mtime: DateTime<Utc> = source.last_modified().expect("file mtime").into();

        let response = serve_wsdl(
            &request(Method::GET, "/ws/echo.wsdl"),
            &source,
            &rewriter(false, false),
        )
        .expect("served");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[LAST_MODIFIED],
            format_http_date(mtime).as_str()
        );

        let mut parts = request(Method::GET, "/ws/echo.wsdl");
        parts.headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&format_http_date(mtime)).expect("valid header"),
        );
        let response = serve_wsdl(&parts, &source, &rewriter(false, false)).expect("served");
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(body_string(response).await.is_empty());

        let stale = DateTime::<Utc>::from(SystemTime::UNIX_EPOCH + Duration::from_secs(1));
        let mut parts = request(Method::GET, "/ws/echo.wsdl");
        parts.headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&format_http_date(stale)).expect("valid header"),
        );
        let response = serve_wsdl(&parts, &source, &rewriter(false, false)).expect("served");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
