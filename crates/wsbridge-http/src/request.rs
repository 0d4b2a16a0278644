//! Request-derived values shared by the handlers.
//!
//! [`RequestBase`] is the effective `scheme://host:port` of the exchange, taken
//! from the absolute request URI when the client sent one and from the `Host`
//! header otherwise. The port is always explicit.

use chrono::{DateTime, Utc};
use http::header::HOST;
use http::uri::Authority;

const DEFAULT_HOST: &str = "localhost";

/// Effective scheme, host, and port of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBase {
    scheme: String,
    host: String,
    port: u16,
}

impl RequestBase {
    /// Build from explicit parts.
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Derive the base from request parts.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        let scheme = parts.uri.scheme_str().unwrap_or("http").to_ascii_lowercase();

        let authority = parts.uri.authority().cloned().or_else(|| {
            parts
                .headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<Authority>().ok())
        });

        let (host, port) = match authority {
            Some(authority) => (
                authority.host().to_owned(),
                authority.port_u16().unwrap_or_else(|| default_port(&scheme)),
            ),
            None => (DEFAULT_HOST.to_owned(), default_port(&scheme)),
        };

        Self { scheme, host, port }
    }

    /// The scheme, lowercase.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host name or address literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port, explicit or the scheme default.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `scheme://host:port` with no path.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// The exchange URI: origin, path, and query. Fragments are never included.
    #[must_use]
    pub fn exchange_uri(&self, uri: &http::Uri) -> String {
        let mut out = self.origin();
        out.push_str(uri.path());
        if let Some(query) = uri.query() {
            out.push('?');
            out.push_str(query);
        }
        out
    }
}

fn default_port(scheme: &str) -> u16 {
    if scheme == "https" { 443 } else { 80 }
}

/// Format a timestamp as an HTTP-date (`Sun, 06 Nov 1994 08:49:37 GMT`).
#[must_use]
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP-date header value.
#[must_use]
pub fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S GMT") {
        return Some(dt.and_utc());
    }
    None
}
