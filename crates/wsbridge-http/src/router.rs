//! Request classification.
//!
//! A GET whose decoded path ends in `.wsdl` or `.xsd` is a candidate document
//! fetch for the file name in its last segment; everything else belongs to the
//! message path. Whether the candidate is actually published is decided by the
//! [`Dispatcher`](crate::dispatch::Dispatcher), which falls back to the message
//! path on a miss.

use http::Method;
use percent_encoding::percent_decode_str;
use wsbridge_core::DocumentKind;

/// Result of classifying a request by method and path alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A GET for `<name>.wsdl` or `<name>.xsd`.
    Document {
        /// Which map to look the name up in.
        kind: DocumentKind,
        /// The file name without directory or extension.
        name: String,
    },
    /// Anything else.
    Message,
}

/// Classify a request. WSDL is checked before XSD.
#[must_use]
pub fn classify(method: &Method, path: &str) -> Classification {
    if method != Method::GET {
        return Classification::Message;
    }
    let path = decode_uri_component(path);
    for kind in [DocumentKind::Wsdl, DocumentKind::Xsd] {
        if path.ends_with(kind.suffix()) {
            return Classification::Document {
                kind,
                name: extract_filename(&path),
            };
        }
    }
    Classification::Message
}

/// Extract the file name from a URL path: the last segment with any path
/// parameters (`;jsessionid=...`) and extension removed.
#[must_use]
pub fn extract_filename(path: &str) -> String {
    let end = path.find([';', '?']).unwrap_or(path.len());
    let path = &path[..end];
    let start = path.rfind('/').map_or(0, |i| i + 1);
    let segment = &path[start..];
    let stem = segment.rfind('.').map_or(segment, |dot| &segment[..dot]);
    stem.to_owned()
}

fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(kind: DocumentKind, name: &str) -> Classification {
        Classification::Document {
            kind,
            name: name.to_owned(),
        }
    }

    #[test]
    fn test_should_classify_wsdl_and_xsd_gets() {
        assert_eq!(
            classify(&Method::GET, "/ws/echo.wsdl"),
            document(DocumentKind::Wsdl, "echo")
        );
        assert_eq!(
            classify(&Method::GET, "/ws/schemas/types.xsd"),
            document(DocumentKind::Xsd, "types")
        );
    }

    #[test]
    fn test_should_route_other_methods_to_message_path() {
        assert_eq!(classify(&Method::POST, "/ws/echo.wsdl"), Classification::Message);
        assert_eq!(classify(&Method::PUT, "/ws/types.xsd"), Classification::Message);
    }

    #[test]
    fn test_should_route_other_paths_to_message_path() {
        assert_eq!(classify(&Method::GET, "/ws/echo"), Classification::Message);
        assert_eq!(classify(&Method::GET, "/ws/echo.wsdl/x"), Classification::Message);
        assert_eq!(classify(&Method::GET, "/ws/echo.WSDL"), Classification::Message);
    }

    #[test]
    fn test_should_decode_percent_encoded_names() {
        assert_eq!(
            classify(&Method::GET, "/ws/hello%20world.wsdl"),
            document(DocumentKind::Wsdl, "hello world")
        );
    }

    #[test]
    fn test_should_extract_filename() {
        assert_eq!(extract_filename("/a/b/echo.wsdl"), "echo");
        assert_eq!(extract_filename("echo.wsdl"), "echo");
        assert_eq!(extract_filename("/a/v1.2.xsd"), "v1.2");
        assert_eq!(extract_filename("/a/echo;jsessionid=1"), "echo");
        assert_eq!(extract_filename("/a/"), "");
    }
}
