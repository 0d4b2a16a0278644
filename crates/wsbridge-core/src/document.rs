//! Published WSDL and XSD documents.
//!
//! Documents are registered once at startup through a
//! [`DocumentRegistryBuilder`]; the resulting [`DocumentRegistry`] has no
//! mutation API and is shared read-only by every exchange.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use tracing::{debug, info};
use url::Url;
use wsbridge_xml::Document;

use crate::error::{WsBridgeError, WsBridgeResult};
use crate::last_modified;

/// The two kinds of published document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// A WSDL definition, served for `GET <name>.wsdl`.
    Wsdl,
    /// An XSD schema, served for `GET <name>.xsd`.
    Xsd,
}

impl DocumentKind {
    /// Request path suffix that selects this kind.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Wsdl => ".wsdl",
            Self::Xsd => ".xsd",
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wsdl => "wsdl",
            Self::Xsd => "xsd",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("wsdl") {
            Some(Self::Wsdl)
        } else if ext.eq_ignore_ascii_case("xsd") {
            Some(Self::Xsd)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, immutable XML document plus the origin it was loaded from.
///
/// The content is parsed once on construction; handlers clone the parsed tree
/// only when they need to rewrite it.
#[derive(Clone)]
pub struct DocumentSource {
    name: String,
    content: Bytes,
    document: Arc<Document>,
    origin: Option<String>,
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSource")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("len", &self.content.len())
            .finish_non_exhaustive()
    }
}

impl DocumentSource {
    /// Create a source from in-memory XML.
    ///
    /// # Errors
    ///
    /// Returns [`WsBridgeError::Document`] if the content is not well-formed.
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> WsBridgeResult<Self> {
        let name = name.into();
        let content = content.into();
        let document = wsbridge_xml::parse(&content).map_err(|source| WsBridgeError::Document {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            content,
            document: Arc::new(document),
            origin: None,
        })
    }

    /// Load a source from a file, recording its `file:` URL as the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not well-formed.
    pub fn from_file(name: impl Into<String>, path: &Path) -> WsBridgeResult<Self> {
        let content = std::fs::read(path).map_err(|source| WsBridgeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let source = Self::from_bytes(name, content)?;
        let absolute = std::path::absolute(path).map_err(|source| WsBridgeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(match Url::from_file_path(&absolute) {
            Ok(url) => source.with_origin(url.as_str()),
            Err(()) => source,
        })
    }

    /// Attach an origin identifier (URI-like) used for last-modified lookup.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Logical name the document is published under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original bytes.
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// The parsed tree.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Origin identifier, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Modification time of the origin, `None` if unknown.
    #[must_use]
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.origin.as_deref().and_then(last_modified::resolve)
    }
}

/// Read-only maps of published WSDL definitions and XSD schemas, keyed by
/// logical name.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    wsdl: HashMap<String, DocumentSource>,
    xsd: HashMap<String, DocumentSource>,
}

impl DocumentRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> DocumentRegistryBuilder {
        DocumentRegistryBuilder::default()
    }

    /// Look up a document by kind and name.
    #[must_use]
    pub fn get(&self, kind: DocumentKind, name: &str) -> Option<&DocumentSource> {
        self.map(kind).get(name)
    }

    /// Names published for `kind`, sorted.
    #[must_use]
    pub fn names(&self, kind: DocumentKind) -> Vec<&str> {
        let mut names: Vec<&str> = self.map(kind).keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Total number of published documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wsdl.len() + self.xsd.len()
    }

    /// Whether no documents are published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map(&self, kind: DocumentKind) -> &HashMap<String, DocumentSource> {
        match kind {
            DocumentKind::Wsdl => &self.wsdl,
            DocumentKind::Xsd => &self.xsd,
        }
    }
}

/// Builder for [`DocumentRegistry`].
#[derive(Debug, Default)]
pub struct DocumentRegistryBuilder {
    registry: DocumentRegistry,
}

impl DocumentRegistryBuilder {
    /// Publish a document under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`WsBridgeError::Duplicate`] if the name is already taken for
    /// this kind.
    pub fn add(mut self, kind: DocumentKind, source: DocumentSource) -> WsBridgeResult<Self> {
        let map = match kind {
            DocumentKind::Wsdl => &mut self.registry.wsdl,
            DocumentKind::Xsd => &mut self.registry.xsd,
        };
        if map.contains_key(source.name()) {
            return Err(WsBridgeError::Duplicate {
                kind,
                name: source.name().to_owned(),
            });
        }
        map.insert(source.name().to_owned(), source);
        Ok(self)
    }

    /// Publish every `*.wsdl` and `*.xsd` file directly inside `dir` under
    /// its file stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed, a file cannot be
    /// read or parsed, or two files share a stem and kind.
    pub fn load_dir(mut self, dir: &Path) -> WsBridgeResult<Self> {
        let io_err = |source| WsBridgeError::Io {
            path: dir.display().to_string(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Some(kind) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(DocumentKind::from_extension)
            else {
                debug!(path = %path.display(), "skipping non-document file");
                continue;
            };
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = DocumentSource::from_file(name, &path)?;
            self = self.add(kind, source)?;
        }
        Ok(self)
    }

    /// Finish registration.
    #[must_use]
    pub fn build(self) -> DocumentRegistry {
        for kind in [DocumentKind::Wsdl, DocumentKind::Xsd] {
            for name in self.registry.names(kind) {
                info!(%kind, name, "published {name}{}", kind.suffix());
            }
        }
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XSD: &str = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"/>"#;

    #[test]
    fn test_should_reject_malformed_document() {
        let err = DocumentSource::from_bytes("broken", "<a>").unwrap_err();
        assert!(matches!(err, WsBridgeError::Document { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_should_look_up_by_kind_and_name() {
        let registry = DocumentRegistry::builder()
            .add(
                DocumentKind::Xsd,
                DocumentSource::from_bytes("types", XSD).expect("valid"),
            )
            .expect("unique")
            .build();
        assert!(registry.get(DocumentKind::Xsd, "types").is_some());
        assert!(registry.get(DocumentKind::Wsdl, "types").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_should_reject_duplicate_names_per_kind() {
        let source = DocumentSource::from_bytes("types", XSD).expect("valid");
        let err = DocumentRegistry::builder()
            .add(DocumentKind::Xsd, source.clone())
            .and_then(|b| b.add(DocumentKind::Xsd, source.clone()))
            .unwrap_err();
        assert!(matches!(err, WsBridgeError::Duplicate { kind: DocumentKind::Xsd, .. }));

        // Same name under the other kind is fine.
        let registry = DocumentRegistry::builder()
            .add(DocumentKind::Xsd, source.clone())
            .and_then(|b| b.add(DocumentKind::Wsdl, source))
            .expect("distinct kinds")
            .build();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_should_load_documents_from_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join("echo.wsdl"),
            r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"/>"#,
        )
        .expect("write wsdl");
        std::fs::write(dir.path().join("echo.xsd"), XSD).expect("write xsd");
        std::fs::write(dir.path().join("README.txt"), "ignored").expect("write txt");

        let registry = DocumentRegistry::builder()
            .load_dir(dir.path())
            .expect("loadable")
            .build();

        assert_eq!(registry.names(DocumentKind::Wsdl), vec!["echo"]);
        assert_eq!(registry.names(DocumentKind::Xsd), vec!["echo"]);
        let wsdl = registry.get(DocumentKind::Wsdl, "echo").expect("published");
        assert!(wsdl.origin().is_some_and(|o| o.starts_with("file://")));
        assert!(wsdl.last_modified().is_some());
    }

    #[test]
    fn test_should_have_unknown_last_modified_without_origin() {
        let source = DocumentSource::from_bytes("types", XSD).expect("valid");
        assert!(source.last_modified().is_none());
        let remote = source.with_origin("http://example.com/types.xsd");
        assert!(remote.last_modified().is_none());
    }

    #[test]
    fn test_should_report_kind_suffixes() {
        assert_eq!(DocumentKind::Wsdl.suffix(), ".wsdl");
        assert_eq!(DocumentKind::Xsd.suffix(), ".xsd");
        assert_eq!(DocumentKind::Xsd.to_string(), "xsd");
    }
}
