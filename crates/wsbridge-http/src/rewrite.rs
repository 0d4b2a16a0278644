//! Location rewriting for served WSDL and XSD documents.
//!
//! Address attributes in published documents usually point at wherever the
//! document was authored. When rewriting is enabled they are re-based onto the
//! origin the client actually used, so generated clients call back through the
//! same host and port.

use tracing::debug;
use wsbridge_core::{DocumentKind, WsBridgeConfig};
use wsbridge_xml::{Document, LocationExpression, NodeRef, XmlError};

/// Compute the rewritten value of one location.
///
/// - `/path` becomes `origin + context_path + /path`.
/// - `scheme://authority/tail` becomes `origin + /tail`.
/// - Anything else is returned unchanged.
#[must_use]
pub fn transform_location(location: &str, origin: &str, context_path: &str) -> String {
    if location.starts_with('/') {
        return format!("{origin}{context_path}{location}");
    }
    if let Some(sep) = location.find("://") {
        let after = sep + "://".len();
        if let Some(slash) = location[after..].find('/') {
            return format!("{origin}{}", &location[after + slash..]);
        }
    }
    location.to_owned()
}

/// Rewrite every non-empty attribute selected by `expression` in place.
///
/// Element matches are skipped. Returns the number of attributes changed.
pub fn rewrite_locations(
    expression: &LocationExpression,
    document: &mut Document,
    origin: &str,
    context_path: &str,
) -> usize {
    let mut changed = 0;
    for node in expression.evaluate(document) {
        let NodeRef::Attribute(path) = node else {
            continue;
        };
        let Some(attribute) = document.attribute_mut(&path) else {
            continue;
        };
        if attribute.value.is_empty() {
            continue;
        }
        let rewritten = transform_location(&attribute.value, origin, context_path);
        if rewritten != attribute.value {
            debug!(
                expression = %expression,
                from = %attribute.value,
                to = %rewritten,
                "rewrote location"
            );
            attribute.value = rewritten;
            changed += 1;
        }
    }
    changed
}

/// Compiled rewrite settings shared by all document exchanges.
#[derive(Debug, Clone)]
pub struct LocationRewriter {
    location: LocationExpression,
    schema_location: LocationExpression,
    transform_wsdl_locations: bool,
    transform_schema_locations: bool,
    context_path: String,
}

impl LocationRewriter {
    /// Compile both expressions from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidExpression`] if either expression does not
    /// compile.
    pub fn from_config(config: &WsBridgeConfig) -> Result<Self, XmlError> {
        Ok(Self {
            location: LocationExpression::compile(&config.location_expression)?,
            schema_location: LocationExpression::compile(&config.schema_location_expression)?,
            transform_wsdl_locations: config.transform_wsdl_locations,
            transform_schema_locations: config.transform_schema_locations,
            context_path: config.context_path.clone(),
        })
    }

    /// Whether serving a document of `kind` involves any rewrite.
    #[must_use]
    pub fn applies_to(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Wsdl => self.transform_wsdl_locations || self.transform_schema_locations,
            DocumentKind::Xsd => self.transform_schema_locations,
        }
    }

    /// Apply the enabled rewrites for `kind` to `document`.
    pub fn rewrite(&self, kind: DocumentKind, document: &mut Document, origin: &str) -> usize {
        let mut changed = 0;
        if kind == DocumentKind::Wsdl && self.transform_wsdl_locations {
            changed += rewrite_locations(&self.location, document, origin, &self.context_path);
        }
        if self.transform_schema_locations {
            changed +=
                rewrite_locations(&self.schema_location, document, origin, &self.context_path);
        }
        changed
    }
}
