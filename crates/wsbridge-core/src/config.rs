//! wsbridge configuration.
//!
//! Configuration values are loaded from environment variables once at
//! startup and are read-only afterwards.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default selector for WSDL address locations.
pub const DEFAULT_LOCATION_EXPRESSION: &str = "//@location";

/// Default selector for schema locations.
pub const DEFAULT_SCHEMA_LOCATION_EXPRESSION: &str = "//@schemaLocation";

/// Service configuration.
///
/// # Examples
///
/// ```
/// use wsbridge_core::config::WsBridgeConfig;
///
/// let config = WsBridgeConfig::builder()
///     .context_path("/ctx".to_owned())
///     .transform_wsdl_locations(true)
///     .build();
/// assert_eq!(config.location_expression, "//@location");
/// assert!(!config.transform_schema_locations);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct WsBridgeConfig {
    /// Bind address for the listener (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Context-path prefix the service is mounted under, empty for the root.
    #[builder(default)]
    pub context_path: String,

    /// Rewrite `location` attributes of served WSDL documents.
    #[builder(default = false)]
    pub transform_wsdl_locations: bool,

    /// Rewrite `schemaLocation` attributes of served WSDL and XSD documents.
    #[builder(default = false)]
    pub transform_schema_locations: bool,

    /// Selector for WSDL address locations.
    #[builder(default = String::from(DEFAULT_LOCATION_EXPRESSION))]
    pub location_expression: String,

    /// Selector for schema locations.
    #[builder(default = String::from(DEFAULT_SCHEMA_LOCATION_EXPRESSION))]
    pub schema_location_expression: String,

    /// Directory scanned at startup for `*.wsdl` and `*.xsd` files.
    #[builder(default)]
    pub document_dir: Option<String>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for WsBridgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WsBridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `CONTEXT_PATH` | *(empty)* |
    /// | `TRANSFORM_WSDL_LOCATIONS` | `false` |
    /// | `TRANSFORM_SCHEMA_LOCATIONS` | `false` |
    /// | `LOCATION_EXPRESSION` | `//@location` |
    /// | `SCHEMA_LOCATION_EXPRESSION` | `//@schemaLocation` |
    /// | `DOCUMENT_DIR` | *(unset)* |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("CONTEXT_PATH") {
            config.context_path = normalize_context_path(&v);
        }
        if let Some(v) = lookup("TRANSFORM_WSDL_LOCATIONS") {
            config.transform_wsdl_locations = parse_bool(&v);
        }
        if let Some(v) = lookup("TRANSFORM_SCHEMA_LOCATIONS") {
            config.transform_schema_locations = parse_bool(&v);
        }
        if let Some(v) = lookup("LOCATION_EXPRESSION") {
            config.location_expression = v;
        }
        if let Some(v) = lookup("SCHEMA_LOCATION_EXPRESSION") {
            config.schema_location_expression = v;
        }
        if let Some(v) = lookup("DOCUMENT_DIR") {
            config.document_dir = Some(v).filter(|d| !d.trim().is_empty());
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Normalize a context path to either `""` or `/a/b` (leading slash, no
/// trailing slash).
#[must_use]
pub fn normalize_context_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Parse a boolean from an environment variable value.
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
