//! Core types, configuration, and the document registry for wsbridge.
//!
//! This crate holds the state that is fixed at startup and shared read-only by
//! every exchange: the configuration, the published WSDL and XSD documents,
//! and the last-modified lookup used for cache validation.

pub mod config;
pub mod document;
mod error;
pub mod last_modified;

pub use config::WsBridgeConfig;
pub use document::{DocumentKind, DocumentRegistry, DocumentRegistryBuilder, DocumentSource};
pub use error::{WsBridgeError, WsBridgeResult};
