//! XML layer for wsbridge.
//!
//! WSDL and XSD documents are served mostly verbatim, but their address
//! attributes may need rewriting per request. That needs a tree that can be
//! mutated in place and written back without disturbing the rest of the
//! markup, which is what this crate provides on top of quick-xml.
//!
//! # Key components
//!
//! - [`parse`] turns bytes into an owned [`Document`]
//! - [`to_bytes`] / [`write_document`] serialize a document
//! - [`LocationExpression`] selects attributes (or elements) to rewrite
//! - [`XmlError`] covers all of the above

pub mod dom;
pub mod error;
pub mod expression;
pub mod parse;
pub mod serialize;

pub use dom::{
    Attribute, AttributePath, Declaration, Document, Element, ElementPath, Node, NodeRef,
};
pub use error::XmlError;
pub use expression::LocationExpression;
pub use parse::parse;
pub use serialize::{to_bytes, write_document};
