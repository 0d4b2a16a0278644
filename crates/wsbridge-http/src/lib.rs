//! HTTP layer for wsbridge: classification, document serving, and the stream
//! bridge into a synchronous message engine.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> WsBridgeService (hyper Service, request id)
//!     -> Dispatcher::route
//!        GET <name>.wsdl, published  -> serve_wsdl  (LocationRewriter)
//!        GET <name>.xsd,  published  -> serve_xsd   (LocationRewriter)
//!        anything else               -> serve_message
//!            -> AccumulatedBody::collect (all chunks, in order)
//!            -> spawn_blocking(MessageReceiver::receive(&mut ServerConnection))
//!            -> ServerConnection::close (set-once status, one buffer)
//!   <- HTTP Response (x-request-id, Server)
//! ```
//!
//! The whole request body is held in memory before the engine runs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wsbridge_core::{DocumentRegistry, WsBridgeConfig};
//! use wsbridge_http::{Dispatcher, LocationRewriter, NotImplementedReceiver, WsBridgeService};
//!
//! let config = WsBridgeConfig::default();
//! let rewriter = LocationRewriter::from_config(&config).expect("default expressions compile");
//! let dispatcher = Dispatcher::new(
//!     DocumentRegistry::builder().build(),
//!     rewriter,
//!     Arc::new(NotImplementedReceiver),
//! );
//! let service = WsBridgeService::new(dispatcher);
//! // Use `service` with a hyper server.
//! ```

pub mod body;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod receiver;
pub mod request;
pub mod rewrite;
pub mod router;
pub mod service;
pub mod status;

pub use body::WsResponseBody;
pub use connection::{AccumulatedBody, ServerConnection};
pub use dispatch::{Dispatcher, Route};
pub use error::BridgeError;
pub use receiver::{FaultCode, MessageReceiver, NotImplementedReceiver, ReceiverError};
pub use request::RequestBase;
pub use rewrite::LocationRewriter;
pub use service::WsBridgeService;
pub use status::ExchangeStatus;
