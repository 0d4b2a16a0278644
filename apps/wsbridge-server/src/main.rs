//! wsbridge server.
//!
//! Publishes the WSDL and XSD documents found in `DOCUMENT_DIR` and answers
//! every other request through the message path. No message engine is linked
//! into this binary, so message exchanges are answered with 404.
//!
//! # Usage
//!
//! ```text
//! DOCUMENT_DIR=./wsdl TRANSFORM_WSDL_LOCATIONS=true wsbridge-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `CONTEXT_PATH` | *(empty)* | Context path used when rewriting locations |
//! | `TRANSFORM_WSDL_LOCATIONS` | `false` | Rewrite `location` attributes in WSDL |
//! | `TRANSFORM_SCHEMA_LOCATIONS` | `false` | Rewrite `schemaLocation` attributes |
//! | `LOCATION_EXPRESSION` | `//@location` | Selector for WSDL locations |
//! | `SCHEMA_LOCATION_EXPRESSION` | `//@schemaLocation` | Selector for schema locations |
//! | `DOCUMENT_DIR` | *(unset)* | Directory of `*.wsdl` / `*.xsd` files |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wsbridge_core::{DocumentKind, DocumentRegistry, WsBridgeConfig};
use wsbridge_http::{Dispatcher, LocationRewriter, NotImplementedReceiver, WsBridgeService};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load the published documents named by the configuration.
fn load_documents(config: &WsBridgeConfig) -> Result<DocumentRegistry> {
    let builder = DocumentRegistry::builder();
    let builder = match config.document_dir.as_deref() {
        Some(dir) => builder
            .load_dir(Path::new(dir))
            .with_context(|| format!("failed to load documents from {dir}"))?,
        None => {
            warn!("DOCUMENT_DIR is not set, no documents will be published");
            builder
        }
    };
    Ok(builder.build())
}

/// Assemble the service from configuration.
fn build_service(config: &WsBridgeConfig) -> Result<WsBridgeService> {
    let registry = load_documents(config)?;
    let rewriter =
        LocationRewriter::from_config(config).context("invalid location expression")?;

    info!(
        wsdl = registry.names(DocumentKind::Wsdl).len(),
        xsd = registry.names(DocumentKind::Xsd).len(),
        context_path = %config.context_path,
        transform_wsdl_locations = config.transform_wsdl_locations,
        transform_schema_locations = config.transform_schema_locations,
        "initialized document registry",
    );

    let dispatcher = Dispatcher::new(registry, rewriter, Arc::new(NotImplementedReceiver));
    Ok(WsBridgeService::new(dispatcher))
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: WsBridgeService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = WsBridgeConfig::from_env();
    init_tracing(&config.log_level)?;

    let service = build_service(&config)?;

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, version = VERSION, "starting wsbridge server");

    serve(listener, service).await
}
