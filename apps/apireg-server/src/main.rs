//! Apireg Server - external API setting registry.
//!
//! Serves `POST /settings` (idempotent registration) and
//! `GET /settings/{settingId}` over HTTP, backed by either an in-process
//! store or a DynamoDB table.
//!
//! # Usage
//!
//! ```text
//! SETTINGS_STORE=dynamodb SETTINGS_TABLE=settings apireg-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `SETTINGS_STORE` | `memory` | `memory` or `dynamodb` |
//! | `SETTINGS_TABLE` | `settings` | DynamoDB table (`DYNAMODB` is accepted too) |
//! | `SETTINGS_CREATE_TABLE` | `false` | Create the table at startup if missing |
//! | `DYNAMODB_ENDPOINT_URL` | *(unset)* | Custom DynamoDB endpoint |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! See [`ApiRegConfig`] for the full list.

mod gateway;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use apireg_core::config::{ApiRegConfig, LogFormat, StoreBackend};
use apireg_core::store::{DynamoDbSettingStore, MemorySettingStore, SettingStore};
use apireg_core::{ApiRegProvider, ApiRegProviderHandler};
use apireg_http::service::{ApiRegHttpConfig, ApiRegHttpService};

use crate::gateway::GatewayService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
    }

    Ok(())
}

/// Construct the configured store.
async fn build_store(config: &ApiRegConfig) -> Result<Arc<dyn SettingStore>> {
    match config.store {
        StoreBackend::Memory => {
            warn!("using in-memory store, settings are lost on restart");
            Ok(Arc::new(MemorySettingStore::new()))
        }
        StoreBackend::DynamoDb => {
            let store = DynamoDbSettingStore::connect(config).await;
            if config.create_table {
                store
                    .ensure_table()
                    .await
                    .with_context(|| format!("failed to prepare table {}", config.table_name))?;
            }
            info!(
                table = %store.table_name(),
                region = %config.default_region,
                endpoint = config.dynamodb_endpoint_url.as_deref().unwrap_or("default"),
                max_attempts = config.store_max_attempts,
                "initialized DynamoDB store",
            );
            Ok(Arc::new(store))
        }
    }
}

/// Wire store, provider, handler, and HTTP service into the gateway.
fn build_gateway(
    config: &ApiRegConfig,
    store: Arc<dyn SettingStore>,
) -> GatewayService<ApiRegProviderHandler> {
    let backend = store.backend();
    let provider = ApiRegProvider::new(store);
    let handler = ApiRegProviderHandler::new(Arc::new(provider));
    let http_config = ApiRegHttpConfig {
        max_body_bytes: config.max_body_bytes,
    };
    GatewayService::new(
        ApiRegHttpService::new(Arc::new(handler), http_config),
        backend,
    )
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: GatewayService<ApiRegProviderHandler>) -> Result<()> {
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

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Address to probe for a given listen address.
fn health_check_addr(listen_addr: &str) -> String {
    listen_addr.replace("0.0.0.0", "127.0.0.1")
}

/// Perform a health check by connecting to the server and requesting `/health`.
///
/// Succeeds if the response is 200 OK and reports a running status.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ApiRegConfig::from_env().context("invalid configuration")?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&health_check_addr(&config.gateway_listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level, config.log_format)?;

    let store = build_store(&config).await?;
    let gateway = build_gateway(&config, store);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        store = %config.store,
        version = VERSION,
        "starting Apireg Server",
    );

    serve(listener, gateway).await
}
