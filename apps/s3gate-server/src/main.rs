//! s3gate server: the request-dispatch front end of an S3-compatible gateway.
//!
//! Every request is classified into an S3 operation. Served operations are
//! answered with a description of where they land on the filer; declared but
//! unsupported ones get `501 NotImplemented`; anything else gets
//! `405 MethodNotAllowed`.
//!
//! # Usage
//!
//! ```text
//! S3_DOMAIN_NAME=s3.example.com s3gate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8333` | Bind address |
//! | `S3_DOMAIN_NAME` | *(unset)* | Virtual-host suffix; unset or empty disables it |
//! | `S3_BUCKETS_PATH` | `/buckets` | Filer directory holding buckets |
//! | `S3_FILER` | `localhost:8888` | Filer address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod handler;

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use anyhow::{Context, Result, bail};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use s3gate_http::catalog::OperationCatalog;
use s3gate_http::config::GatewayConfig;
use s3gate_http::dispatch::S3Backend;
use s3gate_http::service::{GatewayService, HEALTH_PATH};

use crate::handler::DescribeBackend;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `RUST_LOG` wins over the configured `LOG_LEVEL` when it is set and non-empty.
fn log_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter> {
    let directives = rust_log.filter(|v| !v.trim().is_empty()).unwrap_or(log_level);
    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter: {directives}"))
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("received Ctrl-C"),
                _ = sigterm.recv() => info!("received SIGTERM"),
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
            tokio::signal::ctrl_c().await.ok();
            info!("received Ctrl-C");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("received Ctrl-C");
}

/// Accept connections until `shutdown` resolves, then drain the open ones.
async fn serve<H, F>(listener: TcpListener, service: GatewayService<H>, shutdown: F)
where
    H: S3Backend,
    F: Future<Output = ()>,
{
    let builder = HttpConnBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            },
            () = &mut shutdown => break,
        };

        let conn = builder
            .serve_connection(TokioIo::new(stream), service.clone())
            .into_owned();
        let conn = graceful.watch(conn);
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(%peer_addr, error = %e, "connection ended with error");
            }
        });
    }

    info!("draining open connections");
    graceful.shutdown().await;
    info!("s3gate stopped");
}

/// Ask the gateway at `addr` for its health document. Succeeds on a `200`.
async fn health_check(addr: &str) -> Result<()> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;
    let request = format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .context("failed to send health request")?;

    let mut status_line = String::new();
    BufReader::new(stream)
        .read_line(&mut status_line)
        .await
        .context("failed to read health response")?;

    match status_code(&status_line) {
        Some(200) => Ok(()),
        Some(code) => bail!("{addr} answered {code}"),
        None => bail!("{addr} sent no HTTP status line"),
    }
}

/// The numeric code of an `HTTP/x.y NNN Reason` status line.
fn status_code(status_line: &str) -> Option<u16> {
    let mut fields = status_line.split_whitespace();
    fields.next().filter(|version| version.starts_with("HTTP/"))?;
    fields.next()?.parse().ok()
}

/// A wildcard bind address is checked through the matching loopback.
fn health_check_address(gateway_listen: &str) -> String {
    match gateway_listen.parse::<SocketAddr>() {
        Ok(addr) if addr.ip().is_unspecified() => {
            let loopback = if addr.is_ipv4() {
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            } else {
                IpAddr::V6(Ipv6Addr::LOCALHOST)
            };
            SocketAddr::new(loopback, addr.port()).to_string()
        }
        _ => gateway_listen.to_owned(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env();

    // Container HEALTHCHECK mode: exit status only, no logging.
    if std::env::args().skip(1).any(|arg| arg == "--health-check") {
        let healthy = health_check(&health_check_address(&config.gateway_listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.log_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid GATEWAY_LISTEN: {}", config.gateway_listen))?;

    let catalog = OperationCatalog::build(config.virtual_host_suffix());
    info!(
        version = VERSION,
        %addr,
        domain_name = ?catalog.domain_suffix(),
        operations = catalog.len(),
        buckets_path = %config.buckets_path,
        filer = %config.filer,
        "starting s3gate",
    );
    let service = GatewayService::new(DescribeBackend::new(&config), catalog);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    serve(listener, service, shutdown_signal()).await;
    Ok(())
}
