use std::{net::SocketAddr, ops::RangeInclusive, path::Path};

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

use crate::{auth, config::AppConfig, pages, predict, state::AppState};

/// Ports tried in order when no port is configured.
pub const FALLBACK_PORTS: RangeInclusive<u16> = 5002..=5010;

pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();
    Router::new()
        .merge(auth::router())
        .merge(predict::predict_routes(config.max_upload_bytes))
        .merge(pages::page_routes(Path::new(&config.static_dir)))
        .with_state(state)
        .layer(cors_layer(&config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Binds the configured port, or the first free one in [`FALLBACK_PORTS`].
pub async fn bind(config: &AppConfig) -> anyhow::Result<TcpListener> {
    match config.port {
        Some(port) => {
            let addr: SocketAddr = format!("{}:{}", config.host, port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", config.host, port))?;
            TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind {addr}"))
        }
        None => bind_first_available(&config.host, FALLBACK_PORTS).await,
    }
}

pub async fn bind_first_available(
    host: &str,
    ports: RangeInclusive<u16>,
) -> anyhow::Result<TcpListener> {
    let (first, last) = (*ports.start(), *ports.end());
    for port in ports {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!(port, error = %e, "port unavailable"),
        }
    }
    anyhow::bail!("No available port in range {first}-{last}")
}

pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("listening on {}", addr);
    info!("Open in browser: http://127.0.0.1:{}/", addr.port());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
