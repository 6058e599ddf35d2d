mod api;
mod config;
mod cors;
mod db;
mod error;
mod state;
mod store;
mod ws;

use anyhow::Context;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{LogFormat, RelayConfig},
    error::{
        attach_request_id_header, request_id_from_headers_or_generate, with_request_id_scope,
        ErrorCode, RelayError,
    },
    state::RelayState,
    store::MessageStore,
};

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::from_env();
    init_tracing(&config);

    let store = match config.database_url.as_deref() {
        Some(database_url) => MessageStore::connect_postgres(database_url)
            .await
            .context("failed to initialize message store")?,
        None => {
            warn!("PAIRCHAT_RELAY_DATABASE_URL is not set; messages are kept in memory only");
            MessageStore::in_memory()
        }
    };

    if config.allows_any_origin() {
        warn!("CORS allows any origin; set PAIRCHAT_RELAY_FRONTEND_URL in production");
    }

    let state = RelayState::new(store, config.history_limit);
    let app = build_router(state.clone(), &config.frontend_origins);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind relay listener on {}", config.listen_addr))?;

    info!(
        listen_addr = %config.listen_addr,
        store = state.store.backend_name(),
        history_limit = config.history_limit,
        "starting relay server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server exited unexpectedly")
}

fn init_tracing(config: &RelayConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn build_router(state: RelayState, frontend_origins: &str) -> Router {
    apply_middleware(
        Router::new()
            .route("/healthz", get(healthz))
            .merge(ws::router(state.clone()))
            .merge(api::router(state)),
    )
    .layer(cors::cors_layer(frontend_origins))
}

fn apply_middleware(router: Router) -> Router {
    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(panic_handler))
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(signal_error) = tokio::signal::ctrl_c().await {
            error!(error = %signal_error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(signal_error) => {
                error!(error = %signal_error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}

async fn panic_handler(request: Request<Body>, next: Next) -> Response {
    match tokio::spawn(async move { next.run(request).await }).await {
        Ok(response) => response,
        Err(join_error) => {
            error!(?join_error, "request handling panicked");
            RelayError::from_code(ErrorCode::InternalError).into_response()
        }
    }
}

async fn request_context_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from_headers_or_generate(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let mut response = with_request_id_scope(request_id.clone(), next.run(request)).await;
    attach_request_id_header(&mut response, &request_id);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started_at.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}
