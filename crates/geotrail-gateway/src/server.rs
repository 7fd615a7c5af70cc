// SPDX-FileCopyrightText: 2026 Geotrail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use geotrail_config::model::GatewayConfig;
use geotrail_core::{GeotrailError, StoreAdapter};
use geotrail_history::LocationService;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LocationService>,
    /// Probed by `/health`.
    pub store: Arc<dyn StoreAdapter>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<LocationService>, store: Arc<dyn StoreAdapter>) -> Self {
        Self {
            service,
            store,
            start_time: Instant::now(),
        }
    }
}

/// Build the application router.
///
/// - GET /api/locations
/// - GET /api/device/{number}/history?days=N
/// - GET /api/devices
/// - GET /api/debug/gps-logs
/// - GET /health
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/locations", get(handlers::get_locations))
        .route("/api/device/{number}/history", get(handlers::get_device_history))
        .route("/api/devices", get(handlers::get_devices))
        .route("/api/debug/gps-logs", get(handlers::get_gps_logs))
        .route("/health", get(handlers::get_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until `cancel` fires.
pub async fn start_server(
    config: &GatewayConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), GeotrailError> {
    let addr = bind_addr(&config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GeotrailError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;
    serve(listener, state, cancel).await
}

/// `host:port` for binding. IP literals go through [`SocketAddr`] so IPv6
/// hosts come out bracketed.
fn bind_addr(host: &str, port: u16) -> String {
    let host = host.trim();
    match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port).to_string(),
        Err(_) => format!("{host}:{port}"),
    }
}

/// Serve on an already-bound listener with graceful shutdown on `cancel`.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), GeotrailError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway server listening on {addr}");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| GeotrailError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_brackets_ipv6() {
        assert_eq!(bind_addr("::1", 5003), "[::1]:5003");
        assert_eq!(bind_addr("0.0.0.0", 5003), "0.0.0.0:5003");
        assert_eq!(bind_addr("localhost", 8080), "localhost:8080");
    }

    #[tokio::test]
    async fn start_server_binds_an_ipv6_host() {
        // Hosts without an IPv6 loopback have nothing to check.
        if std::net::TcpListener::bind("[::1]:0").is_err() {
            return;
        }
        let harness = geotrail_test_utils::TestHarness::builder().build().await.unwrap();
        let store = harness.store();
        let service = Arc::new(LocationService::new(store.clone(), &harness.config.history));
        let config = GatewayConfig {
            host: "::1".to_string(),
            port: 0,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        start_server(&config, AppState::new(service, store), cancel)
            .await
            .unwrap();
    }
}
