// ABOUTME: HTTP server assembly and lifecycle for the Widjet API
// ABOUTME: Router composition, middleware layering, bind and graceful shutdown

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! HTTP server assembly
//!
//! Routes are composed into two surfaces with different CORS policies: the
//! public widget surface (loader, config, chat relay) accepts any origin
//! because it is called from arbitrary customer sites, while dashboard
//! endpoints honor the configured origin list. Webhooks and health probes
//! sit outside both groups.

use crate::constants::protocol::{MAX_BODY_BYTES, REQUEST_TIMEOUT_SECS};
use crate::middleware::{permissive_cors, setup_cors};
use crate::resources::ServerResources;
use crate::routes::{
    AuthRoutes, BillingRoutes, BrandingRoutes, ContentRoutes, ConversationRoutes, HealthRoutes,
    LoaderRoutes, MessageRoutes, WebhookRoutes, WidgetConfigRoutes, WidgetRoutes,
};
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// The Widjet HTTP server
pub struct WidjetServer {
    resources: Arc<ServerResources>,
}

impl WidjetServer {
    /// Create a server around shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Bind the configured port and serve until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the accept loop fails
    pub async fn run(self) -> Result<()> {
        let port = self.resources.config.http_port;
        let router = build_router(&self.resources);

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind HTTP server on {addr}"))?;
        info!("Widjet HTTP server listening on {addr}");

        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server terminated abnormally")
    }
}

/// Compose the full application router
///
/// Exposed separately from [`WidjetServer::run`] so tests can drive the
/// router in-process without binding a port.
#[must_use]
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let widget_surface = Router::new()
        .merge(LoaderRoutes::routes(resources.clone()))
        .merge(WidgetConfigRoutes::routes(resources.clone()))
        .merge(MessageRoutes::routes(resources.clone()))
        .layer(permissive_cors());

    let dashboard = Router::new()
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(WidgetRoutes::routes(resources.clone()))
        .merge(ContentRoutes::routes(resources.clone()))
        .merge(ConversationRoutes::routes(resources.clone()))
        .merge(BrandingRoutes::routes(resources.clone()))
        .merge(BillingRoutes::routes(resources.clone()))
        .layer(setup_cors(&resources.config));

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(widget_surface)
        .merge(dashboard)
        .merge(WebhookRoutes::routes(resources.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Resolve when the process receives Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Ctrl+C received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}
