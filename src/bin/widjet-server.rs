// ABOUTME: Main server binary for the Widjet platform
// ABOUTME: Loads configuration, prepares storage and runs the HTTP server

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Widjet Server Binary
//!
//! Starts the Widjet backend: widget delivery, the chat relay, and the
//! owner dashboard API, all on one HTTP port.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use widjet_server::{
    config::environment::ServerConfig, database::Database, logging, resources::ServerResources,
    server::WidjetServer,
};

#[derive(Parser)]
#[command(name = "widjet-server")]
#[command(about = "Widjet - embeddable website widget backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle container environments where clap may not work properly
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using configuration from environment");
            Args { http_port: None }
        }
    };

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    config.validate()?;

    logging::init(&config)?;

    info!("Starting Widjet server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url.to_connection_string()).await?;
    info!(
        "Database ready at {}",
        config.database.url.to_connection_string()
    );

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(database, config.clone()));

    display_available_endpoints(&config);

    let server = WidjetServer::new(resources);
    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints with their ports
fn display_available_endpoints(config: &ServerConfig) {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port = config.http_port;

    info!("=== Available API Endpoints ===");
    display_widget_endpoints(&host, port);
    display_auth_endpoints(&host, port);
    display_dashboard_endpoints(&host, port);
    display_webhook_endpoints(&host, port);
    info!("=== End of Endpoint List ===");
}

#[allow(clippy::cognitive_complexity)]
fn display_widget_endpoints(host: &str, port: u16) {
    info!("Widget Delivery & Chat Relay:");
    info!("   Loader Script:     GET  http://{host}:{port}/widget-loader.js");
    info!("   Widget Config:     GET  http://{host}:{port}/api/widget-config?id={{widget_id}}");
    info!("   Send Message:      POST http://{host}:{port}/api/chat/messages");
    info!("   Poll Messages:     GET  http://{host}:{port}/api/chat/messages");
    info!("   Clear Chat:        POST http://{host}:{port}/api/chat/clear");
}

#[allow(clippy::cognitive_complexity)]
fn display_auth_endpoints(host: &str, port: u16) {
    info!("Authentication:");
    info!("   Request Code:      POST http://{host}:{port}/api/auth/request-code");
    info!("   Verify Code:       POST http://{host}:{port}/api/auth/verify-code");
    info!("   Current User:      GET  http://{host}:{port}/api/auth/me");
}

#[allow(clippy::cognitive_complexity)]
fn display_dashboard_endpoints(host: &str, port: u16) {
    info!("Owner Dashboard:");
    info!("   Widget Settings:   GET/PUT http://{host}:{port}/api/widget");
    info!("   Content:           GET/POST http://{host}:{port}/api/content/{{collection}}");
    info!("   Conversations:     GET  http://{host}:{port}/api/conversations");
    info!("   Owner Reply:       POST http://{host}:{port}/api/chat/reply");
    info!("   Branding Extract:  POST http://{host}:{port}/api/branding/extract");
    info!("   Subscription:      GET  http://{host}:{port}/api/billing/subscription");
}

#[allow(clippy::cognitive_complexity)]
fn display_webhook_endpoints(host: &str, port: u16) {
    info!("Webhooks & Health:");
    info!("   Site Builder:      POST http://{host}:{port}/webhooks/site-builder");
    info!("   Health Check:      GET  http://{host}:{port}/health");
    info!("   Readiness:         GET  http://{host}:{port}/ready");
}
