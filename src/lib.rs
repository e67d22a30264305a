// ABOUTME: Main library entry point for the Widjet widget platform
// ABOUTME: Serves the loader script, assembled configs, chat relay and owner dashboard API

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # Widjet Server
//!
//! Backend for Widjet, an embeddable website widget. Customer sites include
//! a single script tag; the script fetches its configuration from this
//! server, renders the widget, and relays visitor chat by polling. Widget
//! owners manage settings, content and conversations through a separate
//! dashboard API on the same server.
//!
//! ## Surfaces
//!
//! - **Widget delivery**: the loader script and the assembled per-widget
//!   config payload, served to any origin
//! - **Chat relay**: visitor send/poll/clear plus owner replies, with
//!   capability-token access control per conversation
//! - **Dashboard**: email-code login, widget settings, content collections,
//!   conversations, branding extraction and subscription status
//! - **Webhooks**: signed install/uninstall callbacks from the site-builder
//!
//! ## Quick Start
//!
//! 1. Set `JWT_SECRET` and `DATABASE_URL` in the environment
//! 2. Start the server with the `widjet-server` binary
//! 3. Embed `<script src="http://localhost:8080/widget-loader.js" data-widget-id="...">`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use widjet_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = ServerConfig::from_env()?;
//!     config.validate()?;
//!
//!     println!("Widjet server configured with HTTP port {}", config.http_port);
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the server binary (src/bin/) and integration
// tests (tests/). They must remain `pub` so external consumers can access them.

/// Owner session tokens, visitor capability tokens and login codes
pub mod auth;

/// Short-TTL memoization of assembled widget configs
pub mod cache;

/// Configuration management sourced from the environment
pub mod config;

/// Application constants and the widget color palette
pub mod constants;

/// `SQLite` storage for accounts, widgets, content and conversations
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Outbound provider clients (billing, email, scraping, AI assistant)
pub mod external;

/// Production logging and structured output
pub mod logging;

/// HTTP middleware, currently the two CORS policies
pub mod middleware;

/// Common data models shared between storage and the API surface
pub mod models;

/// Centralized resource container handed to every route group
pub mod resources;

/// `HTTP` routes for widget delivery, chat relay and the dashboard
pub mod routes;

/// Router assembly, bind and graceful shutdown
pub mod server;
