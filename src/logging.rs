// ABOUTME: Tracing subscriber setup for the server binary
// ABOUTME: Picks the output format per environment and quiets chatty dependencies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Logging initialization
//!
//! The subscriber is installed once at startup. `RUST_LOG` wins outright when
//! set; otherwise the configured level applies to this crate and the noise
//! directives keep dependency output at sane levels.

use crate::config::environment::{Environment, LogLevel, ServerConfig};
use anyhow::Result;
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Dependency crates pinned to calmer levels in the default filter
const NOISE_DIRECTIVES: &[&str] = &[
    "hyper=warn",
    "reqwest=warn",
    "rustls=warn",
    "sqlx=warn",
    "tower_http=info",
];

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    /// Line-per-record JSON for log shippers
    Json,
    /// Human-readable output for local work
    Pretty,
}

impl LogFormat {
    /// Production ships JSON; everywhere else reads better pretty.
    /// `LOG_FORMAT` overrides either way.
    fn resolve(environment: &Environment) -> Self {
        match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            Ok("pretty") => Self::Pretty,
            _ if environment.is_production() => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Install the global tracing subscriber
///
/// # Errors
///
/// Returns an error when a subscriber is already installed
pub fn init(config: &ServerConfig) -> Result<()> {
    let filter = build_filter(&config.log_level);
    let format = LogFormat::resolve(&config.environment);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(io::stdout),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(io::stdout))
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        format = ?format,
        "Logging initialized"
    );
    Ok(())
}

/// Default filter: configured level for this crate, info plus the noise
/// directives for everything else
fn build_filter(level: &LogLevel) -> EnvFilter {
    if let Ok(spec) = env::var(EnvFilter::DEFAULT_ENV) {
        return EnvFilter::new(spec);
    }
    let mut spec = format!("info,widjet_server={level}");
    for directive in NOISE_DIRECTIVES {
        spec.push(',');
        spec.push_str(directive);
    }
    EnvFilter::new(spec)
}
