// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Handles environment-sourced configs and runtime validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration module for the Widjet server
//!
//! All configuration is environment-sourced; `environment::ServerConfig` is
//! the single entry point and validates itself on load.

/// Environment and server configuration
pub mod environment;

pub use environment::ServerConfig;
