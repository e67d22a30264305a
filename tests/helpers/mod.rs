// ABOUTME: Shared test helpers for integration tests
// ABOUTME: Exports the in-process HTTP request builder

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod axum_test;
