// ABOUTME: HTTP middleware used across the router
// ABOUTME: CORS policies for the public widget surface and the owner dashboard

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

pub mod cors;

pub use cors::{permissive_cors, setup_cors};
