// ABOUTME: Application constants grouped by domain
// ABOUTME: Limits, defaults, the widget color palette, and billing tier thresholds
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! flat list.

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Input validation limits
pub mod limits {
    /// Maximum chat message length in characters, after trimming
    pub const MAX_MESSAGE_LENGTH: usize = 10_000;

    /// Random portion length of a visitor token
    pub const VISITOR_TOKEN_LENGTH: usize = 48;

    /// Digits in an email verification code
    pub const VERIFICATION_CODE_LENGTH: usize = 6;

    /// Minutes before an issued verification code expires
    pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;
}

/// HTTP server behavior
pub mod protocol {
    /// Seconds before an in-flight request is abandoned
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Maximum accepted request body in bytes
    pub const MAX_BODY_BYTES: usize = 256 * 1024;
}

/// Default values applied when configuration fields are absent
pub mod defaults {
    /// Widget accent color token
    pub const WIDGET_COLOR: &str = "blue";

    /// Panel background style
    pub const BACKGROUND_TYPE: &str = "gradient";

    /// Widget UI language
    pub const LANGUAGE: &str = "en";

    /// Poll cadence delivered to the loader script, in milliseconds
    pub const POLL_INTERVAL_MS: u64 = 5_000;

    /// Seconds an assembled config payload stays memoized
    pub const CONFIG_CACHE_TTL_SECS: u64 = 30;

    /// Ceiling on outbound provider calls, in seconds
    pub const PROVIDER_TIMEOUT_SECS: u64 = 10;
}

/// The fixed widget color palette
///
/// Branding extraction maps a scraped accent color onto the nearest entry by
/// Euclidean RGB distance, so widget themes stay within this set.
pub mod palette {
    /// Color tokens with their RGB values
    pub const WIDGET_COLORS: &[(&str, (u8, u8, u8))] = &[
        ("blue", (0x3B, 0x82, 0xF6)),
        ("purple", (0x8B, 0x5C, 0xF6)),
        ("pink", (0xEC, 0x48, 0x99)),
        ("red", (0xEF, 0x44, 0x44)),
        ("orange", (0xF9, 0x73, 0x16)),
        ("yellow", (0xEA, 0xB3, 0x08)),
        ("green", (0x22, 0xC5, 0x5E)),
        ("teal", (0x14, 0xB8, 0xA6)),
        ("black", (0x11, 0x18, 0x27)),
    ];

    /// Hex CSS value for a palette token, falling back to the default color
    #[must_use]
    pub fn hex_for(token: &str) -> &'static str {
        match token {
            "purple" => "#8B5CF6",
            "pink" => "#EC4899",
            "red" => "#EF4444",
            "orange" => "#F97316",
            "yellow" => "#EAB308",
            "green" => "#22C55E",
            "teal" => "#14B8A6",
            "black" => "#111827",
            _ => "#3B82F6",
        }
    }
}

/// Billing tier thresholds
pub mod billing {
    /// AI replies per calendar month on the free tier
    pub const FREE_TIER_AI_MESSAGE_LIMIT: i64 = 50;

    /// AI replies per calendar month on the pro tier
    pub const PRO_TIER_AI_MESSAGE_LIMIT: i64 = 2_000;

    /// Usage fraction at which `approaching_limit` trips
    pub const APPROACHING_LIMIT_RATIO: f64 = 0.8;
}
