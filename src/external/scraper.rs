// ABOUTME: Site metadata scraping client for branding extraction
// ABOUTME: Guards against request forgery, then maps scraped colors onto the widget palette

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::config::environment::ScraperProviderConfig;
use crate::constants::{defaults, palette};
use crate::errors::{AppError, AppResult};
use crate::models::{BrandingExtraction, DiscoveredLink};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};
use url::{Host, Url};

/// Scraping provider response envelope
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<ScrapeData>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    logo: Option<ScrapeAsset>,
    #[serde(default)]
    image: Option<ScrapeAsset>,
    #[serde(default)]
    links: Vec<ScrapeLink>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeAsset {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    background_color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeLink {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    href: Option<String>,
}

/// Client for the site metadata scraping provider
pub struct ScraperClient {
    config: ScraperProviderConfig,
    http_client: reqwest::Client,
}

impl ScraperClient {
    /// Create a new scraper client
    #[must_use]
    pub fn new(config: ScraperProviderConfig, timeout_secs: u64) -> Self {
        Self {
            config,
            http_client: super::create_client_with_timeout(timeout_secs),
        }
    }

    /// Scrape a site and translate the result into branding suggestions
    ///
    /// The URL must already have passed [`validate_extraction_url`]. A
    /// provider-reported failure is an error; an unreachable provider
    /// degrades to a placeholder built from the URL's host, because this
    /// call feeds interactive onboarding.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider reports a scrape failure or replies
    /// with an unparseable payload
    pub async fn extract_branding(&self, target: &Url) -> AppResult<BrandingExtraction> {
        let mut request = self
            .http_client
            .get(&self.config.base_url)
            .query(&[("url", target.as_str()), ("palette", "true")]);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Scraping provider unreachable, degrading to placeholder: {e}");
                return Ok(Self::placeholder(target));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::dependency(
                "Scraping provider",
                format!("HTTP {status}: {body}"),
            ));
        }

        let scrape: ScrapeResponse = response.json().await.map_err(|e| {
            AppError::dependency("Scraping provider", format!("Malformed response: {e}"))
        })?;

        if scrape.status != "success" {
            let message = scrape
                .message
                .unwrap_or_else(|| "Scrape failed".to_owned());
            return Err(AppError::dependency("Scraping provider", message));
        }

        let data = scrape.data.unwrap_or_default();
        Ok(Self::to_extraction(target, data))
    }

    /// Map raw scrape data onto the widget branding shape
    fn to_extraction(target: &Url, data: ScrapeData) -> BrandingExtraction {
        let accent = [&data.logo, &data.image]
            .into_iter()
            .flatten()
            .find_map(|asset| asset.color.as_deref().and_then(parse_hex_color));
        let background = [&data.logo, &data.image]
            .into_iter()
            .flatten()
            .find_map(|asset| asset.background_color.as_deref().and_then(parse_hex_color));

        let widget_color = accent.map_or_else(
            || defaults::WIDGET_COLOR.to_owned(),
            |rgb| nearest_palette_token(rgb).to_owned(),
        );
        let is_dark_theme = background.is_some_and(|rgb| relative_luminance(rgb) < 0.5);

        let links = data
            .links
            .into_iter()
            .filter_map(|link| {
                let url = link.href?;
                let label = link.text.filter(|t| !t.trim().is_empty())?;
                Some(DiscoveredLink {
                    label: label.trim().to_owned(),
                    url,
                })
            })
            .collect();

        debug!(url = %target, color = %widget_color, "Branding extraction complete");
        BrandingExtraction {
            source_url: target.to_string(),
            site_name: data.title.filter(|t| !t.trim().is_empty()),
            logo_url: data.logo.and_then(|l| l.url),
            widget_color,
            is_dark_theme,
            links,
            degraded: false,
        }
    }

    /// Best-effort result when the provider is down
    fn placeholder(target: &Url) -> BrandingExtraction {
        let site_name = target
            .host_str()
            .map(|host| host.trim_start_matches("www.").to_owned());
        BrandingExtraction {
            source_url: target.to_string(),
            site_name,
            logo_url: None,
            widget_color: defaults::WIDGET_COLOR.to_owned(),
            is_dark_theme: false,
            links: Vec::new(),
            degraded: true,
        }
    }
}

/// Validate a caller-supplied extraction target
///
/// Accepts only http/https URLs whose host does not land in loopback,
/// private, link-local, carrier-NAT or otherwise non-public address space.
/// Hostnames are resolved and every resolved address is checked, so a DNS
/// name pointing at an internal service is rejected the same as a literal IP.
///
/// # Errors
///
/// Returns an invalid-argument error when the URL is malformed, uses a
/// disallowed scheme, does not resolve, or targets blocked address space
pub async fn validate_extraction_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| AppError::invalid_input("Invalid URL"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::invalid_input("URL scheme must be http or https"));
    }

    let host = url
        .host()
        .ok_or_else(|| AppError::invalid_input("URL must include a host"))?;

    match host {
        Host::Ipv4(addr) => {
            if is_blocked_ip(IpAddr::V4(addr)) {
                return Err(AppError::invalid_input("URL targets a disallowed address"));
            }
        }
        Host::Ipv6(addr) => {
            if is_blocked_ip(IpAddr::V6(addr)) {
                return Err(AppError::invalid_input("URL targets a disallowed address"));
            }
        }
        Host::Domain(domain) => {
            let resolved = tokio::net::lookup_host((domain, 80))
                .await
                .map_err(|_| AppError::invalid_input("URL host does not resolve"))?;
            let mut any = false;
            for addr in resolved {
                any = true;
                if is_blocked_ip(addr.ip()) {
                    return Err(AppError::invalid_input(
                        "URL resolves to a disallowed address",
                    ));
                }
            }
            if !any {
                return Err(AppError::invalid_input("URL host does not resolve"));
            }
        }
    }

    Ok(url)
}

/// Whether an address sits in space the scraper must never reach
fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => is_blocked_v6(v6),
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    // 100.64.0.0/10 is carrier-grade NAT space
    let carrier_nat = octets[0] == 100 && (64..=127).contains(&octets[1]);
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || carrier_nat
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_blocked_v4(mapped);
    }
    let segments = ip.segments();
    // fc00::/7 unique-local, fe80::/10 link-local
    let unique_local = (segments[0] & 0xfe00) == 0xfc00;
    let link_local = (segments[0] & 0xffc0) == 0xfe80;
    ip.is_loopback() || ip.is_unspecified() || ip.is_multicast() || unique_local || link_local
}

/// Parse `#RGB` or `#RRGGBB` into RGB components
fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().strip_prefix('#')?;
    match hex.len() {
        3 => {
            let mut components = hex.chars().filter_map(|c| c.to_digit(16));
            let r = components.next()?;
            let g = components.next()?;
            let b = components.next()?;
            Some(((r * 17) as u8, (g * 17) as u8, (b * 17) as u8))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Nearest palette token by Euclidean RGB distance
fn nearest_palette_token(rgb: (u8, u8, u8)) -> &'static str {
    palette::WIDGET_COLORS
        .iter()
        .min_by_key(|(_, candidate)| color_distance_squared(rgb, *candidate))
        .map_or(defaults::WIDGET_COLOR, |(token, _)| token)
}

fn color_distance_squared(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let dr = i32::from(a.0) - i32::from(b.0);
    let dg = i32::from(a.1) - i32::from(b.1);
    let db = i32::from(a.2) - i32::from(b.2);
    (dr * dr + dg * dg + db * db) as u32
}

/// Perceptual luminance in `[0, 1]`
fn relative_luminance(rgb: (u8, u8, u8)) -> f64 {
    let (r, g, b) = rgb;
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0
}
