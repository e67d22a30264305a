// ABOUTME: Short-TTL memoization of assembled widget configs
// ABOUTME: Loses nothing on restart; per-widget entries expire independently
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::models::AssembledWidgetConfig;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// One memoized config assembly
#[derive(Debug, Clone)]
struct CachedConfig {
    config: AssembledWidgetConfig,
    /// When the entry expires
    expires_at: DateTime<Utc>,
}

/// Thread-safe TTL cache keyed by public widget ID
///
/// Widget edits invalidate eagerly; everything else rides out the TTL.
#[derive(Clone)]
pub struct ConfigCache {
    entries: Arc<RwLock<HashMap<Uuid, CachedConfig>>>,
    ttl_secs: i64,
}

impl ConfigCache {
    /// Create a cache whose entries live for `ttl_secs` seconds
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Fresh entry for a widget, if one exists
    pub async fn get(&self, widget_id: Uuid) -> Option<AssembledWidgetConfig> {
        let result = {
            let entries = self.entries.read().await;
            entries.get(&widget_id).and_then(|cached| {
                if cached.expires_at > Utc::now() {
                    Some(cached.config.clone())
                } else {
                    None
                }
            })
        };
        if result.is_some() {
            debug!(widget_id = %widget_id, "Serving widget config from cache");
        }
        result
    }

    /// Store a freshly assembled config
    pub async fn insert(&self, widget_id: Uuid, config: AssembledWidgetConfig) {
        let expires_at = Utc::now() + Duration::seconds(self.ttl_secs);
        let mut entries = self.entries.write().await;
        entries.insert(widget_id, CachedConfig { config, expires_at });
    }

    /// Drop a widget's entry after its owner edits settings or content
    pub async fn invalidate(&self, widget_id: Uuid) {
        let mut entries = self.entries.write().await;
        if entries.remove(&widget_id).is_some() {
            debug!(widget_id = %widget_id, "Invalidated cached widget config");
        }
    }
}
