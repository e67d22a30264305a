// ABOUTME: Core data models for the Widjet platform
// ABOUTME: Defines WidgetConfiguration, content items, Conversation, ChatMessage and related types
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Data Models
//!
//! Core data structures shared by the storage layer, the route handlers, and
//! the assembled widget payload.
//!
//! ## Core Models
//!
//! - `WidgetConfiguration`: one owner's widget settings (the embed identity)
//! - `FaqItem` / `ProductCard` / `InstagramPost` / `CustomLink`: ordered
//!   owner-scoped content collections
//! - `Conversation` / `ChatMessage`: the messaging relay's persistent state
//! - `VerificationCode`: passwordless login codes
//! - `AssembledWidgetConfig`: the denormalized payload the loader consumes

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::billing;
use crate::errors::AppError;

/// Owner account, created lazily on first successful code verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Login email, unique
    pub email: String,
    /// Optional display name shown in the dashboard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last successful login time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// One owner's widget settings; `id` is the public embed identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfiguration {
    /// Public widget id, safe to place in third-party pages
    pub id: Uuid,
    /// Owning account, unique per widget
    pub owner_user_id: Uuid,
    /// Name shown in the widget header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Accent color token from the fixed palette
    pub widget_color: String,
    /// Dark theme toggle
    pub is_dark_theme: bool,
    /// Chat avatar image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Brand logo image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Panel background style, `gradient` or `solid`
    pub background_type: String,
    /// FAQ section toggle
    pub faq_enabled: bool,
    /// Instagram section toggle
    pub instagram_enabled: bool,
    /// WhatsApp hand-off toggle
    pub whatsapp_enabled: bool,
    /// AI auto-reply toggle
    pub chatbot_enabled: bool,
    /// Whether the "powered by" badge renders
    pub show_branding: bool,
    /// Prompt text steering the AI assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chatbot_instructions: Option<String>,
    /// Widget UI language code
    pub language: String,
    /// Number for the WhatsApp hand-off button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

/// Question/answer pair rendered in the FAQ section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqItem {
    /// Unique identifier
    pub id: Uuid,
    /// Owning account, internal linkage only
    #[serde(skip_serializing, default)]
    pub owner_user_id: Uuid,
    /// Question text
    pub question: String,
    /// Answer text
    pub answer: String,
    /// Position within the collection, ascending
    pub sort_index: i64,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Product recommendation card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCard {
    /// Unique identifier
    pub id: Uuid,
    /// Owning account, internal linkage only
    #[serde(skip_serializing, default)]
    pub owner_user_id: Uuid,
    /// Product title
    pub title: String,
    /// Short description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Display price, free-form text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Click-through URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    /// Position within the collection, ascending
    pub sort_index: i64,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Instagram post embedded in the widget feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramPost {
    /// Unique identifier
    pub id: Uuid,
    /// Owning account, internal linkage only
    #[serde(skip_serializing, default)]
    pub owner_user_id: Uuid,
    /// Post image URL
    pub image_url: String,
    /// Post caption
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Link to the original post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    /// Position within the collection, ascending
    pub sort_index: i64,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Arbitrary link button shown in the widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomLink {
    /// Unique identifier
    pub id: Uuid,
    /// Owning account, internal linkage only
    #[serde(skip_serializing, default)]
    pub owner_user_id: Uuid,
    /// Button label
    pub label: String,
    /// Target URL
    pub url: String,
    /// Position within the collection, ascending
    pub sort_index: i64,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Message author role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    /// Anonymous site visitor
    Visitor,
    /// Authenticated widget owner
    Owner,
    /// Automated assistant reply
    Ai,
}

impl MessageSender {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visitor => "visitor",
            Self::Owner => "owner",
            Self::Ai => "ai",
        }
    }
}

impl Display for MessageSender {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageSender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visitor" => Ok(Self::Visitor),
            "owner" => Ok(Self::Owner),
            "ai" => Ok(Self::Ai),
            _ => Err(AppError::invalid_input(format!("Invalid message sender: {s}")).into()),
        }
    }
}

/// Chat thread between one widget owner and one anonymous visitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier
    pub id: Uuid,
    /// Owning account, internal linkage only
    #[serde(skip_serializing, default)]
    pub owner_user_id: Uuid,
    /// Widget the visitor was chatting through
    pub widget_id: Uuid,
    /// Opaque client-generated visitor identifier, not secret
    pub visitor_id: String,
    /// Name the visitor supplied, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_name: Option<String>,
    /// Digest of the capability token; the raw token is returned once at
    /// creation and never stored
    #[serde(skip_serializing, default)]
    pub visitor_token_hash: String,
    /// Cached text of the latest message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
    /// Time of the latest message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Visitor messages the owner has not seen yet
    pub unread_count: i64,
    /// Visitor cleared the thread from their widget view
    pub cleared: bool,
    /// When the thread was cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<DateTime<Utc>>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Single message within a conversation, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier
    pub id: Uuid,
    /// Parent conversation
    pub conversation_id: Uuid,
    /// Author role
    pub sender: MessageSender,
    /// Message text, trimmed, 1..=10000 characters
    pub content: String,
    /// Client-supplied idempotency key, unique per conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    /// Creation time; message ordering follows this
    pub created_at: DateTime<Utc>,
}

/// Emailed login code; at most one active per email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    /// Unique identifier
    pub id: Uuid,
    /// Email the code was sent to
    pub email: String,
    /// Six-digit code
    pub code: String,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
    /// Whether the code has been consumed
    pub used: bool,
    /// Issue time
    pub created_at: DateTime<Utc>,
}

/// Subscription plan tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Default tier with basic limits
    Free,
    /// Paid tier with higher limits
    Pro,
}

impl PlanTier {
    /// AI replies allowed per calendar month on this tier
    #[must_use]
    pub const fn ai_message_limit(&self) -> i64 {
        match self {
            Self::Free => billing::FREE_TIER_AI_MESSAGE_LIMIT,
            Self::Pro => billing::PRO_TIER_AI_MESSAGE_LIMIT,
        }
    }

    /// Convert to string for responses
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            _ => Err(AppError::invalid_input(format!("Invalid plan tier: {s}")).into()),
        }
    }
}

/// Denormalized widget payload the loader script fetches on every page load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledWidgetConfig {
    /// Public widget id
    pub widget_id: Uuid,
    /// Name shown in the widget header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Accent color token
    pub widget_color: String,
    /// Dark theme toggle
    pub is_dark_theme: bool,
    /// Chat avatar image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Brand logo image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Panel background style
    pub background_type: String,
    /// FAQ section toggle
    pub faq_enabled: bool,
    /// Instagram section toggle
    pub instagram_enabled: bool,
    /// WhatsApp hand-off toggle
    pub whatsapp_enabled: bool,
    /// AI auto-reply toggle
    pub chatbot_enabled: bool,
    /// Whether the "powered by" badge renders
    pub show_branding: bool,
    /// Widget UI language code
    pub language: String,
    /// Number for the WhatsApp hand-off button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    /// Poll cadence for the chat thread, milliseconds
    pub poll_interval_ms: u64,
    /// FAQ entries, ascending by sort index
    pub faq_items: Vec<FaqItem>,
    /// Product cards, ascending by sort index
    pub product_cards: Vec<ProductCard>,
    /// Instagram posts, ascending by sort index
    pub instagram_posts: Vec<InstagramPost>,
    /// Link buttons, ascending by sort index
    pub custom_links: Vec<CustomLink>,
}

/// Single link discovered during branding extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredLink {
    /// Link text
    pub label: String,
    /// Link target
    pub url: String,
}

/// Result of scraping a site for branding signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingExtraction {
    /// URL the extraction ran against, normalized
    pub source_url: String,
    /// Site name, when discoverable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Discovered logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Nearest palette token to the site's accent color
    pub widget_color: String,
    /// Dark theme guess from background luminance
    pub is_dark_theme: bool,
    /// Navigation links worth importing as custom links
    pub links: Vec<DiscoveredLink>,
    /// True when the provider was unreachable and this is a placeholder
    pub degraded: bool,
}

/// Billing state returned to the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    /// Resolved plan tier
    pub plan: PlanTier,
    /// Raw provider status, `active` or `none`
    pub status: String,
    /// AI replies consumed since the start of the current month, UTC
    pub ai_messages_used: i64,
    /// Monthly allowance for the resolved tier
    pub ai_message_limit: i64,
    /// Usage is at or past 80% of the allowance
    pub approaching_limit: bool,
    /// Usage has reached the allowance
    pub at_limit: bool,
}

impl SubscriptionStatus {
    /// Derive limit booleans from a tier and usage count
    #[must_use]
    pub fn from_usage(plan: PlanTier, status: impl Into<String>, used: i64) -> Self {
        let limit = plan.ai_message_limit();
        let approaching =
            (used as f64) >= (limit as f64) * billing::APPROACHING_LIMIT_RATIO;
        Self {
            plan,
            status: status.into(),
            ai_messages_used: used,
            ai_message_limit: limit,
            approaching_limit: approaching,
            at_limit: used >= limit,
        }
    }
}
