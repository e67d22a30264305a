// ABOUTME: Owner session JWTs plus visitor capability tokens and login codes
// ABOUTME: All secret comparisons here are constant-time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::constants::limits::VISITOR_TOKEN_LENGTH;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Marker prefix on visitor capability tokens
const VISITOR_TOKEN_PREFIX: &str = "vt_";

/// JWT claims for owner dashboard sessions
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner user ID
    pub sub: String,
    /// Owner email
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Signs and validates owner session tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a new authentication manager from the shared signing secret
    #[must_use]
    pub fn new(jwt_secret: &str, token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry_hours,
        }
    }

    /// Generate a session token for a logged-in owner
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Validate a session token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, tampered with or expired
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::auth_invalid("Invalid or expired session token"))?;
        Ok(data.claims)
    }

    /// Owner user ID carried in validated claims
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is not a well-formed ID
    pub fn user_id_from_claims(claims: &Claims) -> AppResult<Uuid> {
        Uuid::parse_str(&claims.sub).map_err(|_| AppError::auth_invalid("Malformed session subject"))
    }
}

/// Mint an opaque capability token for a new conversation
///
/// Returned to the visitor exactly once; only its digest is stored.
#[must_use]
pub fn mint_visitor_token() -> String {
    let body: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VISITOR_TOKEN_LENGTH)
        .map(char::from)
        .collect();
    format!("{VISITOR_TOKEN_PREFIX}{body}")
}

/// Digest stored in place of a raw visitor token
#[must_use]
pub fn hash_visitor_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Match a supplied token against the stored digest in constant time
///
/// An omitted or empty token never matches.
#[must_use]
pub fn visitor_token_matches(supplied: Option<&str>, stored_hash: &str) -> bool {
    let Some(token) = supplied else {
        return false;
    };
    if token.is_empty() {
        return false;
    }
    hash_visitor_token(token)
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}

/// Generate a 6-digit email login code
#[must_use]
pub fn generate_login_code() -> String {
    let code: u32 = thread_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

/// Constant-time comparison for submitted login codes
#[must_use]
pub fn codes_match(submitted: &str, stored: &str) -> bool {
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}
