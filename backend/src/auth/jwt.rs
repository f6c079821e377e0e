//! JWT token generation and validation
//!
//! Access and refresh tokens are signed with separate secrets and
//! pre-computed keys. A refresh token cannot pass access-token
//! validation (or vice versa) because the key spaces are disjoint and
//! the embedded token type is checked.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role, present on access tokens only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
}

impl Claims {
    /// Parse the subject as a user ID
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| anyhow::anyhow!("Invalid subject in token"))
    }
}

/// Pre-computed key pair for one token type
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// JWT service configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub access_token_expiry_secs: i64,
    pub refresh_token_expiry_secs: i64,
}

/// JWT service for token operations
///
/// Design: Uses pre-computed keys to avoid expensive key derivation
/// on every request. Keys are wrapped in Arc for cheap cloning.
#[derive(Clone)]
pub struct JwtService {
    access_keys: JwtKeys,
    refresh_keys: JwtKeys,
    config: JwtConfig,
}

impl JwtService {
    /// Create a new JWT service with pre-computed keys
    ///
    /// Call this once at application startup and store in AppState.
    /// Do NOT create per-request.
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
    ) -> Self {
        Self {
            access_keys: JwtKeys::new(access_secret),
            refresh_keys: JwtKeys::new(refresh_secret),
            config: JwtConfig {
                access_token_expiry_secs,
                refresh_token_expiry_secs,
            },
        }
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user_id: Uuid, email: &str, role: &str) -> Result<String> {
        self.generate_token(
            user_id,
            email,
            Some(role),
            "access",
            &self.access_keys,
            self.config.access_token_expiry_secs,
        )
    }

    /// Generate a refresh token for a user
    ///
    /// The returned string is only half of the story: validity is
    /// decided by byte-comparison against the session store, not by
    /// the signature alone.
    pub fn generate_refresh_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        self.generate_token(
            user_id,
            email,
            None,
            "refresh",
            &self.refresh_keys,
            self.config.refresh_token_expiry_secs,
        )
    }

    /// Generate a token with specified type, keys and expiry
    fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: Option<&str>,
        token_type: &str,
        keys: &JwtKeys,
        expiry_secs: i64,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expiry_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.map(str::to_string),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, keys.encoding())
            .map_err(|e| anyhow::anyhow!("Failed to generate {} token: {}", token_type, e))
    }

    /// Validate an access token and return its claims
    ///
    /// Fails closed: expired, malformed, bad-signature and wrong-type
    /// tokens all produce the same opaque error.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, &self.access_keys, "access")
    }

    /// Validate a refresh token and return its claims
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, &self.refresh_keys, "refresh")
    }

    fn validate(&self, token: &str, keys: &JwtKeys, expected_type: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, keys.decoding(), &Validation::default())
            .map_err(|_| anyhow::anyhow!("Invalid token"))?;

        if token_data.claims.token_type != expected_type {
            return Err(anyhow::anyhow!("Invalid token"));
        }

        Ok(token_data.claims)
    }

    /// Get access token expiry in seconds
    pub fn access_token_expiry_secs(&self) -> i64 {
        self.config.access_token_expiry_secs
    }

    /// Get refresh token expiry in seconds
    pub fn refresh_token_expiry_secs(&self) -> i64 {
        self.config.refresh_token_expiry_secs
    }
}
