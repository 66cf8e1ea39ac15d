//! Credential manager - stateless signed session tokens.
//!
//! Tokens are HS256 JWTs, valid until natural expiry. There is deliberately
//! no revocation store; validation is a pure computation over the token and
//! the process-wide signing key.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{AppResult, AuthError};
use domain::{SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};

/// Session claims carried inside the token. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: Uuid,
    pub username: String,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// Signed access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Issues and validates session tokens with a symmetric key held for the
/// process lifetime.
pub struct TokenManager {
    secret: String,
    expiration_hours: i64,
}

impl TokenManager {
    /// Create new token manager instance
    pub fn new(secret: String, expiration_hours: i64) -> Self {
        Self {
            secret,
            expiration_hours,
        }
    }

    fn secret_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    /// Issue a token with the configured lifetime.
    pub fn issue(&self, user_id: Uuid, username: &str) -> AppResult<TokenResponse> {
        self.issue_with_ttl(user_id, username, Duration::hours(self.expiration_hours))
    }

    /// Issue a token with an explicit lifetime.
    pub fn issue_with_ttl(
        &self,
        user_id: Uuid,
        username: &str,
        ttl: Duration,
    ) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret_bytes()),
        )
        .map_err(AuthError::from)?;

        Ok(TokenResponse {
            access_token: token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    /// Verify the signature, then the expiry. Pure and side-effect free.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; no clock leeway
        validation.leeway = 0;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_bytes()),
            &validation,
        )
        .map_err(AuthError::from)?;

        Ok(token_data.claims)
    }

    /// Configured token lifetime in seconds.
    pub fn expires_in_seconds(&self) -> i64 {
        self.expiration_hours * SECONDS_PER_HOUR
    }
}
