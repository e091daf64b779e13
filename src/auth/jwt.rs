/// JWT Token Generation and Validation
///
/// HS256-signed, self-contained access and refresh tokens. Expiry is
/// enforced here, never by storage.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::{Claims, EXPIRES_AT, SUBJECT};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::models::{Role, User};

/// Access and refresh token issued together
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_token_expiry),
            refresh_ttl: Duration::seconds(config.refresh_token_expiry),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Signed token with `{sub, role, exp}` where `exp = now + access TTL`
    pub fn issue_access_token(
        &self,
        subject: Uuid,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        self.sign(&Claims::access(subject, role, now, self.access_ttl))
    }

    /// Signed token with `{sub, exp}` where `exp = now + refresh TTL`
    pub fn issue_refresh_token(&self, subject: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        self.sign(&Claims::refresh(subject, now, self.refresh_ttl))
    }

    pub fn issue_pair(&self, user: &User, now: DateTime<Utc>) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user.id, user.role, now)?,
            refresh_token: self.issue_refresh_token(user.id, now)?,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Signing(e.to_string()))
    }

    /// Verify signature and expiry against the current time
    pub fn parse_and_verify(&self, token: &str) -> Result<Claims, AppError> {
        self.parse_and_verify_at(token, Utc::now())
    }

    /// Verify signature and expiry against `now`
    ///
    /// # Errors
    /// - `AuthError::TokenExpired` once `now >= exp`
    /// - `AuthError::TokenMalformed` for a bad signature, structure or claim type
    pub fn parse_and_verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&[EXPIRES_AT, SUBJECT]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::from(AuthError::TokenMalformed))?;

        let expires_at = claims
            .expires_at()
            .map_err(|_| AppError::from(AuthError::TokenMalformed))?;
        if now.timestamp() >= expires_at {
            return Err(AuthError::TokenExpired.into());
        }

        Ok(claims)
    }
}
