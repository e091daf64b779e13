/// JWT Claims
///
/// The payload is an open claim set. Values are decoded into `ClaimValue`
/// at the codec boundary so callers never inspect raw JSON.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{AppError, AuthError};
use crate::models::Role;

pub const SUBJECT: &str = "sub";
pub const ROLE: &str = "role";
pub const EXPIRES_AT: &str = "exp";
pub const ISSUED_AT: &str = "iat";
pub const TOKEN_ID: &str = "jti";

/// A single claim value as it appears in the token payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for ClaimValue {
    /// Canonical string form: integers without exponent, floats via `f64`'s
    /// shortest round-trip representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimValue::Integer(n) => write!(f, "{}", n),
            ClaimValue::Float(n) => write!(f, "{}", n),
            ClaimValue::Boolean(b) => write!(f, "{}", b),
            ClaimValue::Text(s) => f.write_str(s),
        }
    }
}

/// Claim set carried by access and refresh tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, ClaimValue>);

impl Claims {
    /// `{sub, role, exp, iat, jti}`
    pub fn access(subject: Uuid, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let mut claims = Self::base(subject, issued_at, ttl);
        claims.insert(ROLE, ClaimValue::Text(role.to_string()));
        claims
    }

    /// `{sub, exp, iat, jti}`, no role
    pub fn refresh(subject: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self::base(subject, issued_at, ttl)
    }

    fn base(subject: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let mut claims = Self(BTreeMap::new());
        claims.insert(SUBJECT, ClaimValue::Text(subject.to_string()));
        claims.insert(EXPIRES_AT, ClaimValue::Integer((issued_at + ttl).timestamp()));
        claims.insert(ISSUED_AT, ClaimValue::Integer(issued_at.timestamp()));
        claims.insert(TOKEN_ID, ClaimValue::Text(Uuid::new_v4().to_string()));
        claims
    }

    pub fn insert(&mut self, name: &str, value: ClaimValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.0.get(name)
    }

    /// Claim value in canonical string form
    ///
    /// # Errors
    /// `AuthError::ClaimNotFound` if the claim is absent
    pub fn extract(&self, name: &str) -> Result<String, AppError> {
        self.get(name)
            .map(ClaimValue::to_string)
            .ok_or_else(|| AuthError::ClaimNotFound(name.to_string()).into())
    }

    /// Subject as a user ID
    pub fn subject(&self) -> Result<Uuid, AppError> {
        let sub = self.extract(SUBJECT)?;
        Uuid::parse_str(&sub).map_err(|_| AuthError::TokenMalformed.into())
    }

    /// Present on access tokens only
    pub fn role(&self) -> Option<Role> {
        match self.get(ROLE) {
            Some(ClaimValue::Text(role)) => role.parse().ok(),
            _ => None,
        }
    }

    /// Expiry as a Unix timestamp
    pub fn expires_at(&self) -> Result<i64, AppError> {
        match self.get(EXPIRES_AT) {
            Some(ClaimValue::Integer(exp)) => Ok(*exp),
            Some(ClaimValue::Float(exp)) => Ok(*exp as i64),
            Some(_) => Err(AuthError::TokenMalformed.into()),
            None => Err(AuthError::ClaimNotFound(EXPIRES_AT.to_string()).into()),
        }
    }
}
