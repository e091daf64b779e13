/// User domain types shared by the store, the services and the routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::InvalidFormat("role".to_string())),
        }
    }
}

/// Stored user record. The password hash never leaves the process.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,
    pub name: String,
    pub surname: String,
    pub phone_number: String,
    pub is_blocked: bool,
    /// Names of the groups the user belongs to
    pub groups: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Input for user creation; role and profile fields take their defaults.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: Vec<u8>,
}

/// Partial profile update. Absent or blank fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
}

impl UserPatch {
    /// Column/value pairs that actually change something.
    pub fn changes(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("surname", &self.surname),
            ("username", &self.username),
            ("phone_number", &self.phone_number),
        ]
        .into_iter()
        .filter_map(|(column, value)| match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Some((column, v)),
            _ => None,
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }
}
