/// Authentication module
///
/// Credential hashing, token issuing/verification, refresh-token
/// revocation and the orchestrator that drives the token lifecycle.

mod claims;
mod jwt;
mod password;
mod revocation;
mod service;

pub use claims::{ClaimValue, Claims};
pub use jwt::{TokenCodec, TokenPair};
pub use password::CredentialHasher;
pub use revocation::{RedisRevocationTracker, RevocationTracker};
pub use service::AuthService;
