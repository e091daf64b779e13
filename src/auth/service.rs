/// Authentication orchestrator
///
/// Ties the store, the credential hasher, the token codec, the revocation
/// tracker and the notification channel together. Holds no per-request
/// state; every collaborator is a shared handle.
///
/// Every operation runs under `operation_timeout`. On expiry the in-flight
/// future is dropped, which cancels the pending store/cache/channel call.
/// Ordering inside each operation guarantees a timeout never leaves a user
/// without a password hash and never issues tokens past the revocation gate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::claims::ROLE;
use crate::auth::jwt::{TokenCodec, TokenPair};
use crate::auth::password::CredentialHasher;
use crate::auth::revocation::RevocationTracker;
use crate::error::{AppError, AuthError, ErrorKind, WithOp};
use crate::models::NewUser;
use crate::notification::NotificationChannel;
use crate::storage::UserStore;
use crate::validators::{is_valid_email, is_valid_password, is_valid_username, require_non_empty};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationTracker>,
    notifications: Arc<dyn NotificationChannel>,
    hasher: CredentialHasher,
    tokens: TokenCodec,
    operation_timeout: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationTracker>,
        notifications: Arc<dyn NotificationChannel>,
        hasher: CredentialHasher,
        tokens: TokenCodec,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            users,
            revocations,
            notifications,
            hasher,
            tokens,
            operation_timeout,
        }
    }

    /// Register a new user and return its ID.
    ///
    /// # Errors
    /// - `AuthError::UserExists` if the username (or, racing, the email) is taken
    /// - validation, hashing and store errors as they occur
    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> Result<Uuid, AppError> {
        const OP: &str = "service.auth.sign_up";

        self.within_deadline(async {
            let username = is_valid_username(username)?;
            let email = is_valid_email(email)?;
            is_valid_password(password)?;

            if self.users.user_by_name(&username).await?.is_some() {
                return Err(AuthError::UserExists.into());
            }

            let password_hash = self.hash_password(password).await?;

            self.users
                .create_user(NewUser {
                    username,
                    email,
                    password_hash,
                })
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::Conflict => AuthError::UserExists.into(),
                    _ => e,
                })
        })
        .await
        .with_op(OP)
    }

    /// Verify credentials and issue a fresh token pair.
    ///
    /// Unknown usernames fail with `UserNotFound`, wrong passwords with
    /// `InvalidCredentials`. The HTTP layer answers both identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        const OP: &str = "service.auth.login";

        self.within_deadline(async {
            require_non_empty("username", username)?;
            require_non_empty("password", password)?;

            let user = self
                .users
                .user_by_name(username.trim())
                .await?
                .ok_or(AuthError::UserNotFound)?;

            if !self.verify_password(password, &user.password_hash).await? {
                return Err(AuthError::InvalidCredentials.into());
            }
            if user.is_blocked {
                return Err(AuthError::AccountBlocked.into());
            }

            self.tokens.issue_pair(&user, Utc::now())
        })
        .await
        .with_op(OP)
    }

    /// Exchange a refresh token for a new pair, consuming the old one.
    ///
    /// Steps: verify the token, check the revocation set, mark it consumed,
    /// resolve the subject from the old claims, issue the new pair. If
    /// marking fails no pair is issued. If another request consumed the same
    /// token first, this one fails with `TokenRevoked`.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        const OP: &str = "service.auth.refresh_token";

        self.within_deadline(async {
            let claims = self.tokens.parse_and_verify(refresh_token)?;
            if claims.get(ROLE).is_some() {
                // access tokens cannot be exchanged
                return Err(AuthError::TokenMalformed.into());
            }

            if self.revocations.is_consumed(refresh_token).await? {
                return Err(AuthError::TokenRevoked.into());
            }
            if !self.revocations.mark_consumed(refresh_token).await? {
                return Err(AuthError::TokenRevoked.into());
            }

            let subject = claims.subject()?;
            let user = self
                .users
                .user_by_uuid(subject)
                .await?
                .ok_or(AuthError::UserNotFound)?;
            if user.is_blocked {
                return Err(AuthError::AccountBlocked.into());
            }

            self.tokens.issue_pair(&user, Utc::now())
        })
        .await
        .with_op(OP)
    }

    /// Hand a password-reset request for `email` to the notification channel.
    ///
    /// The email string is forwarded exactly as given.
    pub async fn reset_password(&self, email: &str) -> Result<(), AppError> {
        const OP: &str = "service.auth.reset_password";

        self.within_deadline(async {
            require_non_empty("email", email)?;

            if !self.users.email_exists(email).await? {
                return Err(AuthError::EmailNotFound.into());
            }

            self.notifications.publish_password_reset(email).await
        })
        .await
        .with_op(OP)
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    async fn within_deadline<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.operation_timeout)),
        }
    }

    // bcrypt is CPU-bound; keep it off the async workers
    async fn hash_password(&self, password: &str) -> Result<Vec<u8>, AppError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, password_hash: &[u8]) -> Result<bool, AppError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        let password_hash = password_hash.to_vec();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?
    }
}
