/// Durable user store
///
/// Trait seam over the user table so the services can run against Postgres
/// in production and in-memory fakes in tests.

mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, User, UserPatch};

pub use postgres::PostgresUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Credential lookup. `groups` is left empty.
    async fn user_by_name(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Full profile, group memberships included.
    async fn user_by_uuid(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Atomic insert. A taken username or email is a unique-constraint violation.
    async fn create_user(&self, user: NewUser) -> Result<Uuid, AppError>;

    /// Applies the non-blank fields of `patch`.
    ///
    /// Fails with `DatabaseError::NoFieldsToUpdate` when nothing would change.
    async fn patch_user(&self, id: Uuid, patch: &UserPatch) -> Result<User, AppError>;

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError>;
}
