/// Profile operations for an authenticated user

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{AppError, AuthError, DatabaseError, WithOp};
use crate::models::{User, UserPatch};
use crate::storage::UserStore;
use crate::validators::is_valid_username;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    operation_timeout: Duration,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, operation_timeout: Duration) -> Self {
        Self {
            users,
            operation_timeout,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        const OP: &str = "service.user.get_user";

        tokio::time::timeout(self.operation_timeout, self.users.user_by_uuid(id))
            .await
            .map_err(|_| AppError::Timeout(self.operation_timeout))
            .and_then(|found| found?.ok_or_else(|| AuthError::UserNotFound.into()))
            .with_op(OP)
    }

    /// Applies the non-blank fields of `patch` and returns the updated user.
    pub async fn patch_user(&self, id: Uuid, patch: UserPatch) -> Result<User, AppError> {
        const OP: &str = "service.user.patch_user";

        if patch.is_empty() {
            return Err(DatabaseError::NoFieldsToUpdate).with_op(OP);
        }

        let mut patch = patch;
        if let Some(username) = patch.username.as_deref().filter(|u| !u.trim().is_empty()) {
            patch.username = Some(is_valid_username(username).with_op(OP)?);
        }

        tokio::time::timeout(self.operation_timeout, self.users.patch_user(id, &patch))
            .await
            .map_err(|_| AppError::Timeout(self.operation_timeout))
            .and_then(|result| result)
            .with_op(OP)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        const OP: &str = "service.user.delete_user";

        tokio::time::timeout(self.operation_timeout, self.users.delete_user(id))
            .await
            .map_err(|_| AppError::Timeout(self.operation_timeout))
            .and_then(|result| result)
            .with_op(OP)
    }
}
