use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, DatabaseError, WithOp};
use crate::models::{NewUser, User, UserPatch};
use crate::storage::UserStore;

const USER_COLUMNS: &str = "id, username, email, role, pass_hash, name, surname, \
                            phone_number, is_blocked, created_at, modified_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    role: String,
    pass_hash: Vec<u8>,
    name: String,
    surname: String,
    phone_number: String,
    is_blocked: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|_| DatabaseError::InvalidRow(format!("unknown role '{}'", row.role)))?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            role,
            password_hash: row.pass_hash,
            name: row.name,
            surname: row.surname,
            phone_number: row.phone_number,
            is_blocked: row.is_blocked,
            groups: Vec::new(),
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn group_names(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT g.name
            FROM groups g
            JOIN users_groups ug ON g.id = ug.group_id
            WHERE ug.user_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn user_by_name(&self, username: &str) -> Result<Option<User>, AppError> {
        const OP: &str = "storage.postgres.user_by_name";

        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .with_op(OP)?;

        row.map(User::try_from).transpose().with_op(OP)
    }

    async fn user_by_uuid(&self, id: Uuid) -> Result<Option<User>, AppError> {
        const OP: &str = "storage.postgres.user_by_uuid";

        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_op(OP)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut user = User::try_from(row).with_op(OP)?;
        user.groups = self.group_names(id).await.with_op(OP)?;

        Ok(Some(user))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        const OP: &str = "storage.postgres.email_exists";

        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .with_op(OP)
    }

    async fn create_user(&self, user: NewUser) -> Result<Uuid, AppError> {
        const OP: &str = "storage.postgres.create_user";

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, pass_hash)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .with_op(OP)?;

        tracing::debug!(user_id = %id, "User row inserted");
        Ok(id)
    }

    async fn patch_user(&self, id: Uuid, patch: &UserPatch) -> Result<User, AppError> {
        const OP: &str = "storage.postgres.patch_user";

        let changes = patch.changes();
        if changes.is_empty() {
            return Err(DatabaseError::NoFieldsToUpdate).with_op(OP);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut fields = builder.separated(", ");
            for (column, value) in changes {
                // column names come from UserPatch::changes, never from input
                fields.push(format!("{} = ", column));
                fields.push_bind_unseparated(value.to_string());
            }
            fields.push("modified_at = now()");
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {}", USER_COLUMNS));

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .with_op(OP)?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
            .with_op(OP)?;

        let mut user = User::try_from(row).with_op(OP)?;
        user.groups = self.group_names(id).await.with_op(OP)?;

        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        const OP: &str = "storage.postgres.delete_user";

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_op(OP)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", id))).with_op(OP);
        }

        Ok(())
    }
}
