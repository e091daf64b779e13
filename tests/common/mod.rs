//! Shared test harness: in-memory stand-ins for Postgres and Redis, plus an
//! in-process server bound to a random port.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use user_management::auth::{AuthService, CredentialHasher, RevocationTracker, TokenCodec};
use user_management::configuration::JwtSettings;
use user_management::error::{AppError, DatabaseError};
use user_management::models::{NewUser, Role, User, UserPatch};
use user_management::notification::NotificationChannel;
use user_management::startup::{run, AppState};
use user_management::storage::UserStore;
use user_management::users::UserService;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: TEST_SECRET.to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604_800,
    }
}

// --- Durable store ---

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn block(&self, username: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.values_mut().find(|u| u.username == username) {
            user.is_blocked = true;
        }
    }

    pub fn add_to_group(&self, username: &str, group: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.values_mut().find(|u| u.username == username) {
            user.groups.push(group.to_string());
            user.groups.sort();
        }
    }

    pub fn remove(&self, username: &str) {
        self.users.lock().unwrap().retain(|_, u| u.username != username);
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn user_by_name(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .map(|user| User {
                groups: Vec::new(),
                ..user
            }))
    }

    async fn user_by_uuid(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().any(|u| u.email == email))
    }

    async fn create_user(&self, user: NewUser) -> Result<Uuid, AppError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(DatabaseError::UniqueConstraintViolation("users".to_string()).into());
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        users.insert(
            id,
            User {
                id,
                username: user.username,
                email: user.email,
                role: Role::User,
                password_hash: user.password_hash,
                name: String::new(),
                surname: String::new(),
                phone_number: String::new(),
                is_blocked: false,
                groups: Vec::new(),
                created_at: now,
                modified_at: now,
            },
        );
        Ok(id)
    }

    async fn patch_user(&self, id: Uuid, patch: &UserPatch) -> Result<User, AppError> {
        let changes = patch.changes();
        if changes.is_empty() {
            return Err(DatabaseError::NoFieldsToUpdate.into());
        }

        let mut users = self.users.lock().unwrap();
        if let Some(username) = patch.username.as_deref() {
            if users.values().any(|u| u.id != id && u.username == username) {
                return Err(DatabaseError::UniqueConstraintViolation("username".to_string()).into());
            }
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))?;
        for (column, value) in changes {
            let value = value.to_string();
            match column {
                "name" => user.name = value,
                "surname" => user.surname = value,
                "username" => user.username = value,
                "phone_number" => user.phone_number = value,
                _ => unreachable!("unknown column {}", column),
            }
        }
        user.modified_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        match self.users.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(id.to_string()).into()),
        }
    }
}

/// Never answers within any reasonable deadline.
pub struct StalledUserStore;

#[async_trait]
impl UserStore for StalledUserStore {
    async fn user_by_name(&self, _username: &str) -> Result<Option<User>, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn user_by_uuid(&self, _id: Uuid) -> Result<Option<User>, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn email_exists(&self, _email: &str) -> Result<bool, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(false)
    }

    async fn create_user(&self, _user: NewUser) -> Result<Uuid, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Uuid::new_v4())
    }

    async fn patch_user(&self, _id: Uuid, _patch: &UserPatch) -> Result<User, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(DatabaseError::NoFieldsToUpdate.into())
    }

    async fn delete_user(&self, _id: Uuid) -> Result<(), AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

/// Which call of a [`StallingUserStore`] never returns
#[derive(Clone, Copy)]
pub enum Stall {
    ProfileLookup,
    Insert,
}

/// Delegates to an in-memory store except for one call, which hangs.
pub struct StallingUserStore {
    pub inner: Arc<InMemoryUserStore>,
    pub stall: Stall,
}

impl StallingUserStore {
    pub fn new(stall: Stall) -> Self {
        Self {
            inner: Arc::new(InMemoryUserStore::default()),
            stall,
        }
    }
}

#[async_trait]
impl UserStore for StallingUserStore {
    async fn user_by_name(&self, username: &str) -> Result<Option<User>, AppError> {
        self.inner.user_by_name(username).await
    }

    async fn user_by_uuid(&self, id: Uuid) -> Result<Option<User>, AppError> {
        if let Stall::ProfileLookup = self.stall {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.user_by_uuid(id).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        self.inner.email_exists(email).await
    }

    async fn create_user(&self, user: NewUser) -> Result<Uuid, AppError> {
        if let Stall::Insert = self.stall {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.create_user(user).await
    }

    async fn patch_user(&self, id: Uuid, patch: &UserPatch) -> Result<User, AppError> {
        self.inner.patch_user(id, patch).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        self.inner.delete_user(id).await
    }
}

// --- Revocation cache ---

#[derive(Default)]
pub struct InMemoryRevocationTracker {
    consumed: Mutex<HashSet<String>>,
}

impl InMemoryRevocationTracker {
    pub fn contains(&self, token: &str) -> bool {
        self.consumed.lock().unwrap().contains(token)
    }
}

#[async_trait]
impl RevocationTracker for InMemoryRevocationTracker {
    async fn is_consumed(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.contains(token))
    }

    async fn mark_consumed(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.consumed.lock().unwrap().insert(token.to_string()))
    }
}

/// Cache that is reachable for reads but refuses writes, or refuses both.
pub struct UnreachableRevocationTracker {
    pub reads_succeed: bool,
}

#[async_trait]
impl RevocationTracker for UnreachableRevocationTracker {
    async fn is_consumed(&self, _token: &str) -> Result<bool, AppError> {
        if self.reads_succeed {
            Ok(false)
        } else {
            Err(AppError::Cache("connection refused".to_string()))
        }
    }

    async fn mark_consumed(&self, _token: &str) -> Result<bool, AppError> {
        Err(AppError::Cache("connection refused".to_string()))
    }
}

// --- Notification channel ---

#[derive(Default)]
pub struct RecordingChannel {
    published: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn publish_password_reset(&self, email: &str) -> Result<(), AppError> {
        self.published.lock().unwrap().push(email.to_string());
        Ok(())
    }
}

pub struct UnreachableChannel;

#[async_trait]
impl NotificationChannel for UnreachableChannel {
    async fn publish_password_reset(&self, _email: &str) -> Result<(), AppError> {
        Err(AppError::Broker("channel closed".to_string()))
    }
}

// --- Wiring ---

pub struct TestServices {
    pub auth: AuthService,
    pub store: Arc<InMemoryUserStore>,
    pub revocations: Arc<InMemoryRevocationTracker>,
    pub notifications: Arc<RecordingChannel>,
}

// bcrypt's minimum cost keeps the suite fast
pub fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(4)
}

pub fn auth_service() -> TestServices {
    let store = Arc::new(InMemoryUserStore::default());
    let revocations = Arc::new(InMemoryRevocationTracker::default());
    let notifications = Arc::new(RecordingChannel::default());

    let auth = AuthService::new(
        store.clone(),
        revocations.clone(),
        notifications.clone(),
        test_hasher(),
        TokenCodec::new(&jwt_settings()),
        Duration::from_secs(5),
    );

    TestServices {
        auth,
        store,
        revocations,
        notifications,
    }
}

pub struct TestApp {
    pub address: String,
    pub services: TestServices,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let services = auth_service();
    let state = AppState {
        auth: services.auth.clone(),
        users: UserService::new(services.store.clone(), Duration::from_secs(5)),
    };

    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, services }
}
