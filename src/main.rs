use std::net::TcpListener;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use user_management::auth::{AuthService, CredentialHasher, RedisRevocationTracker, TokenCodec};
use user_management::configuration::get_configuration;
use user_management::notification::RedisQueueChannel;
use user_management::startup::{run, AppState};
use user_management::storage::PostgresUserStore;
use user_management::telemetry::init_telemetry;
use user_management::users::UserService;

fn startup_error(kind: std::io::ErrorKind, what: &str) -> std::io::Error {
    std::io::Error::new(kind, what.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info,sqlx=warn");

    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    configuration.validate().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    tracing::info!("Configuration loaded successfully");

    // Durable store
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(configuration.database.with_db())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        startup_error(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Storage initialized");

    // Revocation cache and notification queue share one Redis connection
    let redis_client = redis::Client::open(configuration.redis.url.as_str()).map_err(|e| {
        tracing::error!("Invalid Redis URL: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Redis configuration error")
    })?;
    let redis = redis::aio::ConnectionManager::new(redis_client)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to Redis: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Redis connection error")
        })?;
    tracing::info!("Cache and notification channel initialized");

    let users = Arc::new(PostgresUserStore::new(pool));
    let revocations = Arc::new(RedisRevocationTracker::new(
        redis.clone(),
        configuration.redis.blacklist_key.clone(),
    ));
    let notifications = Arc::new(RedisQueueChannel::new(
        redis,
        configuration.notification.queue_name.clone(),
    ));

    let timeout = configuration.auth.operation_timeout();
    let state = AppState {
        auth: AuthService::new(
            users.clone(),
            revocations,
            notifications,
            CredentialHasher::new(configuration.auth.hash_cost),
            TokenCodec::new(&configuration.jwt),
            timeout,
        ),
        users: UserService::new(users, timeout),
    };

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, state)?.await
}
