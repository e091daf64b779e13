/// Authentication Routes
///
/// Sign-up, login, refresh-token rotation and password-reset dispatch.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, TokenPair};
use crate::error::{AppError, AuthError, ErrorKind, WithOp};

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// `{"status": "OK"}`
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "OK" }
    }
}

/// POST /auth/signup
///
/// # Errors
/// - 400: empty or malformed username/email/password
/// - 409: username or email already registered
/// - 500: dependency failure
pub async fn sign_up(
    form: web::Json<SignUpRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    const OP: &str = "handlers.auth.sign_up";

    let user_id = auth
        .sign_up(&form.username, &form.email, &form.password)
        .await
        .with_op(OP)?;

    tracing::info!(user_id = %user_id, "User signed up");
    Ok(HttpResponse::Created().json(StatusResponse::ok()))
}

/// POST /auth/login
///
/// Unknown username and wrong password produce the same 401 response so
/// the endpoint cannot be used to enumerate accounts.
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    const OP: &str = "handlers.auth.login";

    let pair: TokenPair = auth
        .login(&form.username, &form.password)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                tracing::debug!(error = %e, "Login for unknown user");
                AppError::from(AuthError::InvalidCredentials)
            }
            _ => e,
        })
        .with_op(OP)?;

    tracing::info!("User logged in");
    Ok(HttpResponse::Ok().json(pair))
}

/// POST /auth/refresh-token
///
/// # Token Rotation
/// The presented token is consumed; a replay is answered 401 `TOKEN_REVOKED`.
pub async fn refresh_token(
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    const OP: &str = "handlers.auth.refresh_token";

    let pair = auth.refresh_token(&form.refresh_token).await.with_op(OP)?;

    tracing::info!("Token pair rotated");
    Ok(HttpResponse::Ok().json(pair))
}

/// POST /auth/reset-password
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    const OP: &str = "handlers.auth.reset_password";

    auth.reset_password(&form.email).await.with_op(OP)?;

    tracing::info!("Password reset requested");
    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}
