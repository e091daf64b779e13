/// Profile routes for the authenticated user. Claims are injected by
/// `JwtMiddleware`.

use actix_web::{web, HttpResponse};

use crate::auth::Claims;
use crate::error::{AppError, WithOp};
use crate::models::UserPatch;
use crate::routes::StatusResponse;
use crate::users::UserService;

/// GET /user/me
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    users: web::Data<UserService>,
) -> Result<HttpResponse, AppError> {
    const OP: &str = "handlers.user.get";

    let user_id = claims.subject().with_op(OP)?;
    let user = users.get_user(user_id).await.with_op(OP)?;

    Ok(HttpResponse::Ok().json(user))
}

/// PATCH /user/me
///
/// # Errors
/// - 400: no fields to update
/// - 409: new username already taken
pub async fn patch_current_user(
    claims: web::ReqData<Claims>,
    patch: web::Json<UserPatch>,
    users: web::Data<UserService>,
) -> Result<HttpResponse, AppError> {
    const OP: &str = "handlers.user.patch";

    let user_id = claims.subject().with_op(OP)?;
    let user = users
        .patch_user(user_id, patch.into_inner())
        .await
        .with_op(OP)?;

    tracing::info!(user_id = %user_id, "User profile updated");
    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /user/me
pub async fn delete_current_user(
    claims: web::ReqData<Claims>,
    users: web::Data<UserService>,
) -> Result<HttpResponse, AppError> {
    const OP: &str = "handlers.user.delete";

    let user_id = claims.subject().with_op(OP)?;
    users.delete_user(user_id).await.with_op(OP)?;

    tracing::info!(user_id = %user_id, "User deleted");
    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}
