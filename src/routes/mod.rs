mod auth;
mod health_check;
mod users;

pub use auth::{login, refresh_token, reset_password, sign_up, StatusResponse};
pub use health_check::health_check;
pub use users::{delete_current_user, get_current_user, patch_current_user};
