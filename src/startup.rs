use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::middleware::{JwtMiddleware, RequestLogger};
use crate::routes::{
    delete_current_user, get_current_user, health_check, login, patch_current_user,
    refresh_token, reset_password, sign_up,
};
use crate::users::UserService;

/// Long-lived service handles shared by every worker
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UserService,
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let tokens = state.auth.tokens().clone();
    let auth = web::Data::new(state.auth);
    let users = web::Data::new(state.users);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(auth.clone())
            .app_data(users.clone())
            .route("/healthcheck", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(sign_up))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh_token))
                    .route("/reset-password", web::post().to(reset_password)),
            )
            // Protected routes (require a valid access token)
            .service(
                web::scope("/user")
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route("/me", web::get().to(get_current_user))
                    .route("/me", web::patch().to(patch_current_user))
                    .route("/me", web::delete().to(delete_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
