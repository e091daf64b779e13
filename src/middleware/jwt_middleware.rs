/// JWT Authentication Middleware
///
/// Validates the access token from the Authorization header and injects
/// its claims into request extensions for use by route handlers.
/// Access tokens are never checked against the revocation set.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::TokenCodec;
use crate::error::{AppError, AuthError};

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    tokens: TokenCodec,
}

impl JwtMiddleware {
    pub fn new(tokens: TokenCodec) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    tokens: TokenCodec,
}

const OP: &str = "middleware.jwt";

/// Rejection rendered through `AppError`, so clients see the same error body
/// as from any handler.
fn reject(err: impl Into<AppError>) -> Error {
    let err: AppError = err.into();
    err.with_op(OP).into()
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) => token,
            None => {
                tracing::debug!(path = %req.path(), "Missing or invalid Authorization header");
                return Box::pin(async move { Err(reject(AuthError::MissingToken)) });
            }
        };

        match self.tokens.parse_and_verify(&token) {
            Ok(claims) if claims.role().is_some() => {
                tracing::debug!(user_id = ?claims.extract("sub").ok(), "JWT validated successfully");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Ok(_) => {
                tracing::debug!("Refresh token presented as access token");
                Box::pin(async move { Err(reject(AuthError::TokenMalformed)) })
            }
            Err(e) => Box::pin(async move { Err(reject(e)) }),
        }
    }
}
