/// HTTP middleware utilities for forum-service
///
/// Provides bearer-token authentication and the ownership policy used by
/// the write paths.
pub mod permissions;

pub use permissions::{can_mutate, can_read, ensure_can_mutate, OwnedResource};

use crate::auth::{Actor, JwtVerifier};
use crate::error::AppError;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

// =====================================================================
// JWT Authentication
// =====================================================================

/// Actix middleware that validates an optional Bearer token.
///
/// Requests without an `Authorization` header pass through anonymously so
/// reads stay public. A header that is present but malformed or carries an
/// invalid token is rejected with 401. On success the `Actor` is stored in
/// request extensions. The verifier is read from `web::Data<JwtVerifier>`.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
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
        let service = self.service.clone();

        Box::pin(async move {
            let auth_header = match req.headers().get("Authorization") {
                None => return service.call(req).await,
                Some(value) => value
                    .to_str()
                    .map_err(|_| unauthorized("Malformed Authorization header"))?
                    .to_owned(),
            };

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| unauthorized("Invalid Authorization scheme"))?;

            let verifier = req.app_data::<web::Data<JwtVerifier>>().ok_or_else(|| {
                Error::from(AppError::Internal("JWT verifier not configured".to_string()))
            })?;

            let actor = verifier
                .verify(token)
                .map_err(|e| unauthorized(&e.to_string()))?;

            req.extensions_mut().insert(actor);

            service.call(req).await
        })
    }
}

fn unauthorized(message: &str) -> Error {
    AppError::Unauthorized(message.to_string()).into()
}

/// Handlers that take `Actor` require authentication; use `Option<Actor>`
/// where anonymous callers are allowed.
impl FromRequest for Actor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Actor>()
                .copied()
                .ok_or_else(|| unauthorized("Authentication credentials were not provided")),
        )
    }
}
