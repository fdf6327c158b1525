use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;

use crate::auth::token::verify_token;
use crate::error::AppError;

/// Bearer-token middleware for the `/api` scope.
///
/// Beyond verifying the token signature and expiry, it resolves the embedded
/// user id against the database and rejects tokens whose user no longer
/// exists. On success the decoded [`crate::auth::Claims`] are stored in the
/// request extensions for the `AuthenticatedUserId` extractor.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        // Skip authentication for the public auth endpoints. The realtime
        // endpoint authenticates its own handshake (browser websockets cannot
        // set an Authorization header).
        let path = req.path();
        if path.starts_with("/api/auth/login")
            || path.starts_with("/api/auth/register")
            || path.starts_with("/api/events")
        {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned);

            let token = match token {
                Some(token) => token,
                None => {
                    return Err(AppError::Unauthorized(
                        "You are not logged in! Please log in to get access.".into(),
                    )
                    .into())
                }
            };

            let claims = verify_token(&token)?;

            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| {
                    AppError::InternalServerError("Database pool not configured".into())
                })?;

            let user_exists = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = $1")
                .bind(claims.sub)
                .fetch_optional(pool.get_ref())
                .await
                .map_err(AppError::from)?;

            if user_exists.is_none() {
                return Err(AppError::Unauthorized(
                    "The user belonging to this token no longer exists".into(),
                )
                .into());
            }

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
