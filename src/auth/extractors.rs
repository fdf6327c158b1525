use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;

/// Extracts the authenticated user's ID from request extensions.
///
/// This extractor is intended to be used on routes protected by
/// `AuthMiddleware`, which validates the bearer token and inserts the decoded
/// [`Claims`] into request extensions.
///
/// If no claims are found (e.g. `AuthMiddleware` did not run), this extractor
/// returns an `AppError::Unauthorized` error.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUserId(pub i32);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().map(|claims| claims.sub) {
            Some(user_id) => ready(Ok(AuthenticatedUserId(user_id))),
            None => {
                // Only reachable when a protected route was registered outside
                // the AuthMiddleware scope; unauthorized is the safe answer.
                let err = AppError::Unauthorized(
                    "User identity not found in request. Ensure AuthMiddleware is active."
                        .to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}
