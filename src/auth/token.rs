use crate::error::AppError;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: i32,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
    /// Timestamp (seconds since epoch) at which the token was issued.
    pub iat: usize,
}

/// Generates a JWT for a given user ID with the given time to live.
///
/// Registration and login issue different lifetimes (7 days vs 1 day), so the
/// caller supplies the duration. Requires the `JWT_SECRET` environment
/// variable for signing; `Config::from_env` guarantees it is present before
/// the server accepts requests.
///
/// # Returns
/// A `Result` containing the JWT string if successful.
/// Returns `AppError::InternalServerError` if `JWT_SECRET` is not set or if
/// token encoding fails.
pub fn generate_token(user_id: i32, ttl: Duration) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::InternalServerError("JWT_SECRET not set".into()))?;

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a JWT string and decodes its claims.
///
/// Default validation checks are applied (signature, expiration). Whether the
/// embedded user still exists is a separate check performed by the auth
/// middleware, since it requires a database lookup.
///
/// # Returns
/// A `Result` containing the decoded `Claims` if the token is valid.
/// Returns `AppError::InternalServerError` if `JWT_SECRET` is not set.
/// Returns `AppError::Unauthorized` if the token is malformed, its signature
/// is invalid, or it has expired.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::InternalServerError("JWT_SECRET not set".into()))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref JWT_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    // Helper to run test logic with a temporarily set JWT_SECRET
    fn run_with_temp_jwt_secret<F>(secret_value: &str, test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = JWT_ENV_LOCK.lock().unwrap();

        let original_secret_val = std::env::var("JWT_SECRET").ok();
        std::env::set_var("JWT_SECRET", secret_value);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        if let Some(original) = original_secret_val {
            std::env::set_var("JWT_SECRET", original);
        } else {
            std::env::remove_var("JWT_SECRET");
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }

    #[test]
    fn test_token_generation_and_verification() {
        run_with_temp_jwt_secret("test_secret_for_gen_verify", || {
            let user_id = 1;
            let token = generate_token(user_id, Duration::days(1)).unwrap();
            let claims = verify_token(&token).unwrap();
            assert_eq!(claims.sub, user_id);
        });
    }

    #[test]
    fn test_token_ttl_is_caller_controlled() {
        run_with_temp_jwt_secret("test_secret_for_ttl", || {
            let week = generate_token(5, Duration::days(7)).unwrap();
            let day = generate_token(5, Duration::days(1)).unwrap();

            let week_claims = verify_token(&week).unwrap();
            let day_claims = verify_token(&day).unwrap();

            let week_ttl = week_claims.exp - week_claims.iat;
            let day_ttl = day_claims.exp - day_claims.iat;
            assert_eq!(week_ttl, 7 * 24 * 60 * 60);
            assert_eq!(day_ttl, 24 * 60 * 60);
        });
    }

    #[test]
    fn test_token_expiration() {
        run_with_temp_jwt_secret("test_secret_for_expiration", || {
            // A token that expired two hours ago must be rejected.
            let expired_token = {
                let now = chrono::Utc::now();
                let claims = Claims {
                    sub: 2,
                    exp: (now - Duration::hours(2)).timestamp() as usize,
                    iat: (now - Duration::hours(3)).timestamp() as usize,
                };
                encode(
                    &Header::default(),
                    &claims,
                    &EncodingKey::from_secret("test_secret_for_expiration".as_bytes()),
                )
                .unwrap()
            };

            match verify_token(&expired_token) {
                Err(AppError::Unauthorized(msg)) => {
                    assert!(msg.contains("ExpiredSignature"), "got: {}", msg);
                }
                Ok(_) => panic!("Token should have been invalid due to expiration"),
                Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
            }
        });
    }

    #[test]
    fn test_invalid_token_signature() {
        run_with_temp_jwt_secret("a_completely_different_secret", || {
            let token_signed_elsewhere = {
                let other_secret = "some_other_secret";
                let now = chrono::Utc::now();
                let claims = Claims {
                    sub: 3,
                    exp: (now + Duration::hours(1)).timestamp() as usize,
                    iat: now.timestamp() as usize,
                };
                encode(
                    &Header::default(),
                    &claims,
                    &EncodingKey::from_secret(other_secret.as_bytes()),
                )
                .unwrap()
            };

            match verify_token(&token_signed_elsewhere) {
                Err(AppError::Unauthorized(msg)) => {
                    assert!(
                        msg.contains("InvalidSignature") || msg.contains("InvalidToken"),
                        "got: {}",
                        msg
                    );
                }
                Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
                Err(e) => panic!("Unexpected error type for invalid signature: {:?}", e),
            }
        });
    }
}
