//! Registration, login, and profile management.

use chrono::Duration;
use sqlx::PgPool;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::generate_token;
use crate::auth::{LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::{PublicUser, UpdateProfileRequest, User};

/// Tokens issued at registration live a week; login tokens a single day.
/// The asymmetry is inherited behavior, kept as-is.
const REGISTER_TOKEN_TTL_DAYS: i64 = 7;
const LOGIN_TOKEN_TTL_DAYS: i64 = 1;

/// Create a new account and issue its first token.
///
/// Fails with a conflict when the email is already registered. The password
/// is stored only as a bcrypt hash and never returned.
pub async fn register(
    pool: &PgPool,
    request: &RegisterRequest,
) -> Result<(PublicUser, String), AppError> {
    let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
        .bind(&request.email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let password_hash = hash_password(&request.password)?;

    let user = sqlx::query_as::<_, PublicUser>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
         RETURNING id, name, email",
    )
    .bind(&request.name)
    .bind(&request.email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await?;

    let token = generate_token(user.id, Duration::days(REGISTER_TOKEN_TTL_DAYS))?;

    Ok((user, token))
}

/// Authenticate by email and password.
///
/// Unknown email and wrong password produce the same error, so responses do
/// not reveal which emails are registered.
pub async fn login(pool: &PgPool, request: &LoginRequest) -> Result<(PublicUser, String), AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, created_at, updated_at \
         FROM users WHERE email = $1",
    )
    .bind(&request.email)
    .fetch_optional(pool)
    .await?;

    let user = match user {
        Some(user) => user,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = generate_token(user.id, Duration::days(LOGIN_TOKEN_TTL_DAYS))?;

    Ok((PublicUser::from(user), token))
}

/// Look up the authenticated user's own record.
pub async fn current_user(pool: &PgPool, user_id: i32) -> Result<PublicUser, AppError> {
    let user =
        sqlx::query_as::<_, PublicUser>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    match user {
        Some(user) => Ok(user),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Update name and/or email. Changing to an email owned by a different user
/// is a conflict; re-submitting one's own email is allowed.
pub async fn update_profile(
    pool: &PgPool,
    user_id: i32,
    request: &UpdateProfileRequest,
) -> Result<PublicUser, AppError> {
    if let Some(email) = &request.email {
        let owner = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        if let Some(owner_id) = owner {
            if owner_id != user_id {
                return Err(AppError::Conflict("Email already in use".into()));
            }
        }
    }

    let user = sqlx::query_as::<_, PublicUser>(
        "UPDATE users \
         SET name = COALESCE($1, name), email = COALESCE($2, email), updated_at = NOW() \
         WHERE id = $3 \
         RETURNING id, name, email",
    )
    .bind(&request.name)
    .bind(&request.email)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}
