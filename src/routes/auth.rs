use crate::{
    auth::{AuthResponse, AuthenticatedUserId, LoginRequest, RegisterRequest},
    error::AppError,
    models::UpdateProfileRequest,
    services,
};
use actix_web::{get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token alongside
/// the user (without the password hash).
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let (user, token) = services::auth::register(&pool, &register_data).await?;

    Ok(HttpResponse::Created().json(AuthResponse::new(token, user)))
}

/// Login user
///
/// Authenticates a user and returns an authentication token.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let (user, token) = services::auth::login(&pool, &login_data).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::new(token, user)))
}

/// Current user
///
/// Returns the profile of the authenticated caller.
#[get("/me")]
pub async fn me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = services::auth::current_user(&pool, user.0).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "user": user }
    })))
}

/// Update profile
///
/// Changes the caller's name and/or email. Taking an email that belongs to a
/// different user is rejected.
#[put("/profile")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
    profile_data: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    profile_data.validate()?;

    let user = services::auth::update_profile(&pool, user.0, &profile_data).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "user": user }
    })))
}
