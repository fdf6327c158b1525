pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::PublicUser;

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    #[validate(email)]
    pub email: String,
    /// User's password. Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name for the new account. Free-form text, 2-100 characters.
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    /// Email address for the new account. Must be unique across all users.
    #[validate(email)]
    pub email: String,
    /// Password for the new account. Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Response body for successful registration and login: the bearer token plus
/// the user it identifies, without the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub status: String,
    pub token: String,
    pub data: AuthData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthData {
    pub user: PublicUser,
}

impl AuthResponse {
    pub fn new(token: String, user: PublicUser) -> Self {
        Self {
            status: "success".to_string(),
            token,
            data: AuthData { user },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let short_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            name: "Alice Smith".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_register.validate().is_ok());

        let short_name_register = RegisterRequest {
            name: "A".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(short_name_register.validate().is_err());

        let invalid_email_register = RegisterRequest {
            name: "Alice Smith".to_string(),
            email: "alice.example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_register.validate().is_err());

        let short_password_register = RegisterRequest {
            name: "Alice Smith".to_string(),
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password_register.validate().is_err());
    }
}
