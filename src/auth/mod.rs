pub mod extractors;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod session;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use resolver::{presented_token, resolve_identity};
pub use session::SessionManager;
pub use token::{Claims, TokenCodec, TokenKind};

lazy_static! {
    // Logins: letters, digits, underscores, hyphens and dots
    static ref LOGIN_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();
}

/// Body of `POST /register` and `POST /authenticate`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Credentials {
    /// Unique account name, 1 to 64 characters.
    #[validate(
        length(min = 1, max = 64),
        regex(
            path = "LOGIN_REGEX",
            message = "Login may contain letters, digits, underscores, hyphens and dots"
        )
    )]
    pub login: String,
    /// Plaintext password. bcrypt only reads the first 72 bytes, so longer ones are refused.
    #[validate(length(min = 1, max = 72))]
    pub password: String,
}

/// Body of `POST /refresh`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Declared token kind; must be `"refresh"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
}

/// Returned by registration and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Returned by `POST /register`: the token pair plus a completion status.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: String,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl From<TokenPair> for RegisterResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            status: "Register is complete".to_string(),
            tokens,
        }
    }
}

/// Returned by `POST /refresh`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}
