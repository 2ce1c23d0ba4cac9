use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A registered account together with its session state.
///
/// `logged_in` implies `access_token` holds the most recently issued access token;
/// it is the only access token the identity resolver will honor for this login.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub login: String,
    pub password_hash: String,
    pub access_token: Option<String>,
    pub logged_in: bool,
    pub created_at: DateTime<Utc>,
}

/// Row data for a registration. The account starts with a live session.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub login: &'a str,
    pub password_hash: &'a str,
    pub access_token: &'a str,
}

impl User {
    /// True when `presented` is exactly the stored access token of a live session.
    pub fn holds_session_token(&self, presented: &str) -> bool {
        self.access_token.as_deref() == Some(presented)
    }
}
