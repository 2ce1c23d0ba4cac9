//! Login, registration, refresh and logout.
//!
//! Each user is either anonymous or logged in. Login, registration and refresh
//! store the newly issued access token and mark the session live in one write;
//! logout ends it. Only the stored token is honored by the identity resolver,
//! so issuing a new one retires the previous one.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::resolver::resolve_identity;
use crate::auth::token::{TokenCodec, TokenKind};
use crate::auth::{Credentials, RefreshRequest, TokenPair};
use crate::db::users::{self, SessionUpdate};
use crate::error::{is_unique_violation, AppError, AuthFailure};
use crate::models::{NewUser, User};

/// Checked against when the login is unknown, so both failure paths pay for one bcrypt verify.
const DUMMY_PASSWORD: &str = "taskgate-dummy-password";

#[derive(Clone)]
pub struct SessionManager {
    pool: SqlitePool,
    codec: TokenCodec,
    bcrypt_cost: u32,
    dummy_hash: String,
}

/// bcrypt is CPU-bound; keep it off the request workers.
async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Blocking task failed: {}", e)))?
}

impl SessionManager {
    /// Fails only if `bcrypt_cost` is outside 4..=31.
    pub fn new(pool: SqlitePool, codec: TokenCodec, bcrypt_cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash_password(DUMMY_PASSWORD, bcrypt_cost)?;
        Ok(Self {
            pool,
            codec,
            bcrypt_cost,
            dummy_hash,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    fn issue_pair(&self, login: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.codec.issue_kind(TokenKind::Access, login)?,
            refresh_token: self.codec.issue_kind(TokenKind::Refresh, login)?,
        })
    }

    /// Creates the account with a live session. An existing login is a `Conflict`.
    pub async fn register(&self, credentials: &Credentials) -> Result<TokenPair, AppError> {
        let password = credentials.password.clone();
        let cost = self.bcrypt_cost;
        let password_hash = run_blocking(move || hash_password(&password, cost)).await?;
        let tokens = self.issue_pair(&credentials.login)?;

        let new_user = NewUser {
            login: &credentials.login,
            password_hash: &password_hash,
            access_token: &tokens.access_token,
        };
        match users::insert_user(&self.pool, &new_user).await {
            Ok(_) => {
                log::info!("registered user {}", credentials.login);
                Ok(tokens)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::Conflict("Login already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verifies the password, then opens a session with a fresh token pair.
    /// An unknown login and a wrong password fail identically, in message and in cost.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AppError> {
        let user = users::find_user(&self.pool, &credentials.login).await?;
        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let password = credentials.password.clone();
        let password_ok = run_blocking(move || verify_password(&password, &stored_hash)).await?;

        let user = match user {
            Some(user) if password_ok => user,
            _ => {
                log::warn!("failed login attempt for {}", credentials.login);
                return Err(AppError::InvalidCredentials);
            }
        };

        let tokens = self.issue_pair(&user.login)?;
        let open = SessionUpdate::Open {
            access_token: &tokens.access_token,
        };
        if !users::update_session(&self.pool, &user.login, open).await? {
            // Deleted between lookup and update.
            return Err(AppError::InvalidCredentials);
        }

        log::info!("user {} logged in", user.login);
        Ok(tokens)
    }

    /// Exchanges a refresh token for a new access token, which becomes the
    /// session's current token. The refresh token itself stays valid until it expires,
    /// but only while the session is live: after logout it cannot reopen one.
    ///
    /// A request not declaring itself a refresh, an undecodable token, or a token of
    /// another kind is "Invalid token"; the kind is checked before expiry.
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<String, AppError> {
        if request.kind != "refresh" {
            return Err(AuthFailure::InvalidToken.into());
        }

        let claims = self
            .codec
            .parse(&request.token)
            .ok_or(AuthFailure::InvalidToken)?;

        if claims.typ != TokenKind::Refresh {
            log::warn!("refresh attempted with a {:?} token", claims.typ);
            return Err(AuthFailure::InvalidToken.into());
        }

        // Decoding tolerates the configured leeway; expiry here is exact.
        if claims.is_expired_at(Utc::now()) {
            return Err(AuthFailure::TokenExpired.into());
        }

        let user = users::find_user(&self.pool, &claims.sub)
            .await?
            .ok_or(AuthFailure::InvalidToken)?;
        if !user.logged_in {
            log::warn!("refresh attempted for logged-out user {}", user.login);
            return Err(AuthFailure::InvalidToken.into());
        }

        let access_token = self.codec.issue_kind(TokenKind::Access, &user.login)?;
        let rotate = SessionUpdate::Rotate {
            access_token: &access_token,
        };
        // Rotate matches nothing if a logout landed after the lookup.
        if !users::update_session(&self.pool, &user.login, rotate).await? {
            return Err(AuthFailure::InvalidToken.into());
        }

        log::info!("issued refreshed access token for {}", user.login);
        Ok(access_token)
    }

    /// Ends the session and clears the stored token.
    pub async fn logout(&self, login: &str) -> Result<(), AppError> {
        if !users::update_session(&self.pool, login, SessionUpdate::Close).await? {
            return Err(AuthFailure::CouldNotValidate.into());
        }
        log::info!("user {} logged out", login);
        Ok(())
    }

    pub async fn resolve(&self, presented: &str) -> Result<User, AppError> {
        resolve_identity(&self.pool, &self.codec, presented).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Duration;

    async fn manager_with_leeway(leeway: u64) -> SessionManager {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        db::migrate(&pool).await.unwrap();
        let codec = TokenCodec::new(b"session_secret", Duration::minutes(15), Duration::hours(24))
            .with_leeway(leeway);
        SessionManager::new(pool, codec, 4).unwrap()
    }

    async fn manager() -> SessionManager {
        manager_with_leeway(0).await
    }

    fn credentials(login: &str, password: &str) -> Credentials {
        Credentials {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    fn refresh_request(kind: &str, token: &str) -> RefreshRequest {
        RefreshRequest {
            kind: kind.to_string(),
            token: token.to_string(),
        }
    }

    fn auth_failure<T: std::fmt::Debug>(result: Result<T, AppError>) -> AuthFailure {
        match result {
            Err(AppError::Unauthenticated(failure)) => failure,
            other => panic!("expected an authentication failure, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_register_then_login_resolves_to_same_login() {
        let sessions = manager().await;
        let registered = sessions
            .register(&credentials("alice", "pw1"))
            .await
            .unwrap();
        assert_eq!(sessions.resolve(&registered.access_token).await.unwrap().login, "alice");

        let tokens = sessions.login(&credentials("alice", "pw1")).await.unwrap();
        let user = sessions.resolve(&tokens.access_token).await.unwrap();
        assert_eq!(user.login, "alice");

        let claims = sessions.codec().parse(&tokens.refresh_token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.typ, TokenKind::Refresh);
    }

    #[actix_rt::test]
    async fn test_duplicate_registration_conflicts() {
        let sessions = manager().await;
        sessions.register(&credentials("alice", "pw1")).await.unwrap();

        let err = sessions
            .register(&credentials("alice", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_bad_password_and_unknown_login_are_invalid_credentials() {
        let sessions = manager().await;
        let registered = sessions.register(&credentials("alice", "pw1")).await.unwrap();

        assert!(matches!(
            sessions.login(&credentials("alice", "wrong")).await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            sessions.login(&credentials("nobody", "pw1")).await,
            Err(AppError::InvalidCredentials)
        ));
        // The placeholder hash checked for unknown logins never lets anyone in.
        assert!(matches!(
            sessions.login(&credentials("nobody", DUMMY_PASSWORD)).await,
            Err(AppError::InvalidCredentials)
        ));
        // A failed login leaves the existing session untouched.
        assert!(sessions.resolve(&registered.access_token).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_second_login_supersedes_first_token() {
        let sessions = manager().await;
        sessions.register(&credentials("alice", "pw1")).await.unwrap();
        let first = sessions.login(&credentials("alice", "pw1")).await.unwrap();
        let second = sessions.login(&credentials("alice", "pw1")).await.unwrap();

        assert_eq!(
            auth_failure(sessions.resolve(&first.access_token).await),
            AuthFailure::InvalidToken
        );
        assert!(sessions.resolve(&second.access_token).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_logout_reports_not_logged_in() {
        let sessions = manager().await;
        let tokens = sessions.register(&credentials("alice", "pw1")).await.unwrap();
        sessions.logout("alice").await.unwrap();

        assert_eq!(
            auth_failure(sessions.resolve(&tokens.access_token).await),
            AuthFailure::NotLoggedIn
        );
    }

    #[actix_rt::test]
    async fn test_refresh_rotates_access_token() {
        let sessions = manager().await;
        let tokens = sessions.register(&credentials("alice", "pw1")).await.unwrap();

        let rotated = sessions
            .refresh(&refresh_request("refresh", &tokens.refresh_token))
            .await
            .unwrap();

        assert_eq!(sessions.resolve(&rotated).await.unwrap().login, "alice");
        assert_eq!(
            auth_failure(sessions.resolve(&tokens.access_token).await),
            AuthFailure::InvalidToken
        );
        // Not single-use.
        assert!(sessions
            .refresh(&refresh_request("refresh", &tokens.refresh_token))
            .await
            .is_ok());
    }

    #[actix_rt::test]
    async fn test_refresh_cannot_reopen_logged_out_session() {
        let sessions = manager().await;
        let tokens = sessions.register(&credentials("alice", "pw1")).await.unwrap();
        sessions.logout("alice").await.unwrap();

        assert_eq!(
            auth_failure(
                sessions
                    .refresh(&refresh_request("refresh", &tokens.refresh_token))
                    .await
            ),
            AuthFailure::InvalidToken
        );
        assert_eq!(
            auth_failure(sessions.resolve(&tokens.access_token).await),
            AuthFailure::NotLoggedIn
        );

        // A fresh login makes the old refresh token usable again.
        sessions.login(&credentials("alice", "pw1")).await.unwrap();
        let rotated = sessions
            .refresh(&refresh_request("refresh", &tokens.refresh_token))
            .await
            .unwrap();
        assert_eq!(sessions.resolve(&rotated).await.unwrap().login, "alice");
    }

    #[actix_rt::test]
    async fn test_out_of_range_cost_is_rejected_at_construction() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let codec = TokenCodec::new(b"session_secret", Duration::minutes(15), Duration::hours(24));
        assert!(SessionManager::new(pool, codec, 3).is_err());
    }

    #[actix_rt::test]
    async fn test_refresh_rejects_wrong_declared_type_and_garbage() {
        let sessions = manager().await;
        let tokens = sessions.register(&credentials("alice", "pw1")).await.unwrap();

        assert_eq!(
            auth_failure(
                sessions
                    .refresh(&refresh_request("access", &tokens.refresh_token))
                    .await
            ),
            AuthFailure::InvalidToken
        );
        assert_eq!(
            auth_failure(sessions.refresh(&refresh_request("refresh", "garbage")).await),
            AuthFailure::InvalidToken
        );
    }

    #[actix_rt::test]
    async fn test_refresh_checks_kind_before_expiry() {
        let sessions = manager_with_leeway(120).await;
        sessions.register(&credentials("alice", "pw1")).await.unwrap();
        let expired_access = sessions
            .codec()
            .issue(TokenKind::Access, "alice", Duration::seconds(-30))
            .unwrap();

        assert_eq!(
            auth_failure(
                sessions
                    .refresh(&refresh_request("refresh", &expired_access))
                    .await
            ),
            AuthFailure::InvalidToken
        );
    }

    #[actix_rt::test]
    async fn test_refresh_reports_expiry_within_leeway() {
        let sessions = manager_with_leeway(120).await;
        sessions.register(&credentials("alice", "pw1")).await.unwrap();
        let expired_refresh = sessions
            .codec()
            .issue(TokenKind::Refresh, "alice", Duration::seconds(-30))
            .unwrap();

        assert_eq!(
            auth_failure(
                sessions
                    .refresh(&refresh_request("refresh", &expired_refresh))
                    .await
            ),
            AuthFailure::TokenExpired
        );
    }

    #[actix_rt::test]
    async fn test_refresh_for_unknown_user_is_invalid() {
        let sessions = manager().await;
        let orphan = sessions
            .codec()
            .issue_kind(TokenKind::Refresh, "ghost")
            .unwrap();

        assert_eq!(
            auth_failure(sessions.refresh(&refresh_request("refresh", &orphan)).await),
            AuthFailure::InvalidToken
        );
    }
}
