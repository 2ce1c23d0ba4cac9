use crate::{
    auth::{
        AccessTokenResponse, AuthMiddleware, AuthenticatedUser, Credentials, RefreshRequest,
        RegisterResponse, SessionManager,
    },
    error::AppError,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates the account, opens its session and returns an access/refresh token pair
/// with `"status": "Register is complete"`.
/// Responds 409 if the login is taken.
#[post("/register")]
pub async fn register(
    sessions: web::Data<SessionManager>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    credentials.validate()?;
    let tokens = sessions.register(&credentials).await?;
    Ok(HttpResponse::Created().json(RegisterResponse::from(tokens)))
}

/// Log in
///
/// Verifies the password and returns a fresh token pair. Any earlier access token
/// for this login stops working.
#[post("/authenticate")]
pub async fn authenticate(
    sessions: web::Data<SessionManager>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    credentials.validate()?;
    let tokens = sessions.login(&credentials).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// Exchange a refresh token for a new access token
///
/// Responds 401 with "Invalid token" or "Token expired".
#[post("/refresh")]
pub async fn refresh(
    sessions: web::Data<SessionManager>,
    request: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    let access_token = sessions.refresh(&request).await?;
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

/// End the caller's session
#[get("/logout", wrap = "AuthMiddleware")]
pub async fn logout(
    sessions: web::Data<SessionManager>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    sessions.logout(user.login()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "Logged out" })))
}
