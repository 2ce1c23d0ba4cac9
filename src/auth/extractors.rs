use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::{AppError, AuthFailure};
use crate::models::User;

/// The user resolved by `AuthMiddleware` for this request.
///
/// Only usable on routes wrapped by `AuthMiddleware`; elsewhere extraction fails
/// with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn login(&self) -> &str {
        &self.0.login
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<User>().cloned() {
            Some(user) => ready(Ok(AuthenticatedUser(user))),
            None => {
                log::error!("no resolved user for {}; is AuthMiddleware applied?", req.path());
                let err = AppError::Unauthenticated(AuthFailure::CouldNotValidate);
                ready(Err(err.into()))
            }
        }
    }
}
