use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::resolver::presented_token;
use crate::auth::session::SessionManager;
use crate::error::{AppError, AuthFailure};
use crate::models::User;

/// Resolves the caller's identity before the wrapped service runs and stores the
/// resulting `User` in request extensions. Requires `web::Data<SessionManager>`
/// in app data.
///
/// A refused caller gets the error response directly; the wrapped service never runs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let resolved = resolve_caller(&req).await;
            match resolved {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn resolve_caller(req: &ServiceRequest) -> Result<User, AppError> {
    let sessions = req
        .app_data::<web::Data<SessionManager>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("SessionManager is not registered".into()))?;

    let token = presented_token(req.headers()).ok_or_else(|| {
        log::warn!("missing token on {}", req.path());
        AuthFailure::CouldNotValidate
    })?;

    sessions.resolve(&token).await.map_err(|err| {
        if let AppError::Unauthenticated(failure) = &err {
            log::warn!("rejected token on {}: {}", req.path(), failure);
        }
        err
    })
}
