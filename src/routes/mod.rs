pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Registers every endpoint. Callers provide `web::Data<SqlitePool>` and
/// `web::Data<SessionManager>` as app data.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(auth::register)
        .service(auth::authenticate)
        .service(auth::refresh)
        .service(auth::logout)
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::get_tasks)
                .service(tasks::get_task)
                .service(tasks::create_task)
                .service(tasks::update_task)
                .service(tasks::patch_task)
                .service(tasks::delete_task),
        );
}
