use crate::{
    auth::AuthenticatedUser,
    db::tasks as task_store,
    error::AppError,
    models::{TaskInput, TaskPatch, TaskQuery, TaskRef, TaskUpdate},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use sqlx::SqlitePool;
use validator::Validate;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Lists the caller's tasks, ordered by id.
///
/// ## Query Parameters:
/// - `status` (optional): only tasks whose done flag matches.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<SqlitePool>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = task_store::list_tasks(pool.get_ref(), user.login(), query.status).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Fetches one task. Tasks owned by someone else are reported as not found.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<SqlitePool>,
    task_id: web::Path<i64>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = task_store::find_task(pool.get_ref(), task_id.into_inner(), user.login())
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Creates a task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `422 Unprocessable Entity`: name empty or longer than 200, description longer than 1000.
#[post("")]
pub async fn create_task(
    pool: web::Data<SqlitePool>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = task_store::insert_task(pool.get_ref(), user.login(), &task_data).await?;
    log::debug!("user {} created task {}", user.login(), task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Replaces name, description and status of the task named by `id` in the body.
#[put("")]
pub async fn update_task(
    pool: web::Data<SqlitePool>,
    task_data: web::Json<TaskUpdate>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = task_store::replace_task(pool.get_ref(), user.login(), &task_data)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates only the fields present in the body.
#[patch("")]
pub async fn patch_task(
    pool: web::Data<SqlitePool>,
    task_data: web::Json<TaskPatch>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    if task_data.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    let task = task_store::patch_task(pool.get_ref(), user.login(), &task_data)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes the task named by `id` in the body.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task, or not the caller's.
#[delete("")]
pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    task_ref: web::Json<TaskRef>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    if !task_store::delete_task(pool.get_ref(), task_ref.id, user.login()).await? {
        return Err(task_not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}
