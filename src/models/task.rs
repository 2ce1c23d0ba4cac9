use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Input for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// At most 1000 characters. Defaults to empty.
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,

    /// Done flag. Defaults to `false`.
    #[serde(default)]
    pub status: bool,
}

/// Full replacement of a task's fields (`PUT /tasks`).
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    pub id: i64,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: String,
    pub status: bool,
}

/// Partial update (`PATCH /tasks`). Only fields present in the body are changed.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskPatch {
    pub id: i64,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Identifies a task in a request body (`DELETE /tasks`).
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: i64,
}

/// A task as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: bool,
    /// Login of the owning user.
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Only tasks with this done flag.
    pub status: Option<bool>,
}
