use chrono::Utc;
use sqlx::SqliteExecutor;

use crate::models::{Task, TaskInput, TaskPatch, TaskUpdate};

pub async fn list_tasks<'e, E>(
    executor: E,
    owner: &str,
    status: Option<bool>,
) -> Result<Vec<Task>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        "SELECT id, name, description, status, owner, created_at, updated_at
         FROM tasks
         WHERE owner = ? AND (? IS NULL OR status = ?)
         ORDER BY id",
    )
    .bind(owner)
    .bind(status)
    .bind(status)
    .fetch_all(executor)
    .await
}

pub async fn find_task<'e, E>(executor: E, id: i64, owner: &str) -> Result<Option<Task>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        "SELECT id, name, description, status, owner, created_at, updated_at
         FROM tasks WHERE id = ? AND owner = ?",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(executor)
    .await
}

pub async fn insert_task<'e, E>(executor: E, owner: &str, input: &TaskInput) -> Result<Task, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();
    sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (name, description, status, owner, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING id, name, description, status, owner, created_at, updated_at",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.status)
    .bind(owner)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Overwrites every editable field. `None` when the task does not exist or
/// belongs to someone else.
pub async fn replace_task<'e, E>(
    executor: E,
    owner: &str,
    update: &TaskUpdate,
) -> Result<Option<Task>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET name = ?, description = ?, status = ?, updated_at = ?
         WHERE id = ? AND owner = ?
         RETURNING id, name, description, status, owner, created_at, updated_at",
    )
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.status)
    .bind(Utc::now())
    .bind(update.id)
    .bind(owner)
    .fetch_optional(executor)
    .await
}

/// Changes only the fields present in `patch`.
pub async fn patch_task<'e, E>(
    executor: E,
    owner: &str,
    patch: &TaskPatch,
) -> Result<Option<Task>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET name = COALESCE(?, name),
             description = COALESCE(?, description),
             status = COALESCE(?, status),
             updated_at = ?
         WHERE id = ? AND owner = ?
         RETURNING id, name, description, status, owner, created_at, updated_at",
    )
    .bind(patch.name.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.status)
    .bind(Utc::now())
    .bind(patch.id)
    .bind(owner)
    .fetch_optional(executor)
    .await
}

/// Returns `false` when nothing matched the id and owner.
pub async fn delete_task<'e, E>(executor: E, id: i64, owner: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner = ?")
        .bind(id)
        .bind(owner)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, users};
    use crate::models::NewUser;
    use sqlx::SqlitePool;

    async fn pool_with_users(logins: &[&str]) -> SqlitePool {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        db::migrate(&pool).await.unwrap();
        for &login in logins {
            let user = NewUser {
                login,
                password_hash: "hash",
                access_token: "token",
            };
            users::insert_user(&pool, &user).await.unwrap();
        }
        pool
    }

    fn input(name: &str) -> TaskInput {
        TaskInput {
            name: name.to_string(),
            description: format!("{} description", name),
            status: false,
        }
    }

    #[actix_rt::test]
    async fn test_tasks_are_scoped_to_owner() {
        let pool = pool_with_users(&["alice", "bob"]).await;
        let alices = insert_task(&pool, "alice", &input("alice task")).await.unwrap();
        insert_task(&pool, "bob", &input("bob task")).await.unwrap();

        let listed = list_tasks(&pool, "alice", None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "alice task");

        assert!(find_task(&pool, alices.id, "bob").await.unwrap().is_none());
        assert!(!delete_task(&pool, alices.id, "bob").await.unwrap());
        assert!(find_task(&pool, alices.id, "alice").await.unwrap().is_some());
    }

    #[actix_rt::test]
    async fn test_list_filters_by_status() {
        let pool = pool_with_users(&["alice"]).await;
        let first = insert_task(&pool, "alice", &input("one")).await.unwrap();
        insert_task(&pool, "alice", &input("two")).await.unwrap();

        let done = TaskPatch {
            id: first.id,
            status: Some(true),
            ..Default::default()
        };
        patch_task(&pool, "alice", &done).await.unwrap().unwrap();

        let finished = list_tasks(&pool, "alice", Some(true)).await.unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, first.id);
        assert_eq!(list_tasks(&pool, "alice", Some(false)).await.unwrap().len(), 1);
        assert_eq!(list_tasks(&pool, "alice", None).await.unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn test_patch_changes_only_present_fields() {
        let pool = pool_with_users(&["alice"]).await;
        let task = insert_task(&pool, "alice", &input("draft")).await.unwrap();

        let patch = TaskPatch {
            id: task.id,
            name: Some("final".to_string()),
            ..Default::default()
        };
        let patched = patch_task(&pool, "alice", &patch).await.unwrap().unwrap();
        assert_eq!(patched.name, "final");
        assert_eq!(patched.description, "draft description");
        assert!(!patched.status);
    }

    #[actix_rt::test]
    async fn test_replace_requires_ownership() {
        let pool = pool_with_users(&["alice", "bob"]).await;
        let task = insert_task(&pool, "alice", &input("mine")).await.unwrap();

        let update = TaskUpdate {
            id: task.id,
            name: "stolen".to_string(),
            description: String::new(),
            status: true,
        };
        assert!(replace_task(&pool, "bob", &update).await.unwrap().is_none());

        let replaced = replace_task(&pool, "alice", &update).await.unwrap().unwrap();
        assert_eq!(replaced.name, "stolen");
        assert!(replaced.status);
        assert_eq!(replaced.owner, "alice");
    }
}
