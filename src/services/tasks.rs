//! Task CRUD rules: ownership, filtering, the audit trail, and the events
//! each mutation produces.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    AuditAction, AuditLogEntry, CreateTaskRequest, TaskQuery, TaskRecord, TaskScope, TaskSort,
    TaskStatus, TaskWithUsers, UpdateTaskRequest,
};
use crate::realtime::TaskEvent;

/// Shared SELECT for expanded tasks: the row plus the creator's and
/// assignee's display fields. Aliases line up with [`TaskRecord`].
const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.priority, t.status, \
            t.due_date, t.creator_id, t.assigned_to_id, t.created_at, t.updated_at, \
            c.name AS creator_name, c.email AS creator_email, \
            a.name AS assignee_name, a.email AS assignee_email \
     FROM tasks t \
     JOIN users c ON c.id = t.creator_id \
     LEFT JOIN users a ON a.id = t.assigned_to_id";

/// Create a task owned by the authenticated caller.
///
/// The creator id never comes from the request body. New tasks always start
/// at `ToDo`. Returns the expanded task and the events to broadcast: always
/// `taskCreated`, plus `taskAssigned` when the task was handed to someone
/// other than its creator.
pub async fn create_task(
    pool: &PgPool,
    request: CreateTaskRequest,
    creator_id: i32,
) -> Result<(TaskWithUsers, Vec<TaskEvent>), AppError> {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO tasks (id, title, description, priority, status, due_date, creator_id, assigned_to_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(request.priority)
    .bind(TaskStatus::ToDo)
    .bind(request.due_date)
    .bind(creator_id)
    .bind(request.assigned_to_id)
    .execute(pool)
    .await?;

    let task = fetch_expanded(pool, id).await?;

    let mut events = vec![TaskEvent::TaskCreated(task.clone())];
    if let Some(assignee_id) = task.assigned_to_id {
        if assignee_id != creator_id {
            events.push(TaskEvent::TaskAssigned(task.clone()));
        }
    }

    Ok((task, events))
}

/// List tasks matching the query. Every authenticated user sees every task;
/// `filter=assigned|created` narrows to the caller's own slice.
pub async fn list_tasks(
    pool: &PgPool,
    query: &TaskQuery,
    caller_id: i32,
) -> Result<Vec<TaskWithUsers>, AppError> {
    let sql = build_list_query(query);

    let mut db_query = sqlx::query_as::<_, TaskRecord>(&sql);
    if let Some(status) = query.status {
        db_query = db_query.bind(status);
    }
    if let Some(priority) = query.priority {
        db_query = db_query.bind(priority);
    }
    if query.filter.is_some() {
        db_query = db_query.bind(caller_id);
    }

    let records = db_query.fetch_all(pool).await?;
    Ok(records.into_iter().map(TaskWithUsers::from).collect())
}

/// Fetch a single expanded task.
pub async fn get_task(pool: &PgPool, id: Uuid) -> Result<TaskWithUsers, AppError> {
    fetch_expanded(pool, id).await
}

/// Apply a partial update. Any authenticated user may edit any task; the
/// collaborative model has no per-task edit restriction. The row update and
/// the audit append commit in one transaction so no mutation goes unaudited.
pub async fn update_task(
    pool: &PgPool,
    id: Uuid,
    patch: UpdateTaskRequest,
    acting_user_id: i32,
) -> Result<(TaskWithUsers, Vec<TaskEvent>), AppError> {
    let changed = patch.changed_fields();
    if changed.is_empty() {
        return Err(AppError::ValidationError("No fields to update".into()));
    }

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE tasks \
         SET title = COALESCE($1, title), \
             description = COALESCE($2, description), \
             due_date = COALESCE($3, due_date), \
             priority = COALESCE($4, priority), \
             status = COALESCE($5, status), \
             assigned_to_id = COALESCE($6, assigned_to_id), \
             updated_at = NOW() \
         WHERE id = $7",
    )
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.due_date)
    .bind(patch.priority)
    .bind(patch.status)
    .bind(patch.assigned_to_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    let entry = sqlx::query_as::<_, AuditLogEntry>(
        "INSERT INTO audit_log (id, action, task_id, user_id, details) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, action, task_id, user_id, details, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(AuditAction::Update)
    .bind(id)
    .bind(acting_user_id)
    .bind(audit_details(&changed))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    log::debug!("appended audit entry {} for task {}", entry.id, id);

    let task = fetch_expanded(pool, id).await?;
    let events = vec![TaskEvent::TaskUpdated(task.clone())];

    Ok((task, events))
}

/// Delete a task. Only its creator may do so; anyone else gets a 403 and the
/// task stays put. Audit entries for the task are left in place.
pub async fn delete_task(
    pool: &PgPool,
    id: Uuid,
    acting_user_id: i32,
) -> Result<Vec<TaskEvent>, AppError> {
    let creator_id = sqlx::query_scalar::<_, i32>("SELECT creator_id FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let creator_id = match creator_id {
        Some(creator_id) => creator_id,
        None => return Err(AppError::NotFound("Task not found".into())),
    };

    if creator_id != acting_user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this task".into(),
        ));
    }

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(vec![TaskEvent::TaskDeleted(id)])
}

async fn fetch_expanded(pool: &PgPool, id: Uuid) -> Result<TaskWithUsers, AppError> {
    let sql = format!("{} WHERE t.id = $1", TASK_SELECT);
    let record = sqlx::query_as::<_, TaskRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match record {
        Some(record) => Ok(record.into()),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Build the listing SQL for the given filters. Bind order is status,
/// priority, caller id; placeholders are numbered by position so the caller
/// binds exactly the present parameters.
fn build_list_query(query: &TaskQuery) -> String {
    let mut sql = String::from(TASK_SELECT);
    let mut conditions: Vec<String> = Vec::new();

    if query.status.is_some() {
        conditions.push(format!("t.status = ${}", conditions.len() + 1));
    }
    if query.priority.is_some() {
        conditions.push(format!("t.priority = ${}", conditions.len() + 1));
    }
    match query.filter {
        Some(TaskScope::Assigned) => {
            conditions.push(format!("t.assigned_to_id = ${}", conditions.len() + 1));
        }
        Some(TaskScope::Created) => {
            conditions.push(format!("t.creator_id = ${}", conditions.len() + 1));
        }
        None => {}
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    match query.sort {
        Some(TaskSort::DueDate) => sql.push_str(" ORDER BY t.due_date ASC"),
        _ => sql.push_str(" ORDER BY t.created_at DESC"),
    }

    sql
}

fn audit_details(changed_fields: &[&str]) -> String {
    format!("Updated fields: {}", changed_fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_query_no_filters() {
        let sql = build_list_query(&TaskQuery::default());
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY t.created_at DESC"));
    }

    #[test]
    fn test_list_query_due_date_sort() {
        let query = TaskQuery {
            sort: Some(TaskSort::DueDate),
            ..Default::default()
        };
        assert!(build_list_query(&query).ends_with("ORDER BY t.due_date ASC"));
    }

    #[test]
    fn test_list_query_status_and_priority() {
        let query = TaskQuery {
            status: Some(TaskStatus::InProgress),
            priority: Some(TaskPriority::High),
            ..Default::default()
        };
        let sql = build_list_query(&query);
        assert!(sql.contains("t.status = $1"));
        assert!(sql.contains("t.priority = $2"));
        assert!(sql.contains(" AND "));
    }

    #[test]
    fn test_list_query_scope_placeholder_follows_filters() {
        let query = TaskQuery {
            status: Some(TaskStatus::ToDo),
            filter: Some(TaskScope::Assigned),
            ..Default::default()
        };
        let sql = build_list_query(&query);
        assert!(sql.contains("t.status = $1"));
        assert!(sql.contains("t.assigned_to_id = $2"));

        let query = TaskQuery {
            filter: Some(TaskScope::Created),
            ..Default::default()
        };
        let sql = build_list_query(&query);
        assert!(sql.contains("t.creator_id = $1"));
    }

    #[test]
    fn test_audit_details_formatting() {
        assert_eq!(
            audit_details(&["title", "status"]),
            "Updated fields: title, status"
        );
        assert_eq!(audit_details(&["dueDate"]), "Updated fields: dueDate");
    }
}
