use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{CreateTaskRequest, TaskQuery, UpdateTaskRequest},
    realtime::EventBus,
    services,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Retrieves tasks visible to the authenticated user.
///
/// All tasks are globally visible to any logged-in user; the optional
/// `filter` query parameter narrows the listing to the caller's own tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `ToDo`, `InProgress`, `Review`, or `Completed`.
/// - `priority` (optional): `Low`, `Medium`, `High`, or `Urgent`.
/// - `filter` (optional): `assigned` (tasks assigned to the caller) or
///   `created` (tasks the caller created).
/// - `sort` (optional): `dueDate` for due date ascending; default is creation
///   time descending.
///
/// ## Responses:
/// - `200 OK`: `{"status":"success","results":n,"data":{"tasks":[...]}}`.
/// - `400 Bad Request`: Unknown status/priority/filter/sort value.
/// - `401 Unauthorized`: Missing or invalid token.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let tasks = services::tasks::list_tasks(&pool, &query_params, user.0).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": tasks.len(),
        "data": { "tasks": tasks }
    })))
}

/// Creates a new task owned by the authenticated user.
///
/// The creator is always the caller; the request body has no creator field.
/// New tasks start in `ToDo`. Broadcasts `taskCreated`, plus `taskAssigned`
/// when the task is assigned to someone other than its creator.
///
/// ## Request Body:
/// - `title`: 1-100 characters (required).
/// - `description`: free text (required).
/// - `dueDate`: RFC 3339 timestamp (required).
/// - `priority`: `Low` | `Medium` | `High` | `Urgent` (required).
/// - `assignedToId` (optional): user to assign the task to.
///
/// ## Responses:
/// - `201 Created`: `{"status":"success","data":{"task":...}}`.
/// - `400 Bad Request`: Validation failure or unknown assignee.
/// - `401 Unauthorized`: Missing or invalid token.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    bus: web::Data<EventBus>,
    task_data: web::Json<CreateTaskRequest>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let (task, events) = services::tasks::create_task(&pool, task_data.into_inner(), user.0).await?;
    bus.dispatch(events);

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "task": task }
    })))
}

/// Retrieves a specific task by its ID, with creator and assignee expanded.
///
/// ## Responses:
/// - `200 OK`: `{"status":"success","data":{"task":...}}`.
/// - `401 Unauthorized`: Missing or invalid token.
/// - `404 Not Found`: No task with this id.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    _user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let task = services::tasks::get_task(&pool, task_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "task": task }
    })))
}

/// Applies a partial update to a task.
///
/// Any authenticated user may update any task (collaborative editing; last
/// write wins). Every successful update appends one audit entry naming the
/// patched fields and broadcasts `taskUpdated`.
///
/// ## Request Body:
/// Any subset of `title`, `description`, `dueDate`, `priority`, `status`,
/// `assignedToId`. An empty patch is rejected.
///
/// ## Responses:
/// - `200 OK`: `{"status":"success","data":{"task":...}}`.
/// - `400 Bad Request`: Validation failure or empty patch.
/// - `401 Unauthorized`: Missing or invalid token.
/// - `404 Not Found`: No task with this id.
#[patch("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    bus: web::Data<EventBus>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let (task, events) =
        services::tasks::update_task(&pool, task_id.into_inner(), task_data.into_inner(), user.0)
            .await?;
    bus.dispatch(events);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "task": task }
    })))
}

/// Deletes a task by its ID.
///
/// Only the task's creator may delete it. Broadcasts `taskDeleted` with the
/// deleted id; audit entries for the task are kept.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `401 Unauthorized`: Missing or invalid token.
/// - `403 Forbidden`: Caller is not the creator.
/// - `404 Not Found`: No task with this id.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    bus: web::Data<EventBus>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let events = services::tasks::delete_task(&pool, task_id.into_inner(), user.0).await?;
    bus.dispatch(events);

    Ok(HttpResponse::NoContent().finish())
}
