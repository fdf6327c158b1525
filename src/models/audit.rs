use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of mutation an audit entry records.
/// Corresponds to the `audit_action` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "audit_action")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// An immutable record of a task mutation: who changed what, and when.
///
/// Entries are append-only. They reference tasks by id without a foreign key,
/// so deleting a task leaves its history in place.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub task_id: Uuid,
    pub user_id: i32,
    pub details: String,
    pub created_at: DateTime<Utc>,
}
