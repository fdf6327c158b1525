use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::PublicUser;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum; wire spelling is PascalCase.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum; wire spelling is PascalCase.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    /// Task is yet to be started.
    ToDo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is finished and awaiting review.
    Review,
    /// Task is completed.
    Completed,
}

/// Payload for POST /api/tasks.
///
/// There is deliberately no creator field: the creator is always the
/// authenticated caller. Status is not accepted either; new tasks start at
/// [`TaskStatus::ToDo`].
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: String,

    pub due_date: DateTime<Utc>,

    pub priority: TaskPriority,

    pub assigned_to_id: Option<i32>,
}

/// Payload for PATCH /api/tasks/{id}. All fields optional; absent fields are
/// left untouched. An assignee cannot be cleared through this endpoint, only
/// reassigned.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,

    pub assigned_to_id: Option<i32>,
}

impl UpdateTaskRequest {
    /// Names of the fields present in this patch, in declaration order.
    /// Feeds the audit trail and the empty-patch check.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.due_date.is_some() {
            fields.push("dueDate");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.assigned_to_id.is_some() {
            fields.push("assignedToId");
        }
        fields
    }
}

/// Narrows GET /api/tasks to tasks assigned to or created by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskScope {
    Assigned,
    Created,
}

/// Sort order for GET /api/tasks. Creation time descending is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskSort {
    DueDate,
    CreatedAt,
}

/// Query parameters accepted by GET /api/tasks. Unknown enum values are
/// rejected at deserialization, before any service logic runs.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub filter: Option<TaskScope>,
    pub sort: Option<TaskSort>,
}

/// One row of the task listing join: task columns plus the creator's and
/// assignee's display fields. Column aliases in the SQL match these names.
#[derive(Debug, FromRow)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub creator_id: i32,
    pub assigned_to_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator_name: String,
    pub creator_email: String,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
}

/// A task as returned by the API, with creator and assignee expanded to
/// `{id, name, email}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithUsers {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub creator_id: i32,
    pub assigned_to_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator: PublicUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<PublicUser>,
}

impl From<TaskRecord> for TaskWithUsers {
    fn from(record: TaskRecord) -> Self {
        let assigned_to = match (record.assigned_to_id, record.assignee_name, record.assignee_email)
        {
            (Some(id), Some(name), Some(email)) => Some(PublicUser { id, name, email }),
            _ => None,
        };
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            priority: record.priority,
            status: record.status,
            due_date: record.due_date,
            creator_id: record.creator_id,
            assigned_to_id: record.assigned_to_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            creator: PublicUser {
                id: record.creator_id,
                name: record.creator_name,
                email: record.creator_email,
            },
            assigned_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enum_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"InProgress\""
        );
        assert_eq!(serde_json::to_string(&TaskStatus::ToDo).unwrap(), "\"ToDo\"");
        assert_eq!(
            serde_json::to_string(&TaskPriority::Urgent).unwrap(),
            "\"Urgent\""
        );

        // Spellings outside the closed enums are rejected outright.
        assert!(serde_json::from_str::<TaskStatus>("\"Done\"").is_err());
        assert!(serde_json::from_str::<TaskStatus>("\"todo\"").is_err());
        assert!(serde_json::from_str::<TaskPriority>("\"Critical\"").is_err());
    }

    #[test]
    fn test_create_task_validation() {
        let valid = CreateTaskRequest {
            title: "Write the release notes".to_string(),
            description: "Cover the audit log changes".to_string(),
            due_date: Utc::now(),
            priority: TaskPriority::High,
            assigned_to_id: None,
        };
        assert!(valid.validate().is_ok());

        let empty_title = CreateTaskRequest {
            title: "".to_string(),
            description: "desc".to_string(),
            due_date: Utc::now(),
            priority: TaskPriority::Low,
            assigned_to_id: None,
        };
        assert!(empty_title.validate().is_err());

        let long_title = CreateTaskRequest {
            title: "a".repeat(101),
            description: "desc".to_string(),
            due_date: Utc::now(),
            priority: TaskPriority::Low,
            assigned_to_id: None,
        };
        assert!(long_title.validate().is_err());
    }

    #[test]
    fn test_create_task_rejects_missing_fields() {
        // description and dueDate are required
        let body = serde_json::json!({
            "title": "No description",
            "priority": "Low"
        });
        assert!(serde_json::from_value::<CreateTaskRequest>(body).is_err());
    }

    #[test]
    fn test_create_task_has_no_creator_field() {
        // A client-supplied creator must not deserialize into anything.
        let body = serde_json::json!({
            "title": "Sneaky",
            "description": "attempt to spoof the creator",
            "dueDate": "2026-01-01T00:00:00Z",
            "priority": "Low",
            "creatorId": 999
        });
        let parsed: CreateTaskRequest = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.title, "Sneaky");
        // creatorId was silently ignored; the type has nowhere to put it.
    }

    #[test]
    fn test_changed_fields() {
        let patch = UpdateTaskRequest {
            status: Some(TaskStatus::Review),
            title: Some("New title".to_string()),
            ..Default::default()
        };
        assert_eq!(patch.changed_fields(), vec!["title", "status"]);

        let empty = UpdateTaskRequest::default();
        assert!(empty.changed_fields().is_empty());
    }

    #[test]
    fn test_task_scope_spelling() {
        assert_eq!(
            serde_json::from_str::<TaskScope>("\"assigned\"").unwrap(),
            TaskScope::Assigned
        );
        assert_eq!(
            serde_json::from_str::<TaskScope>("\"created\"").unwrap(),
            TaskScope::Created
        );
        assert!(serde_json::from_str::<TaskScope>("\"mine\"").is_err());

        assert_eq!(
            serde_json::from_str::<TaskSort>("\"dueDate\"").unwrap(),
            TaskSort::DueDate
        );
    }

    #[test]
    fn test_expanded_task_serialization() {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            title: "Ship it".to_string(),
            description: "".to_string(),
            priority: TaskPriority::Urgent,
            status: TaskStatus::ToDo,
            due_date: Utc::now(),
            creator_id: 1,
            assigned_to_id: Some(2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            creator_name: "Alice".to_string(),
            creator_email: "alice@example.com".to_string(),
            assignee_name: Some("Bob".to_string()),
            assignee_email: Some("bob@example.com".to_string()),
        };

        let task = TaskWithUsers::from(record);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["priority"], "Urgent");
        assert_eq!(json["status"], "ToDo");
        assert_eq!(json["creator"]["name"], "Alice");
        assert_eq!(json["assignedTo"]["email"], "bob@example.com");
        assert_eq!(json["assignedToId"], 2);
        assert!(json.get("dueDate").is_some());
    }

    #[test]
    fn test_unassigned_task_omits_assignee() {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            title: "Solo work".to_string(),
            description: "no assignee".to_string(),
            priority: TaskPriority::Low,
            status: TaskStatus::InProgress,
            due_date: Utc::now(),
            creator_id: 1,
            assigned_to_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            creator_name: "Alice".to_string(),
            creator_email: "alice@example.com".to_string(),
            assignee_name: None,
            assignee_email: None,
        };

        let json = serde_json::to_value(TaskWithUsers::from(record)).unwrap();
        assert!(json.get("assignedTo").is_none());
        assert_eq!(json["assignedToId"], serde_json::Value::Null);
    }
}
