pub mod audit;
pub mod task;
pub mod user;

pub use audit::{AuditAction, AuditLogEntry};
pub use task::{
    CreateTaskRequest, TaskPriority, TaskQuery, TaskRecord, TaskScope, TaskSort, TaskStatus,
    TaskWithUsers, UpdateTaskRequest,
};
pub use user::{PublicUser, UpdateProfileRequest, User};
