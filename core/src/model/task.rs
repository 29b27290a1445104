use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::time::{deadline_format, local_to_utc};

/// Stable identifier of a task.
///
/// Freshly generated ids are UUIDv7 strings, so they sort in creation order.
/// Any string read back from storage is accepted as-is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "pending" | "p" => Ok(TaskStatus::Pending),
            "inprogress" | "progress" | "ip" => Ok(TaskStatus::InProgress),
            "done" | "d" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidInput(format!("Unknown status: '{}'", s))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "deadline_format")]
    pub deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub assigned_user: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a stored task from caller-supplied fields.
    /// Status always starts out as `Pending`.
    pub fn new(draft: NewTask) -> Self {
        Self {
            id: TaskId::generate(),
            title: draft.title,
            description: draft.description,
            deadline: draft.deadline,
            assigned_user: draft.assigned_user,
            status: TaskStatus::default(),
            created_at: Utc::now(),
        }
    }

    /// Merges the supplied fields of `patch` over this task.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = Some(deadline);
        }
        if let Some(user) = patch.assigned_user {
            self.assigned_user = user;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    /// A task is overdue when it is not done and its deadline lies strictly before `now`.
    /// Tasks without a deadline are never overdue.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        if self.status == TaskStatus::Done {
            return false;
        }
        match self.deadline {
            Some(deadline) => local_to_utc(deadline) < now,
            None => false,
        }
    }
}

/// Fields a caller supplies when creating a task.
/// `id`, `status` and `createdAt` are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub deadline: Option<NaiveDateTime>,
    pub assigned_user: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_assigned_user(mut self, user: impl Into<String>) -> Self {
        self.assigned_user = user.into();
        self
    }
}

/// Partial update. Only `Some` fields are written; there is no way to touch
/// `id` or `createdAt` through a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub assigned_user: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.assigned_user.is_none()
            && self.status.is_none()
    }
}
