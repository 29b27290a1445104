//! Caller-declared roles and the task views they get.
//!
//! Nothing here is enforced by the store; these are the rules the front end
//! applies before calling it.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::task::{Task, TaskStatus};

pub const PM_ROLE: &str = "pm";
const PM_DISPLAY_NAME: &str = "Project Manager";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    ProjectManager,
    User(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
}

impl Session {
    pub fn project_manager() -> Self {
        Self { role: Role::ProjectManager }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self { role: Role::User(name.into()) }
    }

    /// `pm` selects the project manager; any other value must name a known user.
    pub fn login(role: &str, users: &[String]) -> Result<Self> {
        let role = role.trim();
        if role.eq_ignore_ascii_case(PM_ROLE) {
            return Ok(Self::project_manager());
        }
        if role.is_empty() {
            return Err(Error::InvalidInput("Please select a user".to_string()));
        }
        match users.iter().find(|u| u.as_str() == role) {
            Some(user) => Ok(Self::user(user.clone())),
            None => Err(Error::InvalidInput(format!("Unknown user: '{}'", role))),
        }
    }

    pub fn username(&self) -> &str {
        match &self.role {
            Role::ProjectManager => PM_DISPLAY_NAME,
            Role::User(name) => name.as_str(),
        }
    }

    pub fn is_project_manager(&self) -> bool {
        matches!(self.role, Role::ProjectManager)
    }

    /// Creating, editing, deleting and resetting are project manager actions.
    pub fn can_manage_tasks(&self) -> bool {
        self.is_project_manager()
    }

    pub fn can_update_status(&self, task: &Task) -> bool {
        match &self.role {
            Role::ProjectManager => true,
            Role::User(name) => &task.assigned_user == name,
        }
    }

    /// Only the project manager gets the missed-deadline warning.
    pub fn overdue_warning_at(&self, tasks: &[Task], now: DateTime<Utc>) -> bool {
        self.is_project_manager() && tasks.iter().any(|t| t.is_overdue_at(now))
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Role::ProjectManager => f.write_str(PM_DISPLAY_NAME),
            Role::User(name) => write!(f, "{} (User)", name),
        }
    }
}

/// Tasks the session may see, optionally narrowed to one status. Order is preserved.
pub fn visible_tasks(tasks: &[Task], session: &Session, status: Option<TaskStatus>) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| match &session.role {
            Role::ProjectManager => true,
            Role::User(name) => &t.assigned_user == name,
        })
        .filter(|t| status.map_or(true, |s| t.status == s))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::NewTask;
    use chrono::{Duration, Local};

    fn users() -> Vec<String> {
        vec!["alice".to_string(), "bob".to_string()]
    }

    fn tasks() -> Vec<Task> {
        let mut a = Task::new(NewTask::new("A").with_assigned_user("alice"));
        let b = Task::new(NewTask::new("B").with_assigned_user("bob"));
        let c = Task::new(NewTask::new("C").with_assigned_user("alice"));
        a.status = TaskStatus::Done;
        vec![a, b, c]
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_login() {
        assert_eq!(Session::login("pm", &users()).unwrap(), Session::project_manager());
        assert_eq!(Session::login("PM", &users()).unwrap(), Session::project_manager());
        assert_eq!(Session::login("bob", &users()).unwrap(), Session::user("bob"));
        assert!(Session::login("mallory", &users()).is_err());
        assert!(Session::login("  ", &users()).is_err());
    }

    #[test]
    fn test_project_manager_sees_everything() {
        let all = tasks();
        let visible = visible_tasks(&all, &Session::project_manager(), None);
        assert_eq!(titles(&visible), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_user_sees_own_tasks_with_filter() {
        let all = tasks();
        let session = Session::user("alice");
        assert_eq!(titles(&visible_tasks(&all, &session, None)), vec!["A", "C"]);
        assert_eq!(titles(&visible_tasks(&all, &session, Some(TaskStatus::Pending))), vec!["C"]);
        assert!(visible_tasks(&all, &session, Some(TaskStatus::InProgress)).is_empty());
    }

    #[test]
    fn test_permissions() {
        let all = tasks();
        let bob = Session::user("bob");
        assert!(!bob.can_manage_tasks());
        assert!(bob.can_update_status(&all[1]));
        assert!(!bob.can_update_status(&all[0]));
        assert!(Session::project_manager().can_update_status(&all[0]));
        assert_eq!(bob.to_string(), "bob (User)");
        assert_eq!(Session::project_manager().username(), "Project Manager");
    }

    #[test]
    fn test_overdue_warning_only_for_project_manager() {
        let late = Task::new(
            NewTask::new("Late").with_deadline(Local::now().naive_local() - Duration::hours(1)),
        );
        let now = Utc::now();
        assert!(Session::project_manager().overdue_warning_at(&[late.clone()], now));
        assert!(!Session::user("alice").overdue_warning_at(&[late], now));
        assert!(!Session::project_manager().overdue_warning_at(&[], now));
    }
}
