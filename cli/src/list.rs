use chrono::{DateTime, Utc};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};
use taskboard_core::{format_deadline, Session, Task};

pub const OVERDUE_BANNER: &str = "Warning: There are tasks that have missed their deadlines!";

// Helper struct for Table Row
#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
    #[tabled(rename = "Assigned to")]
    assigned: String,
    #[tabled(rename = "")]
    flag: String,
}

/// Renders the tasks a session can see. Overdue rows are flagged and coloured.
pub fn render_tasks(tasks: &[Task], session: &Session, now: DateTime<Utc>) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let mut overdue_rows = Vec::new();
    let rows: Vec<TaskRow> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let overdue = task.is_overdue_at(now);
            if overdue {
                // +1 for the header row
                overdue_rows.push(i + 1);
            }
            let title = if task.description.is_empty() {
                task.title.clone()
            } else {
                format!("{}\n{}", task.title, task.description)
            };
            TaskRow {
                id: task.id.to_string(),
                title,
                status: task.status.to_string(),
                deadline: format_deadline(task.deadline.as_ref()),
                assigned: if session.is_project_manager() {
                    task.assigned_user.clone()
                } else {
                    "me".to_string()
                },
                flag: if overdue { "MISSED DEADLINE".to_string() } else { String::new() },
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    for row in overdue_rows {
        table.with(Modify::new(Rows::one(row)).with(Color::FG_RED));
    }

    let heading = if session.is_project_manager() { "All Tasks" } else { "My Tasks" };
    format!("{}\n{}", heading, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local};
    use taskboard_core::{NewTask, TaskStatus};

    #[test]
    fn test_empty_listing() {
        assert_eq!(render_tasks(&[], &Session::project_manager(), Utc::now()), "No tasks found.");
    }

    #[test]
    fn test_flags_overdue_rows() {
        let now = Local::now().naive_local();
        let late = Task::new(
            NewTask::new("Late report")
                .with_deadline(now - Duration::hours(1))
                .with_assigned_user("alice"),
        );
        let mut done = Task::new(
            NewTask::new("Finished")
                .with_deadline(now - Duration::hours(1))
                .with_assigned_user("bob"),
        );
        done.status = TaskStatus::Done;

        let out = render_tasks(&[late, done], &Session::project_manager(), Utc::now());
        assert!(out.starts_with("All Tasks"));
        assert!(out.contains("Late report"));
        assert!(out.contains("alice"));
        assert_eq!(out.matches("MISSED DEADLINE").count(), 1);
        // Overdue row is painted red
        assert!(out.contains("\u{1b}[31m"));
    }

    #[test]
    fn test_user_heading() {
        let task = Task::new(NewTask::new("Mine").with_assigned_user("bob"));
        let out = render_tasks(&[task], &Session::user("bob"), Utc::now());
        assert!(out.starts_with("My Tasks"));
        assert!(out.contains("No deadline"));
    }
}
