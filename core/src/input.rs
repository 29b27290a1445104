use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::model::task::{NewTask, TaskPatch};
use crate::time::parse_deadline;

pub const TASK_KEYS: [&str; 3] = ["due", "user", "description"];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub name: String,
    /// `key:value` pairs in the order given, repeats included.
    pub metadata: Vec<(String, String)>,
}

/// Splits words into a free-text name and `key:value` metadata.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut name_parts = Vec::new();
    let mut metadata = Vec::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && !key.contains(char::is_whitespace) {
                metadata.push((key.to_string(), value.to_string()));
                continue;
            }
        }
        name_parts.push(arg.as_str());
    }

    ParsedInput {
        name: name_parts.join(" "),
        metadata,
    }
}

/// Resolves an exact key or an unambiguous prefix of one of `candidates`.
pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(Error::InvalidInput(format!("Unknown key: '{}'", key))),
        _ => Err(Error::InvalidInput(format!("Ambiguous key: '{}' matches {:?}", key, matches))),
    }
}

/// Task fields as typed on a command line, before validation.
#[derive(Debug, Default, PartialEq)]
pub struct TaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub assigned_user: Option<String>,
}

pub fn parse_task_fields(args: &[String]) -> Result<TaskFields> {
    let parsed = parse_args(args);
    let mut fields = TaskFields::default();

    let title = parsed.name.trim();
    if !title.is_empty() {
        fields.title = Some(title.to_string());
    }

    let mut seen = HashSet::new();
    for (key, value) in parsed.metadata {
        let full = expand_key(&key, &TASK_KEYS)?;
        if !seen.insert(full.clone()) {
            return Err(Error::InvalidInput(format!("Duplicate key: '{}' given more than once", full)));
        }
        match full.as_str() {
            "due" => fields.deadline = Some(parse_deadline(&value)?),
            "user" => fields.assigned_user = Some(value.trim().to_string()),
            _ => fields.description = Some(value.trim().to_string()),
        }
    }

    Ok(fields)
}

impl TaskFields {
    /// Checks everything a new task needs: a title, a deadline and a known assignee.
    pub fn into_new_task(self, users: &[String]) -> Result<NewTask> {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("Please enter a task title".to_string()))?;
        let deadline = self
            .deadline
            .ok_or_else(|| Error::InvalidInput("Please select a deadline".to_string()))?;
        let user = self
            .assigned_user
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::InvalidInput("Please assign a user".to_string()))?;
        ensure_known_user(&user, users)?;

        Ok(NewTask::new(title.trim())
            .with_description(self.description.unwrap_or_default())
            .with_deadline(deadline)
            .with_assigned_user(user))
    }

    /// Builds a patch from whichever fields were supplied.
    pub fn into_patch(self, users: &[String]) -> Result<TaskPatch> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::InvalidInput("Please enter a task title".to_string()));
            }
        }
        if let Some(user) = &self.assigned_user {
            ensure_known_user(user, users)?;
        }

        let patch = TaskPatch {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            deadline: self.deadline,
            assigned_user: self.assigned_user,
            status: None,
        };
        if patch.is_empty() {
            return Err(Error::InvalidInput("Nothing to update".to_string()));
        }
        Ok(patch)
    }
}

fn ensure_known_user(user: &str, users: &[String]) -> Result<()> {
    if users.iter().any(|u| u == user) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("Unknown user: '{}'", user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn users() -> Vec<String> {
        vec!["alice".to_string(), "bob".to_string(), "charlie".to_string()]
    }

    #[test]
    fn test_parse_simple() {
        let parsed = parse_args(&args(&["Ship", "v1", "due:2024-01-01T00:00", "user:alice"]));
        assert_eq!(parsed.name, "Ship v1");
        assert_eq!(
            parsed.metadata,
            vec![
                ("due".to_string(), "2024-01-01T00:00".to_string()),
                ("user".to_string(), "alice".to_string()),
            ]
        );
    }

    #[test]
    fn test_quoted_words_with_colon_stay_in_name() {
        let parsed = parse_args(&args(&["Fix login: redirect"]));
        assert_eq!(parsed.name, "Fix login: redirect");
        assert!(parsed.metadata.is_empty());
    }

    #[test]
    fn test_expand_key() {
        assert_eq!(expand_key("du", &TASK_KEYS).unwrap(), "due");
        assert_eq!(expand_key("u", &TASK_KEYS).unwrap(), "user");
        assert_eq!(expand_key("desc", &TASK_KEYS).unwrap(), "description");
        assert_eq!(expand_key("due", &TASK_KEYS).unwrap(), "due");

        // Ambiguous
        assert!(expand_key("d", &TASK_KEYS).is_err());
        // Unknown
        assert!(expand_key("x", &TASK_KEYS).is_err());
    }

    #[test]
    fn test_new_task_from_fields() {
        let fields = parse_task_fields(&args(&[
            "Ship",
            "v1",
            "due:2024-01-01T00:00",
            "u:alice",
            "desc:first release",
        ]))
        .unwrap();
        let draft = fields.into_new_task(&users()).unwrap();

        assert_eq!(draft.title, "Ship v1");
        assert_eq!(draft.description, "first release");
        assert_eq!(draft.assigned_user, "alice");
        assert_eq!(
            draft.deadline,
            Some(NaiveDateTime::parse_from_str("2024-01-01T00:00", "%Y-%m-%dT%H:%M").unwrap())
        );
    }

    #[test]
    fn test_new_task_requires_title_deadline_and_user() {
        let missing_title = parse_task_fields(&args(&["due:2024-01-01", "user:bob"])).unwrap();
        assert!(matches!(missing_title.into_new_task(&users()), Err(Error::InvalidInput(_))));

        let missing_due = parse_task_fields(&args(&["Title", "user:bob"])).unwrap();
        assert!(missing_due.into_new_task(&users()).is_err());

        let missing_user = parse_task_fields(&args(&["Title", "due:2024-01-01"])).unwrap();
        assert!(missing_user.into_new_task(&users()).is_err());

        let unknown_user = parse_task_fields(&args(&["Title", "due:2024-01-01", "user:zed"])).unwrap();
        assert!(unknown_user.into_new_task(&users()).is_err());
    }

    #[test]
    fn test_bad_metadata_is_rejected() {
        assert!(parse_task_fields(&args(&["Title", "due:someday"])).is_err());
        assert!(parse_task_fields(&args(&["Title", "d:2024-01-01"])).is_err());
        assert!(parse_task_fields(&args(&["Title", "priority:high"])).is_err());
    }

    #[test]
    fn test_repeated_key_is_rejected() {
        let same = parse_task_fields(&args(&["Title", "due:2024-01-01", "due:2024-02-02"]));
        assert!(matches!(same, Err(Error::InvalidInput(msg)) if msg.contains("due")));

        // A prefix and the full key name the same field
        let prefixed = parse_task_fields(&args(&["Title", "due:2024-01-01", "du:2024-02-02"]));
        assert!(matches!(prefixed, Err(Error::InvalidInput(_))));

        let users = parse_task_fields(&args(&["Title", "u:alice", "user:bob"]));
        assert!(users.is_err());
    }

    #[test]
    fn test_patch_from_fields() {
        let fields = parse_task_fields(&args(&["user:charlie"])).unwrap();
        let patch = fields.into_patch(&users()).unwrap();
        assert_eq!(patch.assigned_user, Some("charlie".to_string()));
        assert!(patch.title.is_none());
        assert!(patch.status.is_none());

        let empty = parse_task_fields(&[]).unwrap();
        assert!(empty.into_patch(&users()).is_err());

        let unknown = parse_task_fields(&args(&["user:zed"])).unwrap();
        assert!(unknown.into_patch(&users()).is_err());
    }
}
