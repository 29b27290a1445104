pub mod error;
pub mod input;
pub mod model;
pub mod service;
pub mod session;
pub mod storage;
pub mod time;

pub use error::{Error, Result};
pub use input::{expand_key, parse_args, parse_task_fields, ParsedInput, TaskFields};
pub use model::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};
pub use service::task_store::{default_users, is_task_overdue, TaskStore, DEFAULT_USERS};
pub use session::{visible_tasks, Role, Session};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use time::{format_deadline, parse_deadline};
