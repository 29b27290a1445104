mod list;
mod prompt;
mod watch;

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use taskboard_core::{
    parse_task_fields, visible_tasks, FileStorage, Session, TaskId, TaskPatch, TaskStatus, TaskStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::list::{render_tasks, OVERDUE_BANNER};
use crate::watch::OverdueWatch;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Assign tasks with deadlines and track their status", long_about = None)]
struct Cli {
    /// Directory holding users.json and tasks.json (default: ~/.taskboard)
    #[arg(long, global = true, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log in as the project manager (`pm`) or as one of the users
    #[arg(long = "as", global = true, default_value = "pm", value_name = "ROLE")]
    role: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List the known users
    Users,
    /// Add a task (usage: add "Ship v1" due:2024-01-01T00:00 user:alice desc:"first release")
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Change the title, deadline, assignee or description of a task
    Edit {
        id: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Set the status of a task (pending, in-progress, done)
    Status { id: String, status: String },
    /// Delete a task
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List tasks visible to the current session
    List {
        /// Only show tasks with this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Report tasks that missed their deadline
    Overdue,
    /// Re-check overdue tasks periodically
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 60)]
        interval: u64,
        /// Stop after this many checks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Erase all tasks and restore the default users
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_core=warn,taskboard=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let storage = FileStorage::new(cli.data_dir).context("Failed to open data directory")?;
    tracing::debug!("Using data directory: {:?}", storage.base_dir());
    let store = TaskStore::new(storage);

    store.initialize_users()?;
    let users = store.get_users()?;
    let session = Session::login(&cli.role, &users)?;

    match cli.command {
        Some(Commands::Users) => {
            for user in &users {
                println!("{}", user);
            }
        }
        Some(Commands::Add { args }) => {
            ensure_manager(&session, "add tasks")?;
            let draft = parse_task_fields(&args)?.into_new_task(&users)?;
            let tasks = store.add_task(draft)?;
            if let Some(task) = tasks.last() {
                println!("Task added: {} (ID: {})", task.title, task.id);
                println!("  Assigned to: {}", task.assigned_user);
                println!("  Deadline: {}", taskboard_core::format_deadline(task.deadline.as_ref()));
            }
        }
        Some(Commands::Edit { id, args }) => {
            ensure_manager(&session, "edit tasks")?;
            let id = TaskId::from(id);
            let patch = parse_task_fields(&args)?.into_patch(&users)?;
            if store.get_task(&id)?.is_none() {
                println!("Task {} not found.", id);
                return Ok(());
            }
            store.update_task(&id, patch)?;
            println!("Task {} updated.", id);
        }
        Some(Commands::Status { id, status }) => {
            let id = TaskId::from(id);
            let status: TaskStatus = status.parse()?;
            let Some(task) = store.get_task(&id)? else {
                println!("Task {} not found.", id);
                return Ok(());
            };
            if !session.can_update_status(&task) {
                bail!("{} can only update tasks assigned to them", session.username());
            }
            store.update_task(&id, TaskPatch::status(status))?;
            println!("Task {} is now {}.", id, status);
        }
        Some(Commands::Delete { id, yes }) => {
            ensure_manager(&session, "delete tasks")?;
            let id = TaskId::from(id);
            if !yes && !prompt::confirm("Are you sure you want to delete this task?")? {
                println!("Cancelled.");
                return Ok(());
            }
            let before = store.get_tasks()?.len();
            let after = store.delete_task(&id)?.len();
            if after < before {
                println!("Task {} deleted.", id);
            } else {
                println!("Task {} not found.", id);
            }
        }
        Some(Commands::List { status }) => {
            let status = status.map(|s| s.parse::<TaskStatus>()).transpose()?;
            show_list(&store, &session, status)?;
        }
        Some(Commands::Overdue) => {
            let overdue = store.overdue_tasks()?;
            let visible = visible_tasks(&overdue, &session, None);
            if visible.is_empty() {
                println!("No tasks have missed their deadlines.");
            } else {
                if session.is_project_manager() {
                    println!("{}", OVERDUE_BANNER);
                }
                println!("{}", render_tasks(&visible, &session, Utc::now()));
            }
        }
        Some(Commands::Watch { interval, ticks }) => {
            if !session.is_project_manager() {
                bail!("Only the project manager receives overdue warnings");
            }
            let mut remaining = ticks;
            let watch = OverdueWatch::spawn(Duration::from_secs(interval.max(1)), move || {
                match store.has_overdue_tasks() {
                    Ok(true) => println!("[{}] {}", Utc::now().format("%H:%M:%S"), OVERDUE_BANNER),
                    Ok(false) => tracing::debug!("no overdue tasks"),
                    Err(e) => tracing::warn!(error = %e, "overdue check failed"),
                }
                match remaining.as_mut() {
                    Some(n) if *n <= 1 => ControlFlow::Break(()),
                    Some(n) => {
                        *n -= 1;
                        ControlFlow::Continue(())
                    }
                    None => ControlFlow::Continue(()),
                }
            });
            if ticks.is_some() {
                watch.join();
            } else {
                println!("Checking for missed deadlines every {}s. Press Enter to stop.", interval.max(1));
                // Without a terminal there is nothing to wait on; run until killed.
                if prompt::wait_for_enter()? {
                    watch.cancel();
                } else {
                    watch.join();
                }
            }
        }
        Some(Commands::Reset { yes }) => {
            ensure_manager(&session, "reset data")?;
            if !yes
                && !prompt::confirm("Are you sure you want to reset all data? This action cannot be undone.")?
            {
                println!("Cancelled.");
                return Ok(());
            }
            store.reset_data()?;
            println!("All data has been reset successfully!");
        }
        None => {
            show_list(&store, &session, None)?;
        }
    }
    Ok(())
}

fn ensure_manager(session: &Session, action: &str) -> Result<()> {
    if !session.can_manage_tasks() {
        bail!("Only the project manager can {}", action);
    }
    Ok(())
}

fn show_list(store: &TaskStore<FileStorage>, session: &Session, status: Option<TaskStatus>) -> Result<()> {
    let tasks = store.get_tasks()?;
    let now = Utc::now();
    println!("Logged in as: {}", session);
    if session.overdue_warning_at(&tasks, now) {
        println!("{}", OVERDUE_BANNER);
    }
    let visible = visible_tasks(&tasks, session, status);
    println!("{}", render_tasks(&visible, session, now));
    Ok(())
}
