use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use taskdesk::models::auth::Role;
use taskdesk::models::objective::ObjectiveStatus;
use taskdesk::models::task::{Priority, TaskStatus};

/// Command-line client for the task & employee management API
#[derive(Parser)]
#[command(name = "taskdesk", version, about)]
pub struct Cli {
    /// Backend base URL (overrides TASKDESK_API_URL)
    #[arg(long, global = true, env = "TASKDESK_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and cache the session token
    Login {
        #[arg(long)]
        email: String,
        /// Falls back to TASKDESK_PASSWORD
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the cached token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Change the signed-in user's password
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },

    /// Read and manage notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage objectives
    Objectives {
        #[command(subcommand)]
        command: ObjectiveCommands,
    },

    /// Manage the employee directory (admin)
    Employees {
        #[command(subcommand)]
        command: EmployeeCommands,
    },
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// List notifications, newest first
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },
    /// Print the unread count
    Count,
    /// Mark one notification read
    Read { id: String },
    /// Mark every notification read
    ReadAll,
    /// Delete a notification
    Delete { id: String },
    /// Poll and print unread changes until Ctrl-C
    Watch {
        /// Seconds between polls (defaults to TASKDESK_POLL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Args, Default)]
pub struct TaskFilterArgs {
    #[arg(long)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub assigned_to: Option<String>,
    #[arg(long)]
    pub objective: Option<String>,
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Default)]
pub struct TaskFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Employee id of the assignee
    #[arg(long)]
    pub assign: Option<String>,
    /// Additional assignees, comma separated
    #[arg(long, value_delimiter = ',')]
    pub also_assign: Vec<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub objective: Option<String>,
    #[arg(long)]
    pub progress: Option<u8>,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List tasks visible to the signed-in user
    List {
        #[command(flatten)]
        filter: TaskFilterArgs,
    },
    /// Show one task
    Show { id: String },
    /// Tasks assigned to or created by me
    Mine,
    /// Create a task
    Create {
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Update fields on a task
    Update {
        id: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Change a task's status
    Status { id: String, status: TaskStatus },
    /// Delete a task
    Delete { id: String },
    /// Attach a local file to a task
    Upload { id: String, file: PathBuf },
    /// List a task's attachments
    Attachments { id: String },
    /// List a task's notes
    Notes { id: String },
    /// Add a progress note to a task
    Note {
        id: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        progress: Option<u8>,
    },
    /// Dashboard counters
    Stats {
        /// Count from the fetched list instead of the dashboard endpoint
        #[arg(long)]
        local: bool,
    },
    /// Poll the task list and print changes until Ctrl-C
    Watch {
        #[arg(long)]
        interval: Option<u64>,
        #[command(flatten)]
        filter: TaskFilterArgs,
    },
}

#[derive(Args, Default)]
pub struct ObjectiveFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub deadline: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub status: Option<ObjectiveStatus>,
}

#[derive(Subcommand)]
pub enum ObjectiveCommands {
    List,
    Show { id: String },
    Create {
        #[command(flatten)]
        fields: ObjectiveFields,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: ObjectiveFields,
    },
    Delete { id: String },
}

#[derive(Args, Default)]
pub struct EmployeeFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long, value_parser = parse_role)]
    pub role: Option<Role>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub experience: Option<f32>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub skills: Option<Vec<String>>,
    #[arg(long)]
    pub linkedin: Option<String>,
    #[arg(long)]
    pub telegram: Option<String>,
}

#[derive(Subcommand)]
pub enum EmployeeCommands {
    List {
        /// Include deactivated employees
        #[arg(long)]
        all: bool,
    },
    Show { id: String },
    Create {
        #[command(flatten)]
        fields: EmployeeFields,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: EmployeeFields,
    },
    /// Soft delete
    Deactivate { id: String },
    Activate { id: String },
    /// Permanent delete
    Remove {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    ResetPassword { id: String },
    UploadPhoto { id: String, file: PathBuf },
    RemovePhoto { id: String },
    /// Set or clear (empty string) the job description link
    JdLink { id: String, url: String },
}

fn parse_role(s: &str) -> Result<Role, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "superadmin" => Ok(Role::Superadmin),
        "admin" => Ok(Role::Admin),
        "employee" => Ok(Role::Employee),
        other => Err(format!("invalid role '{}': expected superadmin, admin or employee", other)),
    }
}
