//! Command-line interface for flow
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::context::AppContext;
use crate::error::Result;
use crate::output::OutputOptions;

mod category;
mod directory;
mod init;
mod report;
mod request;
mod session;
mod task;
mod update;

/// flow - task tracking for small teams
///
/// Tasks, per-task updates, categories and purchase requests stored in
/// per-user JSON files or a shared workbook.
#[derive(Parser, Debug)]
#[command(name = "flow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the stores (defaults to current directory)
    #[arg(long, global = true, env = "FLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (defaults to flow.toml in the data directory)
    #[arg(long, global = true, env = "FLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Identity key to act as
    #[arg(long, global = true, env = "FLOW_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default flow.toml and the session directory
    Init {
        /// Overwrite an existing flow.toml
        #[arg(long)]
        force: bool,
    },

    /// Sign in and remember the identity for later commands
    Login {
        /// Identity key (or the manager alias)
        key: String,

        /// Shared secret for the identity
        #[arg(long, env = "FLOW_SECRET", hide_env_values = true)]
        secret: String,
    },

    /// Forget the remembered identity
    Logout,

    /// Show the resolved identity and its role
    Whoami,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Per-task update log
    #[command(subcommand)]
    Update(UpdateCommands),

    /// Category management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Purchase requests (RC)
    #[command(subcommand)]
    Request(RequestCommands),

    /// Summaries over the visible tasks
    #[command(subcommand)]
    Report(ReportCommands),

    /// Employee directory
    #[command(subcommand)]
    Directory(DirectoryCommands),
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        #[arg(default_value = "")]
        title: String,

        /// Responsible person (defaults to the current identity's name)
        #[arg(long)]
        responsible: Option<String>,

        /// Category key or name
        #[arg(long, short)]
        category: Option<String>,

        /// Priority: baixa/low, média/medium, alta/high, urgente/urgent
        #[arg(long, short, default_value = "medium")]
        priority: String,

        /// Status: pending, in-progress, review, done
        #[arg(long, short, default_value = "pending")]
        status: String,

        /// Due date (YYYY-MM-DD or DD/MM/YYYY, defaults to today)
        #[arg(long, short)]
        due: Option<String>,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,

        /// Collaborator names (repeatable)
        #[arg(long = "collaborator")]
        collaborators: Vec<String>,

        /// Create an attendance task under this subcategory
        #[arg(long)]
        attendance: Option<String>,

        /// Registration number to look up in the employee directory
        #[arg(long, requires = "attendance")]
        person: Option<String>,

        /// Name of a person outside the directory
        #[arg(long, requires = "attendance", conflicts_with = "person")]
        person_name: Option<String>,

        /// Phone of a person outside the directory
        #[arg(long, requires = "person_name")]
        person_phone: Option<String>,

        /// E-mail of a person outside the directory
        #[arg(long, requires = "person_name")]
        person_email: Option<String>,
    },

    /// List visible tasks
    List {
        /// Filter by category key or name
        #[arg(long, short)]
        category: Option<String>,

        /// Filter by responsible (case-insensitive)
        #[arg(long)]
        responsible: Option<String>,

        /// Filter by priority
        #[arg(long, short)]
        priority: Option<String>,

        /// Filter by status
        #[arg(long, short)]
        status: Option<String>,

        /// Only tasks due today
        #[arg(long)]
        due_today: bool,

        /// Free-text search over title, category and responsible
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one task with its updates
    Show {
        /// Task id
        id: i64,
    },

    /// Change a task's status
    Status {
        /// Task id
        id: i64,

        /// New status
        status: String,
    },

    /// Change a task's priority
    Priority {
        /// Task id
        id: i64,

        /// New priority
        priority: String,
    },

    /// Edit task fields
    Edit {
        /// Task id
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Due date (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long)]
        due: Option<String>,

        /// Category key or name
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        responsible: Option<String>,

        /// Replace the collaborator list (repeatable)
        #[arg(long = "collaborator")]
        collaborators: Option<Vec<String>>,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: i64,
    },

    /// Set or clear manager feedback on a task
    Feedback {
        /// Task id
        id: i64,

        /// Feedback text (empty clears it)
        #[arg(default_value = "")]
        text: String,
    },

    /// Copy a file into the uploads directory and attach it to a task
    Attach {
        /// Task id
        id: i64,

        /// File to attach
        file: PathBuf,
    },

    /// Report attachments whose files are missing
    CheckAttachments {
        /// Only check this task
        id: Option<i64>,
    },
}

/// Update subcommands
#[derive(Subcommand, Debug)]
pub enum UpdateCommands {
    /// Post an update on a task
    Add {
        /// Task id
        task_id: i64,

        /// Update text
        content: String,
    },

    /// List a task's updates, newest first
    List {
        /// Task id
        task_id: i64,
    },

    /// Replace an update's text
    Edit {
        /// Update id
        id: i64,

        /// New text
        content: String,
    },

    /// Delete an update
    Delete {
        /// Update id
        id: i64,
    },
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories visible to the current identity
    List,

    /// Create a category owned by the current identity
    Add {
        /// Category name
        name: String,

        /// Icon shown before the name
        #[arg(long, default_value = crate::category::DEFAULT_ICON)]
        icon: String,
    },

    /// Delete a category
    Delete {
        /// Category key (e.g. "📌 Compras") or name
        key: String,
    },
}

/// Request subcommands
#[derive(Subcommand, Debug)]
pub enum RequestCommands {
    /// Open a purchase request
    Add {
        /// What is being requested
        description: String,

        /// RC code
        #[arg(long)]
        rc_code: Option<String>,

        /// Buyer handling the request
        #[arg(long)]
        buyer: Option<String>,

        /// Subelement (defaults to RC)
        #[arg(long)]
        subelement: Option<String>,
    },

    /// List purchase requests
    List,
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Headline counts
    Stats,

    /// Weekly follow-up summary
    FollowUp,

    /// Month calendar with tasks per day
    Calendar {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },

    /// Tasks grouped by due month for a year
    Schedule {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Counts by status, priority, category and responsible
    Breakdown,
}

/// Directory subcommands
#[derive(Subcommand, Debug)]
pub enum DirectoryCommands {
    /// Look up a person by registration number
    Lookup {
        /// Registration number (matrícula)
        matricula: String,
    },
}

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct Globals {
    pub data_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Globals {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    pub fn context(&self) -> Result<AppContext> {
        AppContext::load(
            self.data_dir.clone(),
            self.config.as_deref(),
            self.user.as_deref(),
        )
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let globals = Globals {
            data_dir: self.data_dir,
            config: self.config,
            user: self.user,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init { force } => init::run(&globals, force),
            Commands::Login { key, secret } => session::run_login(&globals, &key, &secret),
            Commands::Logout => session::run_logout(&globals),
            Commands::Whoami => session::run_whoami(&globals),
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    responsible,
                    category,
                    priority,
                    status,
                    due,
                    description,
                    collaborators,
                    attendance,
                    person,
                    person_name,
                    person_phone,
                    person_email,
                } => task::run_new(
                    &globals,
                    task::NewOptions {
                        title,
                        responsible,
                        category,
                        priority,
                        status,
                        due,
                        description,
                        collaborators,
                        attendance,
                        person,
                        person_name,
                        person_phone,
                        person_email,
                    },
                ),
                TaskCommands::List {
                    category,
                    responsible,
                    priority,
                    status,
                    due_today,
                    search,
                } => task::run_list(
                    &globals,
                    task::ListOptions {
                        category,
                        responsible,
                        priority,
                        status,
                        due_today,
                        search,
                    },
                ),
                TaskCommands::Show { id } => task::run_show(&globals, id),
                TaskCommands::Status { id, status } => task::run_status(&globals, id, &status),
                TaskCommands::Priority { id, priority } => {
                    task::run_priority(&globals, id, &priority)
                }
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    due,
                    category,
                    responsible,
                    collaborators,
                } => task::run_edit(
                    &globals,
                    task::EditOptions {
                        id,
                        title,
                        description,
                        due,
                        category,
                        responsible,
                        collaborators,
                    },
                ),
                TaskCommands::Delete { id } => task::run_delete(&globals, id),
                TaskCommands::Feedback { id, text } => task::run_feedback(&globals, id, &text),
                TaskCommands::Attach { id, file } => task::run_attach(&globals, id, &file),
                TaskCommands::CheckAttachments { id } => {
                    task::run_check_attachments(&globals, id)
                }
            },
            Commands::Update(cmd) => match cmd {
                UpdateCommands::Add { task_id, content } => {
                    update::run_add(&globals, task_id, &content)
                }
                UpdateCommands::List { task_id } => update::run_list(&globals, task_id),
                UpdateCommands::Edit { id, content } => update::run_edit(&globals, id, &content),
                UpdateCommands::Delete { id } => update::run_delete(&globals, id),
            },
            Commands::Category(cmd) => match cmd {
                CategoryCommands::List => category::run_list(&globals),
                CategoryCommands::Add { name, icon } => category::run_add(&globals, &icon, &name),
                CategoryCommands::Delete { key } => category::run_delete(&globals, &key),
            },
            Commands::Request(cmd) => match cmd {
                RequestCommands::Add {
                    description,
                    rc_code,
                    buyer,
                    subelement,
                } => request::run_add(
                    &globals,
                    request::AddOptions {
                        description,
                        rc_code,
                        buyer,
                        subelement,
                    },
                ),
                RequestCommands::List => request::run_list(&globals),
            },
            Commands::Report(cmd) => match cmd {
                ReportCommands::Stats => report::run_stats(&globals),
                ReportCommands::FollowUp => report::run_follow_up(&globals),
                ReportCommands::Calendar { year, month } => {
                    report::run_calendar(&globals, year, month)
                }
                ReportCommands::Schedule { year } => report::run_schedule(&globals, year),
                ReportCommands::Breakdown => report::run_breakdown(&globals),
            },
            Commands::Directory(cmd) => match cmd {
                DirectoryCommands::Lookup { matricula } => {
                    directory::run_lookup(&globals, &matricula)
                }
            },
        }
    }
}
