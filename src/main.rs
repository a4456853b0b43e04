//! Studioboard CLI
//!
//! Browse and edit the studio dashboard's projects, tasks, team and items
//! against the Studioboard REST backend.

mod commands;
mod config;
mod console;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use studioboard_client::{StudioApi, API_URL_ENV};
use studioboard_proto::{ItemStatus, ProjectStatus};
use studioboard_store::CancellationToken;

use commands::{Session, RECENT_TASKS};
use config::ConfigManager;
use console::ConsoleNotifier;

/// Studioboard - manage studio projects from the terminal
#[derive(Parser, Debug)]
#[command(name = "studioboard")]
#[command(about = "Studioboard - manage studio projects, tasks and team from the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL (overrides the configured one)
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show project totals and the most recent tasks
    Dashboard {
        /// Number of recent tasks to list
        #[arg(long, default_value_t = RECENT_TASKS)]
        recent: usize,
    },

    /// Manage projects
    #[command(subcommand)]
    Projects(ProjectCommands),

    /// Manage the tasks of one project
    Tasks {
        /// Project ID
        project_id: String,

        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage team members
    #[command(subcommand)]
    Team(TeamCommands),

    /// Manage inventory items
    #[command(subcommand)]
    Items(ItemCommands),

    /// Manage CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List all projects
    List,
    /// Create a project
    Create {
        name: String,
        /// Studio the project belongs to
        #[arg(long)]
        studio: String,
        #[arg(long, value_enum)]
        status: Option<ProjectStatusArg>,
        /// Hex colour, e.g. #2563eb
        #[arg(long)]
        color: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
        /// Team member ID leading the project
        #[arg(long)]
        lead: Option<String>,
    },
    /// Update project fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        studio: Option<String>,
        #[arg(long, value_enum)]
        status: Option<ProjectStatusArg>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Set project progress (0-100)
    Progress { id: String, value: f64 },
    /// Delete a project
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List the project's tasks
    List,
    /// Add a task
    Add {
        title: String,
        /// Team member ID to assign
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Flip a task between open and complete
    Toggle { task_id: String },
    /// Rename a task
    Rename { task_id: String, title: String },
    /// Assign a task; omit the member to unassign
    Assign {
        task_id: String,
        member: Option<String>,
    },
    /// Delete a task
    Delete { task_id: String },
}

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// List team members with their workload
    List,
    /// Add a team member
    Add {
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        avatar: Option<String>,
        /// Concurrent tasks the member can take
        #[arg(long)]
        capacity: Option<u32>,
    },
    /// Update a team member; an empty avatar clears it
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        capacity: Option<u32>,
    },
    /// Remove a team member
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// List all items
    List,
    /// Show one item
    Show { id: String },
    /// Show inventory statistics
    Stats,
    /// Create an item
    Create {
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        quantity: u32,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        status: Option<ItemStatusArg>,
    },
    /// Update an item; an empty description clears it
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        status: Option<ItemStatusArg>,
    },
    /// Delete an item
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the configuration in effect
    Show,
    /// Set the default backend URL
    SetUrl { url: String },
    /// Clear the default backend URL
    ClearUrl,
    /// Set the request timeout in seconds
    SetTimeout { secs: u64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ProjectStatusArg {
    Planned,
    InProgress,
    AtRisk,
    Completed,
}

impl From<ProjectStatusArg> for ProjectStatus {
    fn from(arg: ProjectStatusArg) -> Self {
        match arg {
            ProjectStatusArg::Planned => ProjectStatus::Planned,
            ProjectStatusArg::InProgress => ProjectStatus::InProgress,
            ProjectStatusArg::AtRisk => ProjectStatus::AtRisk,
            ProjectStatusArg::Completed => ProjectStatus::Completed,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ItemStatusArg {
    Active,
    Inactive,
    Pending,
}

impl From<ItemStatusArg> for ItemStatus {
    fn from(arg: ItemStatusArg) -> Self {
        match arg {
            ItemStatusArg::Active => ItemStatus::Active,
            ItemStatusArg::Inactive => ItemStatus::Inactive,
            ItemStatusArg::Pending => ItemStatus::Pending,
        }
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date: {}", value))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Setup logging with the specified log level
///
/// Logs go to stderr so command output stays clean. `RUST_LOG` wins when set.
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

fn handle_config(command: ConfigCommands, api_url: Option<&str>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let path = ConfigManager::config_path()?;
            let config = ConfigManager::load()?;
            let client = config.client_config(api_url)?;
            println!("Config file: {}", path.display());
            println!("API URL:     {}", client.base_url);
            println!("Timeout:     {}s", client.timeout.as_secs());
        }
        ConfigCommands::SetUrl { url } => {
            ConfigManager::set_api_url(url.clone())?;
            println!("✓ Default API URL set to {}", url);
        }
        ConfigCommands::ClearUrl => {
            ConfigManager::clear_api_url()?;
            println!("✓ Default API URL cleared");
        }
        ConfigCommands::SetTimeout { secs } => {
            ConfigManager::set_timeout(secs)?;
            println!("✓ Request timeout set to {}s", secs);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let command = match cli.command {
        Commands::Config(command) => return handle_config(command, cli.api_url.as_deref()),
        command => command,
    };

    let client_config = ConfigManager::load()?.client_config(cli.api_url.as_deref())?;
    info!("Using backend at {}", client_config.base_url);
    let api = StudioApi::connect(client_config).context("Failed to create API client")?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted, cancelling in-flight requests");
            ctrl_c.cancel();
        }
    });

    let session = Session {
        api,
        notifier: Arc::new(ConsoleNotifier),
        shutdown,
    };

    match command {
        Commands::Dashboard { recent } => commands::dashboard(&session, recent).await,
        Commands::Projects(command) => commands::projects(&session, command).await,
        Commands::Tasks {
            project_id,
            command,
        } => commands::tasks(&session, project_id, command).await,
        Commands::Team(command) => commands::team(&session, command).await,
        Commands::Items(command) => commands::items(&session, command).await,
        Commands::Config(_) => Ok(()),
    }
}
