mod commands;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;
use tracing::debug;

use bugtrack::config::Config;
use bugtrack::db::Database;
use bugtrack::models::NewUser;
use bugtrack::{logging, Tracker};

use commands::init::{DATA_DIR, STORE_FILE};

#[derive(Parser)]
#[command(name = "bugtrack")]
#[command(about = "A local bug tracker backed by a key-value store")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a store with demo data in the current directory
    Init {
        /// Reset an existing store
        #[arg(short, long)]
        force: bool,
    },

    /// Log in as an existing user (any password is accepted)
    Login {
        /// Username
        username: String,
        /// Password
        #[arg(short, long, default_value = "")]
        password: String,
    },

    /// Register a new user and log in
    Register {
        /// Username
        username: String,
        /// Email address
        email: String,
        /// Password
        #[arg(short, long, default_value = "")]
        password: String,
        /// First name
        #[arg(long)]
        first_name: Option<String>,
        /// Last name
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Log out of the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List users
    Users {
        /// Match against username, email, or name
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Project management
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Issue management
    Issue {
        #[command(subcommand)]
        action: IssueCommands,
    },

    /// Add a comment to an issue
    Comment {
        /// Issue ID
        id: i64,
        /// Comment text
        text: String,
    },

    /// Show recent activity, newest first
    Activity {
        /// Only activity in this project
        #[arg(short, long)]
        project: Option<i64>,
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Issue counts by status and priority
    Stats {
        /// Only issues in this project
        #[arg(short, long)]
        project: Option<i64>,
    },

    /// Export every collection
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace every collection with a JSON export
    Import {
        /// Path to a JSON export
        path: String,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List projects
    List {
        /// Match against name or description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create a project
    Create {
        /// Project name
        name: String,
        /// Project description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show a project and its issues
    Show {
        /// Project ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum IssueCommands {
    /// List issues in a project
    List {
        /// Project ID
        project: i64,
        /// Filter by status (open, in_progress, closed)
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by priority (low, medium, high, critical)
        #[arg(short, long)]
        priority: Option<String>,
        /// Match against title or description
        #[arg(short = 'q', long)]
        search: Option<String>,
    },
    /// Create an issue in a project
    Create {
        /// Project ID
        project: i64,
        /// Issue title
        title: String,
        /// Issue description
        #[arg(short, long)]
        description: Option<String>,
        /// Priority (low, medium, high, critical)
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Assignee user ID
        #[arg(short, long)]
        assignee: Option<i64>,
    },
    /// Show issue details and comments
    Show {
        /// Issue ID
        id: i64,
    },
    /// Change status or assignee
    Update {
        /// Issue ID
        id: i64,
        /// New status (open, in_progress, closed)
        #[arg(short, long)]
        status: Option<String>,
        /// New assignee user ID
        #[arg(short, long)]
        assignee: Option<i64>,
        /// Clear the assignee
        #[arg(long)]
        unassign: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Markdown,
}

fn find_bugtrack_dir(config: &Config) -> Result<PathBuf> {
    if let Some(dir) = &config.dir {
        if !dir.is_dir() {
            bail!("{} does not exist. Run 'bugtrack init' first.", dir.display());
        }
        return Ok(dir.clone());
    }

    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(DATA_DIR);
        if candidate.exists() && candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a bugtrack directory (or any parent). Run 'bugtrack init' first.");
        }
    }
}

fn open_tracker(config: &Config) -> Result<Tracker> {
    let data_dir = find_bugtrack_dir(config)?;
    let db = Database::open(&data_dir.join(STORE_FILE)).context("Failed to open store")?;
    Ok(Tracker::new(Box::new(db), config.latency()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.config.log_format);
    cli.config.validate()?;
    debug!(api_base_url = %cli.config.api_base_url, "configuration loaded");

    if let Commands::Init { force } = cli.command {
        let data_dir = match &cli.config.dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()?.join(DATA_DIR),
        };
        return commands::init::run(&data_dir, force);
    }

    let tracker = open_tracker(&cli.config)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),

        Commands::Login { username, password } => {
            commands::auth::login(&tracker, &username, &password)
        }

        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => commands::auth::register(
            &tracker,
            NewUser {
                username,
                email,
                password,
                first_name,
                last_name,
            },
        ),

        Commands::Logout => commands::auth::logout(&tracker),

        Commands::Whoami => commands::auth::whoami(&tracker),

        Commands::Users { search } => commands::users::run(&tracker, search.as_deref()),

        Commands::Project { action } => match action {
            ProjectCommands::List { search } => {
                commands::project::list(&tracker, search.as_deref())
            }
            ProjectCommands::Create { name, description } => {
                commands::project::create(&tracker, &name, description.as_deref())
            }
            ProjectCommands::Show { id } => commands::project::show(&tracker, id),
        },

        Commands::Issue { action } => match action {
            IssueCommands::List {
                project,
                status,
                priority,
                search,
            } => commands::list::run(
                &tracker,
                project,
                status.as_deref(),
                priority.as_deref(),
                search.as_deref(),
            ),
            IssueCommands::Create {
                project,
                title,
                description,
                priority,
                assignee,
            } => commands::create::run(
                &tracker,
                project,
                &title,
                description.as_deref(),
                &priority,
                assignee,
            ),
            IssueCommands::Show { id } => commands::show::run(&tracker, id),
            IssueCommands::Update {
                id,
                status,
                assignee,
                unassign,
            } => commands::update::run(&tracker, id, status.as_deref(), assignee, unassign),
        },

        Commands::Comment { id, text } => commands::comment::run(&tracker, id, &text),

        Commands::Activity { project, limit } => {
            commands::activity::run(&tracker, project, limit)
        }

        Commands::Stats { project } => commands::stats::run(&tracker, project),

        Commands::Export { format, output } => match format {
            ExportFormat::Json => commands::export::run_json(&tracker, output.as_deref()),
            ExportFormat::Markdown => commands::export::run_markdown(&tracker, output.as_deref()),
        },

        Commands::Import { path } => commands::export::import(&tracker, &path),
    }
}
