//! hrm - personnel records manager
//!
//! Opens the interactive window by default; subcommands cover setup and
//! scripting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hrm::app::App;
use hrm::commands::{self, OutputFormat};
use hrm::config::{load_config, resolve_db_path, Config, HrmPaths};
use hrm::db::Database;
use hrm::logging;
use hrm::models::SortKey;
use hrm::tui::Shell;

#[derive(Parser)]
#[command(name = "hrm")]
#[command(author, version, about = "Personnel records manager with notes and a terminal UI")]
struct Cli {
    /// Database file (overrides config.toml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize hrm (first-time setup)
    Init,

    /// Open the interactive window (default)
    Tui,

    /// List all users
    List {
        /// Sort order: name, age, or position
        #[arg(short, long, default_value = "name")]
        sort: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search users by name
    Search {
        /// Substring to look for in names
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user and their notes
    Show {
        /// User ID
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Summary
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ~/.hrm is optional when --db names the database directly
    let paths = HrmPaths::new().ok();
    let config = match &paths {
        Some(paths) => load_config(paths)?,
        None => Config::default(),
    };
    if let Some(paths) = &paths {
        if let Err(e) = logging::init_logging(&config.log_level, &paths.logs) {
            eprintln!("warning: logging disabled: {}", e);
        }
    }
    let db_file = resolve_db_path(cli.db, paths.as_ref(), &config)?;

    match cli.command {
        Some(Commands::Init) => {
            let paths = paths.context("Could not determine home directory for ~/.hrm")?;
            commands::init(&paths, &db_file)?;
        }
        None | Some(Commands::Tui) => {
            let db = Database::open(&db_file)
                .with_context(|| format!("Failed to open database {}", db_file.display()))?;
            let mut shell = Shell::new(App::new(db).with_font(config.font))?;
            let result = shell.run();
            shell.into_app().into_database().close()?;
            result?;
        }
        Some(Commands::List { sort, json }) => {
            let sort = sort.parse::<SortKey>().map_err(|e| anyhow::anyhow!(e))?;
            let db = Database::open(&db_file)?;
            commands::list(&db, sort, format(json))?;
            db.close()?;
        }
        Some(Commands::Search { query, json }) => {
            let db = Database::open(&db_file)?;
            commands::search(&db, &query, format(json))?;
            db.close()?;
        }
        Some(Commands::Show { id, json }) => {
            let db = Database::open(&db_file)?;
            commands::show(&db, id, format(json))?;
            db.close()?;
        }
    }

    Ok(())
}
