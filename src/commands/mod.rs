//! CLI commands for hrm
//!
//! Non-interactive counterparts of the window's list, search and view
//! actions, plus first-time setup.

use anyhow::{Context, Result};
use std::path::Path;

use crate::app::format_detail;
use crate::config::{save_config, Config, HrmPaths};
use crate::db::Database;
use crate::models::{Note, Person, SortKey};

/// Output format for display commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `name - position - age` row per person
    Summary,
    /// Pretty-printed JSON
    Json,
}

/// Initialize hrm for first-time setup
pub fn init(paths: &HrmPaths, db_file: &Path) -> Result<()> {
    if paths.config.exists() && db_file.exists() {
        println!("hrm is already initialized at {}", paths.root.display());
        return Ok(());
    }

    println!("Initializing hrm at {}...", paths.root.display());

    paths.ensure_dirs()?;
    println!("  Created directory structure");

    if !paths.config.exists() {
        save_config(paths, &Config::default())?;
        println!("  Created config.toml");
    }

    let db = Database::open(db_file).context("Failed to create hrm database")?;
    let count = db.count_people()?;
    db.close()?;
    println!("  Database ready at {} ({} users)", db_file.display(), count);

    println!();
    println!("Next steps:");
    println!("  hrm                   Open the interactive window");
    println!("  hrm list --sort age   List users by age");

    Ok(())
}

/// List all people in the given order
pub fn list(db: &Database, sort: SortKey, format: OutputFormat) -> Result<()> {
    let people = db.list_people(sort)?;
    print!("{}", render_people(&people, format)?);
    Ok(())
}

/// List people whose name contains `query`
pub fn search(db: &Database, query: &str, format: OutputFormat) -> Result<()> {
    let people = db.search_people(query)?;
    if people.is_empty() && format == OutputFormat::Summary {
        println!("No users match '{}'", query);
        return Ok(());
    }
    print!("{}", render_people(&people, format)?);
    Ok(())
}

/// Show one person with their notes
pub fn show(db: &Database, id: i64, format: OutputFormat) -> Result<()> {
    let person = db
        .get_person(id)?
        .ok_or_else(|| anyhow::anyhow!("User not found: {}", id))?;
    let notes = db.list_notes(id)?;
    println!("{}", render_person(&person, &notes, format)?);
    Ok(())
}

/// Render a list of people, one line per person in summary mode
pub fn render_people(people: &[Person], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(people).context("Failed to serialize users")?;
            Ok(format!("{}\n", json))
        }
        OutputFormat::Summary => Ok(people
            .iter()
            .map(|p| format!("{:>4}  {}\n", p.id, p.list_row()))
            .collect()),
    }
}

/// Render one person and their notes
pub fn render_person(person: &Person, notes: &[Note], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "user": person,
                "notes": notes,
            });
            serde_json::to_string_pretty(&value).context("Failed to serialize user")
        }
        OutputFormat::Summary => Ok(format_detail(person, notes)),
    }
}
