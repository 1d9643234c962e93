use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use foldertree::config::HierarchyConfig;
use foldertree::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "foldertree")]
#[command(about = "Manage a folder hierarchy stored in SQLite", long_about = None)]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, default_value = "./data/folders.db")]
    db: PathBuf,

    /// TOML file with hierarchy settings (delete_policy, busy_timeout_ms)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and its tables
    Init,

    /// Create a folder
    Create {
        name: String,

        /// Parent folder id; omit to create a root
        #[arg(long)]
        parent: Option<i64>,
    },

    /// Move a folder and its subtree under a new parent
    Move {
        id: i64,

        /// New parent folder id; omit to make the folder a root
        #[arg(long)]
        parent: Option<i64>,
    },

    /// Delete a folder
    Delete { id: i64 },

    /// Rename a folder
    Rename { id: i64, name: String },

    /// List the direct children of a folder
    Children { id: i64 },

    /// List the folders sharing a parent with a folder
    Siblings { id: i64 },

    /// List the ancestors of a folder, root first
    Ancestors { id: i64 },

    /// List every folder below a folder
    Descendants { id: i64 },

    /// Dump the closure table
    Paths,

    /// Recompute the closure table from parent pointers
    Rebuild,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HierarchyConfig> {
    match path {
        Some(path) => Ok(HierarchyConfig::load(path)?),
        None => Ok(HierarchyConfig::default()),
    }
}

fn prepare_database(db: &Path, init: bool) -> anyhow::Result<()> {
    if !init {
        if !db.exists() {
            bail!(
                "Database not found at {}. Run 'foldertree init' first.",
                db.display()
            );
        }
        return Ok(());
    }

    if let Some(parent) = db.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("foldertree=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    prepare_database(&cli.db, matches!(cli.command, Commands::Init))?;
    let store = SqliteStore::with_config(&cli.db, config)?;

    match cli.command {
        Commands::Init => {
            store.initialize()?;
            info!("Initialized folder database at {}", cli.db.display());
            print_json(&json!({ "database": cli.db.display().to_string() }))?;
        }
        Commands::Create { name, parent } => print_json(&store.create_folder(&name, parent)?)?,
        Commands::Move { id, parent } => print_json(&store.move_folder(id, parent)?)?,
        Commands::Delete { id } => {
            let deleted = store.delete_folder(id)?;
            print_json(&json!({ "id": id, "deleted": deleted }))?;
        }
        Commands::Rename { id, name } => print_json(&store.rename_folder(id, &name)?)?,
        Commands::Children { id } => print_json(&store.children(id)?)?,
        Commands::Siblings { id } => print_json(&store.siblings(id)?)?,
        Commands::Ancestors { id } => print_json(&store.ancestors(id)?)?,
        Commands::Descendants { id } => print_json(&store.descendants(id)?)?,
        Commands::Paths => print_json(&store.list_paths()?)?,
        Commands::Rebuild => {
            let paths = store.rebuild_paths()?;
            print_json(&json!({ "paths": paths }))?;
        }
    }

    store.close()?;
    Ok(())
}
