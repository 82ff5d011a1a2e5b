//! rewind - Reversible file operations with undo and redo.
//!
//! Usage:
//!   rewind session [--script FILE]        Run file operations with undo/redo
//!   rewind preview --template T FILES...  Preview a batch rename
//!   rewind trash-list                     List what is in the trash
//!   rewind config                         Show the effective configuration
//!   rewind --help                         Show help

mod session;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use serde::Serialize;

use rewind_core::UndoConfig;
use rewind_ops::{FileOperationsService, LocalFileOperations, UndoManager, wait};
use rewind_rename::{
    ConflictKind, MetadataTable, RenameMode, SelectedFile, SortMode, find_conflicts, new_names, parse_template,
    sort_selection,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "rewind",
    version,
    about = "Reversible file operations with undo and redo",
    long_about = "rewind performs file operations and remembers how to take them back.\n\n\
                  Start a session with `rewind session`, type operations such as \
                  `move a.txt b/` and step through them with `undo` and `redo`."
)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run file operations interactively or from a script
    Session {
        /// Read commands from this file instead of standard input
        #[arg(short, long)]
        script: Option<PathBuf>,
    },

    /// Preview the names a batch rename would produce
    Preview(PreviewArgs),

    /// List items in the trash
    TrashList {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct PreviewArgs {
    /// Name template, e.g. "Photo [1, 2, 3]"
    #[arg(short, long, conflicts_with_all = ["find", "replace"])]
    template: Option<String>,

    /// Text to find in each name
    #[arg(long, requires = "replace")]
    find: Option<String>,

    /// Replacement for the found text
    #[arg(long, requires = "find")]
    replace: Option<String>,

    /// Order of the files before numbering
    #[arg(short, long, default_value = "original-ascending")]
    sort: SortMode,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Files to rename
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log_level);

    match cli.command {
        Command::Session { script } => {
            let service = Arc::new(LocalFileOperations::from_config(&config));
            let manager = UndoManager::new(service.clone(), &config);
            let mut session = session::Session::new(service, manager, config.use_trash);

            match script {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read script {}", path.display()))?;
                    session.run_script(&text).await?;
                }
                None => session.run_interactive().await?,
            }
        }
        Command::Preview(args) => run_preview(args)?,
        Command::TrashList { format } => run_trash_list(format).await?,
        Command::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Load the config from `--config`, or the user config file when present.
fn load_config(path: Option<&Path>) -> Result<UndoConfig> {
    let config = match path {
        Some(path) => UndoConfig::load(path)?,
        None => match dirs::config_dir() {
            Some(dir) => UndoConfig::load_or_default(&dir.join("rewind").join("config.toml"))?,
            None => UndoConfig::default(),
        },
    };
    Ok(config)
}

/// Initialize the logging system.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(filter)
        .init();
}

#[derive(Serialize)]
struct PreviewRow {
    path: PathBuf,
    new_name: String,
    conflict: Option<&'static str>,
}

/// Print the new name of every file, flagging conflicts.
fn run_preview(args: PreviewArgs) -> Result<()> {
    let mode = match (args.template, args.find, args.replace) {
        (Some(template), _, _) => RenameMode::Format(parse_template(&template)),
        (None, Some(find), Some(replacement)) => RenameMode::Replace { find, replacement },
        _ => bail!("Either --template or --find with --replace is required"),
    };

    let mut selection: Vec<SelectedFile> = args.files.into_iter().map(SelectedFile::from_disk).collect();
    sort_selection(&mut selection, args.sort, &HashMap::new());

    let paths: Vec<PathBuf> = selection.iter().map(|f| f.path.clone()).collect();
    let names: Vec<String> = selection.iter().map(SelectedFile::name).collect();
    let metadata = MetadataTable::for_names(names.iter().cloned());
    let renamed = new_names(&mode, &names, &metadata);

    let conflicts = find_conflicts(&paths, &renamed, |dir, name| dir.join(name).symlink_metadata().is_ok());
    let rows: Vec<PreviewRow> = paths
        .into_iter()
        .zip(renamed)
        .enumerate()
        .map(|(index, (path, new_name))| PreviewRow {
            conflict: conflicts.iter().find(|c| c.index == index).map(|c| match c.kind {
                ConflictKind::Duplicate => "duplicate",
                ConflictKind::Existing => "exists",
            }),
            path,
            new_name,
        })
        .collect();

    match args.format {
        OutputFormat::Text => {
            for row in &rows {
                let marker = row.conflict.map(|c| format!("  ({})", c)).unwrap_or_default();
                println!("{} -> {}{}", row.path.display(), row.new_name, marker);
            }
            if !conflicts.is_empty() {
                eprintln!("{} conflict(s); the rename would be refused", conflicts.len());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }

    Ok(())
}

/// List the trash through the local service.
async fn run_trash_list(format: OutputFormat) -> Result<()> {
    let service = LocalFileOperations::new();
    let mut entries = wait(service.enumerate_trash(), &CancellationToken::new())
        .await
        .context("Failed to read the trash")?;
    entries.sort_by_key(|e| e.deleted_at);

    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("Trash is empty.");
            }
            for entry in &entries {
                println!("{:>12}  {}", entry.deleted_at, entry.original_path.display());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }

    Ok(())
}
