//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::board::{self, BoardCommands};
use super::item::{self, ItemCommands};
use super::output::{Output, OutputFormat};
use super::{query, tui};
use crate::domain::{ItemKey, ItemKind};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "flow")]
#[command(author, version, about = "Kanban boards with approval workflows for projects, activities and actions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new board project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage work items
    #[command(subcommand)]
    Item(ItemCommands),

    /// Kanban board
    #[command(subcommand)]
    Board(BoardCommands),

    /// Show the hierarchy an item belongs to
    Tree {
        /// Item key
        key: ItemKey,
    },

    /// Items under parents you are responsible for
    Delegated {
        /// User (defaults to the configured user)
        #[arg(long)]
        user: Option<String>,
    },

    /// Completed items, most recently completed first
    Completed {
        /// Only this kind
        #[arg(long, short)]
        kind: Option<ItemKind>,
    },

    /// Approval requests waiting on you
    Inbox {
        /// Approver (defaults to the configured user)
        #[arg(long)]
        user: Option<String>,
    },

    /// Fold superseded lines out of the item store
    Compact,

    /// Interactive kanban board
    Tui {
        /// Item kind (defaults to the configured kind)
        #[arg(long, short)]
        kind: Option<ItemKind>,
    },
}

/// Installs the stderr logger. `FLOW_LOG` overrides the level.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("FLOW_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "flowboard=debug"
        } else {
            "flowboard=warn"
        })
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn resolve_format(flag: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = flag {
        return format;
    }
    match Config::load_global() {
        Ok(global) => global.default_format.into(),
        Err(err) => {
            debug!(error = %err, "global config ignored");
            OutputFormat::default()
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = Output::new(resolve_format(cli.format));

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            debug!(dir = %project.flow_dir().display(), "created board directory");
            output.success(&format!(
                "Initialized board project at {}",
                project.root().display()
            ));
        }

        Commands::Item(cmd) => item::run(cmd, &output)?,
        Commands::Board(cmd) => board::run(cmd, &output)?,

        Commands::Tree { key } => query::tree(&output, &key)?,
        Commands::Delegated { user } => query::delegated(&output, user)?,
        Commands::Completed { kind } => query::completed(&output, kind)?,
        Commands::Inbox { user } => query::inbox(&output, user)?,

        Commands::Compact => {
            let store = Project::open_current()?.item_store();
            let count = store.compact()?;
            debug!(path = %store.path().display(), items = count, "item store compacted");
            output.success(&format!("Compacted item store ({} items)", count));
        }

        Commands::Tui { kind } => tui::run(kind)?,
    }

    Ok(())
}
