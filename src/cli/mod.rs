//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Item | Work item lifecycle | `item add`, `item move`, `item approve` |
//! | Board | Kanban ordering | `board show`, `board reorder`, `board drop` |
//! | Query | Read-only views | `tree`, `delegated`, `completed`, `inbox` |
//! | TUI | Interactive board | `tui` |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed in the global `config.toml`.
//!
//! ## Logging
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr, or set `FLOW_LOG`
//! to any `tracing` filter:
//! ```bash
//! FLOW_LOG=flowboard=trace flow board drop p-1a2b3c4 completed
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod board;
mod item;
mod output;
mod query;
mod tui;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
