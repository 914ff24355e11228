//! # Storage Layer
//!
//! Persistence layer for flowboard with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Items | JSONL (one JSON per line) | `.flow/items.jsonl` |
//! | Config | TOML | `.flow/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`ItemStore`] uses file locking (`fs2`) for concurrent access
//! - Full rewrites are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .flow/
//! ├── items.jsonl           # All work items in JSONL format
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores temp files
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a flowboard project
//! - [`ItemStore`] - Read/write work items as JSONL; implements the board's persistence hooks
//! - [`Config`] - Project and global configuration

mod config;
mod jsonl;
mod project;

pub use config::{BoardConfig, Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, UserConfig};
pub use jsonl::ItemStore;
pub use project::{Project, ProjectError};
