//! Identity for work items
//!
//! Key Format: `{kind-prefix}-{7-char-hash}`
//! - Projects: `p-7f2b4c1`
//! - Activities: `a-9d3e5f2`
//! - Actions: `x-0c41a9e`
//!
//! Hash is derived from title + creation timestamp, ensuring uniqueness.
//! Same title at different times produces different IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid item ID: expected a 7-char hex hash, got '{0}'")]
    InvalidItemId(String),

    #[error("Invalid item key: expected '{{p|a|x}}-{{7-char-hash}}', got '{0}'")]
    InvalidItemKey(String),

    #[error("Unknown item kind: '{0}' (expected project, activity or action)")]
    UnknownKind(String),
}

/// Generates a 7-character hash from title and timestamp
fn generate_hash(title: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", title, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

fn is_valid_hash(s: &str) -> bool {
    s.len() == 7 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// The kind of a work item. Parents are always of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Project,
    Activity,
    Action,
}

impl ItemKind {
    /// All kinds, in display order
    pub const ALL: [ItemKind; 3] = [ItemKind::Project, ItemKind::Activity, ItemKind::Action];

    /// One-letter prefix used in item keys
    pub fn prefix(&self) -> char {
        match self {
            ItemKind::Project => 'p',
            ItemKind::Activity => 'a',
            ItemKind::Action => 'x',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Project => "project",
            ItemKind::Activity => "activity",
            ItemKind::Action => "action",
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.prefix() == c)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ItemKind {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "project" | "p" => Ok(ItemKind::Project),
            "activity" | "a" => Ok(ItemKind::Activity),
            "action" | "x" => Ok(ItemKind::Action),
            other => Err(IdError::UnknownKind(other.to_string())),
        }
    }
}

/// Item ID: the hash part of an item's identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId {
    hash: String,
}

impl ItemId {
    /// Creates a new item ID from title and timestamp
    pub fn new(title: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(title, timestamp),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !is_valid_hash(s) {
            return Err(IdError::InvalidItemId(s.to_string()));
        }
        Ok(Self {
            hash: s.to_ascii_lowercase(),
        })
    }
}

impl TryFrom<String> for ItemId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.hash
    }
}

/// Full identity of a work item: `(kind, id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: ItemId,
}

impl ItemKey {
    pub fn new(kind: ItemKind, id: ItemId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.id)
    }
}

impl FromStr for ItemKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(ItemKind::from_prefix)
            .ok_or_else(|| IdError::InvalidItemKey(s.to_string()))?;

        let hash = chars
            .as_str()
            .strip_prefix('-')
            .ok_or_else(|| IdError::InvalidItemKey(s.to_string()))?;

        let id = hash
            .parse()
            .map_err(|_| IdError::InvalidItemKey(s.to_string()))?;

        Ok(Self { kind, id })
    }
}
