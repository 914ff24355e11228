//! JSONL storage for work items
//!
//! Items are stored in `.flow/items.jsonl` with one JSON object per line.
//! When a key appears on several lines the last one wins, so updates can be
//! appended and folded away later by [`ItemStore::compact`].
//! Uses file locking for concurrent access safety.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{ApprovalDecision, BaseStatus, ItemKey, ItemKind, Note, OrderUpdate, WorkItem};
use crate::engine::Persistence;

/// Store for work items in JSONL format
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    /// Creates a new item store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".flow").join("items.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all items from the store
    pub fn read_all(&self) -> Result<HashMap<ItemKey, WorkItem>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open item store: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on item store")?;

        let reader = BufReader::new(&file);
        let mut items = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let item: WorkItem = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse item at line {}", line_num + 1))?;

            items.insert(item.key(), item);
        }

        Ok(items)
    }

    /// Reads all items of one kind, sorted by key
    pub fn read_kind(&self, kind: ItemKind) -> Result<Vec<WorkItem>> {
        let mut items: Vec<_> = self
            .read_all()?
            .into_values()
            .filter(|i| i.kind == kind)
            .collect();
        items.sort_by_key(|i| i.key());
        Ok(items)
    }

    /// Looks up a single item
    pub fn get(&self, key: &ItemKey) -> Result<Option<WorkItem>> {
        Ok(self.read_all()?.remove(key))
    }

    /// Writes all items to the store (full rewrite)
    pub fn write_all(&self, items: &HashMap<ItemKey, WorkItem>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on item store")?;

            let mut writer = BufWriter::new(&file);

            // Sorted by key for stable diffs
            let mut sorted: Vec<_> = items.values().collect();
            sorted.sort_by_key(|i| i.key());

            for item in sorted {
                let line = serde_json::to_string(item).context("Failed to serialize item")?;
                writeln!(writer, "{}", line).context("Failed to write item")?;
            }

            writer.flush().context("Failed to flush item store")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Appends a single item (used for creation without a full rewrite)
    pub fn append(&self, item: &WorkItem) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open item store: {}", self.path.display()))?;

        file.lock_exclusive()
            .context("Failed to acquire write lock on item store")?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(item).context("Failed to serialize item")?;
        writeln!(writer, "{}", line).context("Failed to write item")?;

        writer.flush().context("Failed to flush item store")?;

        Ok(())
    }

    /// Updates a single item (reads all, updates, writes all)
    pub fn update(&self, item: &WorkItem) -> Result<()> {
        let mut items = self.read_all()?;
        items.insert(item.key(), item.clone());
        self.write_all(&items)
    }

    /// Applies changed sort keys in one rewrite. Unknown keys are skipped.
    pub fn apply_orders(&self, batch: &[OrderUpdate]) -> Result<usize> {
        let mut items = self.read_all()?;
        let mut applied = 0;

        for update in batch {
            if let Some(item) = items.get_mut(&update.key()) {
                item.kanban_order = update.new_order;
                applied += 1;
            }
        }

        if applied > 0 {
            self.write_all(&items)?;
        }
        Ok(applied)
    }

    /// Compacts the store (removes superseded lines, rewrites clean)
    pub fn compact(&self) -> Result<usize> {
        let items = self.read_all()?;
        let count = items.len();
        self.write_all(&items)?;
        Ok(count)
    }
}

impl Persistence for ItemStore {
    fn request_status_change(&mut self, item: &WorkItem, _target: BaseStatus) -> Result<()> {
        self.update(item)
    }

    fn commit_order_batch(&mut self, batch: &[OrderUpdate]) -> Result<()> {
        self.apply_orders(batch).map(|_| ())
    }

    fn record_approval_decision(
        &mut self,
        item: &WorkItem,
        _decision: ApprovalDecision,
        _note: &Note,
    ) -> Result<()> {
        self.update(item)
    }

    fn fetch_item_index(&self, kind: ItemKind) -> Result<Vec<WorkItem>> {
        self.read_kind(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{request_transition, Status};
    use crate::engine::Board;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn make_item(kind: ItemKind, title: &str) -> WorkItem {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        WorkItem::new(kind, title, "sara", start, end)
    }

    #[test]
    fn read_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let items = store.read_all().unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn write_and_read_items() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let item1 = make_item(ItemKind::Project, "One");
        let item2 = make_item(ItemKind::Action, "Two");

        let mut items = HashMap::new();
        items.insert(item1.key(), item1.clone());
        items.insert(item2.key(), item2.clone());

        store.write_all(&items).unwrap();

        let loaded = store.read_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(&item1.key()), Some(&item1));
        assert_eq!(loaded.get(&item2.key()), Some(&item2));
    }

    #[test]
    fn read_kind_filters() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        store.append(&make_item(ItemKind::Project, "P")).unwrap();
        store.append(&make_item(ItemKind::Action, "X")).unwrap();
        store.append(&make_item(ItemKind::Action, "Y")).unwrap();

        assert_eq!(store.read_kind(ItemKind::Action).unwrap().len(), 2);
        assert_eq!(store.read_kind(ItemKind::Activity).unwrap().len(), 0);
    }

    #[test]
    fn last_line_wins() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let mut item = make_item(ItemKind::Project, "Evolving");
        store.append(&item).unwrap();
        request_transition(&mut item, BaseStatus::InProgress, Note::default()).unwrap();
        store.append(&item).unwrap();

        let loaded = store.get(&item.key()).unwrap().unwrap();
        assert_eq!(loaded.status(), Status::InProgress);
    }

    #[test]
    fn update_item() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let mut item = make_item(ItemKind::Project, "Update me");
        store.append(&item).unwrap();

        item.title = "Updated".to_string();
        store.update(&item).unwrap();

        let loaded = store.get(&item.key()).unwrap().unwrap();
        assert_eq!(loaded.title, "Updated");
    }

    #[test]
    fn apply_orders_skips_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let item = make_item(ItemKind::Project, "Card");
        let ghost = make_item(ItemKind::Project, "Ghost");
        store.append(&item).unwrap();

        let applied = store
            .apply_orders(&[
                OrderUpdate {
                    id: item.id.clone(),
                    kind: item.kind,
                    new_order: 40,
                },
                OrderUpdate {
                    id: ghost.id.clone(),
                    kind: ghost.kind,
                    new_order: 50,
                },
            ])
            .unwrap();

        assert_eq!(applied, 1);
        let loaded = store.get(&item.key()).unwrap().unwrap();
        assert_eq!(loaded.kanban_order(), 40);
        assert!(store.get(&ghost.key()).unwrap().is_none());
    }

    #[test]
    fn compact_removes_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let item = make_item(ItemKind::Project, "Dup");

        store.append(&item).unwrap();
        store.append(&item).unwrap();
        store.append(&item).unwrap();

        let count = store.compact().unwrap();
        assert_eq!(count, 1);

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("nested").join("dir").join("items.jsonl"));

        store.append(&make_item(ItemKind::Project, "Deep")).unwrap();

        assert!(store.path().exists());
    }

    #[test]
    fn atomic_write() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let item = make_item(ItemKind::Project, "Atomic");
        let mut items = HashMap::new();
        items.insert(item.key(), item);
        store.write_all(&items).unwrap();

        let temp_path = store.path().with_extension("jsonl.tmp");
        assert!(!temp_path.exists());
    }

    #[test]
    fn malformed_line_reports_position() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));
        fs::write(store.path(), "{\"id\": 42}\n").unwrap();

        let err = store.read_all().unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
    }

    #[test]
    fn board_changes_reach_the_file() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));
        let first = make_item(ItemKind::Project, "First");
        let second = make_item(ItemKind::Project, "Second");
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let mut board = Board::load(ItemKind::Project, store).unwrap();
        board
            .change_status(&first.key(), BaseStatus::InProgress, Note::default())
            .unwrap();

        let reread = ItemStore::new(dir.path().join("items.jsonl"));
        let loaded = reread.get(&first.key()).unwrap().unwrap();
        assert_eq!(loaded.status(), Status::InProgress);
        assert_eq!(loaded.history().len(), 1);
        assert!(reread.get(&second.key()).unwrap().is_some());
    }
}
