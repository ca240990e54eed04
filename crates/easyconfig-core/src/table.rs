//! Storage collaborator interface and the in-memory table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::jsonl;
use crate::model::{ConfigEntry, EntryFlag};

/// Ordered key-value table keyed by the full dotted id.
///
/// Writes are staged and become durable and visible to prefix queries only
/// after `commit`. One commit applies all of its changes atomically.
pub trait EntityTable<E: ConfigEntry>: Send + Sync {
    /// Name of the entry kind this table stores.
    fn schema(&self) -> &str;

    /// Exact id lookup. Sees staged, uncommitted entries.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn find_by_id(&self, id: &str) -> Result<Option<E>>;

    /// Exact id lookup over committed rows only, like the prefix queries.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn find_committed(&self, id: &str) -> Result<Option<E>>;

    /// Committed entries whose id starts with `prefix` (`LIKE "prefix%"`).
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn find_by_prefix(&self, prefix: &str) -> Result<Vec<E>>;

    /// `find_by_prefix` restricted to entries where `flag == value`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn find_by_prefix_and_flag(&self, prefix: &str, flag: EntryFlag, value: bool)
    -> Result<Vec<E>>;

    /// Stage an insert-or-update.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn stage(&self, entry: E) -> Result<()>;

    /// Stage a delete.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn stage_delete(&self, entry: &E) -> Result<()>;

    /// The change currently staged for `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn staged(&self, id: &str) -> Result<Option<Pending<E>>>;

    /// Drop the change staged for `id`, leaving other staged changes alone.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn unstage(&self, id: &str) -> Result<()>;

    /// Apply staged changes. With a scope, only changes to that id are
    /// applied and the rest stay staged.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged; nothing is applied on error.
    fn commit(&self, scope: Option<&str>) -> Result<()>;

    /// Drop every staged change.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    fn discard(&self) -> Result<()>;
}

/// A staged change.
#[derive(Debug, Clone)]
pub enum Pending<E> {
    Upsert(E),
    Delete(String),
}

impl<E: ConfigEntry> Pending<E> {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Upsert(entry) => entry.id(),
            Self::Delete(id) => id,
        }
    }
}

/// Staging area shared by table implementations.
///
/// Keeps only the latest change per id, in first-staged order.
#[derive(Debug)]
pub struct UnitOfWork<E> {
    changes: Vec<Pending<E>>,
}

impl<E: ConfigEntry> UnitOfWork<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    pub fn push(&mut self, change: Pending<E>) {
        if let Some(slot) = self.changes.iter_mut().find(|c| c.id() == change.id()) {
            *slot = change;
        } else {
            self.changes.push(change);
        }
    }

    /// Staged state of `id`: `Some(Some(_))` for an upsert, `Some(None)` for
    /// a delete, `None` if nothing is staged.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Option<&E>> {
        self.changes
            .iter()
            .find(|c| c.id() == id)
            .map(|c| match c {
                Pending::Upsert(entry) => Some(entry),
                Pending::Delete(_) => None,
            })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Pending<E>> {
        self.changes.iter().find(|c| c.id() == id)
    }

    /// Drop the change staged for `id`; returns whether there was one.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.changes.len();
        self.changes.retain(|c| c.id() != id);
        self.changes.len() != before
    }

    /// Remove and return the changes covered by `scope`.
    pub fn take(&mut self, scope: Option<&str>) -> Vec<Pending<E>> {
        match scope {
            None => std::mem::take(&mut self.changes),
            Some(id) => {
                let (taken, kept) = std::mem::take(&mut self.changes)
                    .into_iter()
                    .partition(|c| c.id() == id);
                self.changes = kept;
                taken
            }
        }
    }

    /// Put changes back after a failed apply, ahead of anything staged since.
    pub fn restore(&mut self, mut changes: Vec<Pending<E>>) {
        for change in std::mem::take(&mut self.changes) {
            if let Some(slot) = changes.iter_mut().find(|c| c.id() == change.id()) {
                *slot = change;
            } else {
                changes.push(change);
            }
        }
        self.changes = changes;
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<E: ConfigEntry> Default for UnitOfWork<E> {
    fn default() -> Self {
        Self::new()
    }
}

struct TableState<E> {
    rows: BTreeMap<String, E>,
    pending: UnitOfWork<E>,
}

/// In-memory table, optionally persisted to a JSONL file on every commit.
pub struct InMemoryTable<E> {
    schema: String,
    state: Mutex<TableState<E>>,
    jsonl_path: Option<PathBuf>,
    commits: AtomicU64,
}

impl<E: ConfigEntry> InMemoryTable<E> {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create an empty table declaring `E::SCHEMA`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_schema(E::SCHEMA)
    }

    /// Create an empty table declaring an explicit schema name.
    #[must_use]
    pub fn with_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            state: Mutex::new(TableState {
                rows: BTreeMap::new(),
                pending: UnitOfWork::new(),
            }),
            jsonl_path: None,
            commits: AtomicU64::new(0),
        }
    }

    /// Seed committed rows directly, bypassing staging.
    #[must_use]
    pub fn with_rows(self, rows: impl IntoIterator<Item = E>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            for row in rows {
                state.rows.insert(row.id().to_string(), row);
            }
        }
        self
    }

    /// Number of commits applied so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Number of staged, uncommitted changes.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the table lock is poisoned.
    pub fn pending_len(&self) -> Result<usize> {
        Ok(self.lock()?.pending.len())
    }

    /// Committed row count.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the table lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.rows.len())
    }

    /// # Errors
    ///
    /// Returns `Storage` if the table lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of all committed rows in id order.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the table lock is poisoned.
    pub fn rows(&self) -> Result<Vec<E>> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TableState<E>>> {
        self.state
            .lock()
            .map_err(|_| ConfigError::poisoned("table"))
    }

    fn scan(&self, prefix: &str, filter: impl Fn(&E) -> bool) -> Result<Vec<E>> {
        let state = self.lock()?;
        Ok(state
            .rows
            .range(prefix.to_string()..)
            .take_while(|(id, _)| id.starts_with(prefix))
            .map(|(_, entry)| entry)
            .filter(|entry| filter(entry))
            .cloned()
            .collect())
    }
}

impl<E: ConfigEntry + serde::Serialize + serde::de::DeserializeOwned> InMemoryTable<E> {
    /// Open a JSONL-backed table. A missing file starts empty and is created
    /// on the first commit.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or `JsonlParse` on a bad line.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rows = if path.exists() {
            jsonl::load::<E>(path)?
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), rows = rows.len(), "opened jsonl table");

        let mut table = Self::new().with_rows(rows);
        table.jsonl_path = Some(path.to_path_buf());
        Ok(table)
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.jsonl_path.as_deref()
    }
}

impl<E: ConfigEntry> Default for InMemoryTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ConfigEntry + serde::Serialize> EntityTable<E> for InMemoryTable<E> {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn find_by_id(&self, id: &str) -> Result<Option<E>> {
        let state = self.lock()?;
        if let Some(staged) = state.pending.lookup(id) {
            return Ok(staged.cloned());
        }
        Ok(state.rows.get(id).cloned())
    }

    fn find_committed(&self, id: &str) -> Result<Option<E>> {
        Ok(self.lock()?.rows.get(id).cloned())
    }

    fn find_by_prefix(&self, prefix: &str) -> Result<Vec<E>> {
        self.scan(prefix, |_| true)
    }

    fn find_by_prefix_and_flag(
        &self,
        prefix: &str,
        flag: EntryFlag,
        value: bool,
    ) -> Result<Vec<E>> {
        self.scan(prefix, |entry| flag.get(entry) == value)
    }

    fn stage(&self, entry: E) -> Result<()> {
        self.lock()?.pending.push(Pending::Upsert(entry));
        Ok(())
    }

    fn stage_delete(&self, entry: &E) -> Result<()> {
        self.lock()?
            .pending
            .push(Pending::Delete(entry.id().to_string()));
        Ok(())
    }

    fn staged(&self, id: &str) -> Result<Option<Pending<E>>> {
        Ok(self.lock()?.pending.get(id).cloned())
    }

    fn unstage(&self, id: &str) -> Result<()> {
        self.lock()?.pending.remove(id);
        Ok(())
    }

    fn commit(&self, scope: Option<&str>) -> Result<()> {
        let mut state = self.lock()?;
        let changes = state.pending.take(scope);

        let mut next = state.rows.clone();
        for change in &changes {
            match change {
                Pending::Upsert(entry) => {
                    next.insert(entry.id().to_string(), entry.clone());
                }
                Pending::Delete(id) => {
                    next.remove(id);
                }
            }
        }

        if let Some(path) = &self.jsonl_path {
            if let Err(err) = jsonl::save(path, next.values()) {
                state.pending.restore(changes);
                return Err(err);
            }
        }

        state.rows = next;
        self.commits.fetch_add(1, Ordering::Relaxed);
        debug!(applied = changes.len(), scope, "committed");
        Ok(())
    }

    fn discard(&self) -> Result<()> {
        let mut state = self.lock()?;
        if !state.pending.is_empty() {
            debug!(dropped = state.pending.len(), "discarded staged changes");
        }
        state.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BaseConfig;
    use serde_json::json;

    fn entry(id: &str, value: serde_json::Value, global: bool) -> BaseConfig {
        let mut e = BaseConfig::new(id.to_string());
        e.set_value(value);
        e.set_global(global);
        e
    }

    #[test]
    fn test_staged_visible_to_exact_lookup_only() {
        let table: InMemoryTable<BaseConfig> = InMemoryTable::new();
        table.stage(entry("theme.color", json!("red"), false)).unwrap();

        assert!(table.find_by_id("theme.color").unwrap().is_some());
        assert!(table.find_by_prefix("theme.").unwrap().is_empty());

        table.commit(None).unwrap();
        assert_eq!(table.find_by_prefix("theme.").unwrap().len(), 1);
        assert_eq!(table.commit_count(), 1);
    }

    #[test]
    fn test_prefix_scan_is_bounded() {
        let table = InMemoryTable::new().with_rows([
            entry("theme.color", json!("red"), false),
            entry("theme.font", json!("sans"), true),
            entry("themes.other", json!(1), true),
            entry("bob.theme.color", json!("blue"), false),
        ]);

        let ids: Vec<String> = table
            .find_by_prefix("theme.")
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["theme.color", "theme.font"]);

        let globals = table
            .find_by_prefix_and_flag("theme.", EntryFlag::Global, true)
            .unwrap();
        assert_eq!(globals.len(), 1);
        assert_eq!(globals[0].id, "theme.font");
    }

    #[test]
    fn test_scoped_commit_leaves_other_changes_staged() {
        let table: InMemoryTable<BaseConfig> = InMemoryTable::new();
        table.stage(entry("a.x", json!(1), false)).unwrap();
        table.stage(entry("a.y", json!(2), false)).unwrap();

        table.commit(Some("a.x")).unwrap();
        assert_eq!(table.len().unwrap(), 1);
        assert_eq!(table.pending_len().unwrap(), 1);

        table.commit(None).unwrap();
        assert_eq!(table.len().unwrap(), 2);
        assert_eq!(table.pending_len().unwrap(), 0);
    }

    #[test]
    fn test_staged_delete_hides_row() {
        let table = InMemoryTable::new().with_rows([entry("a.x", json!(1), false)]);
        let row = table.find_by_id("a.x").unwrap().unwrap();
        table.stage_delete(&row).unwrap();
        assert!(table.find_by_id("a.x").unwrap().is_none());

        table.discard().unwrap();
        assert!(table.find_by_id("a.x").unwrap().is_some());

        table.stage_delete(&row).unwrap();
        table.commit(None).unwrap();
        assert!(table.is_empty().unwrap());
    }

    #[test]
    fn test_unit_of_work_keeps_latest_change() {
        let mut uow: UnitOfWork<BaseConfig> = UnitOfWork::new();
        uow.push(Pending::Upsert(entry("a.x", json!(1), false)));
        uow.push(Pending::Upsert(entry("a.y", json!(2), false)));
        uow.push(Pending::Upsert(entry("a.x", json!(3), false)));
        assert_eq!(uow.len(), 2);
        assert_eq!(uow.lookup("a.x").unwrap().unwrap().value, json!(3));

        uow.push(Pending::Delete("a.x".to_string()));
        assert_eq!(uow.lookup("a.x"), Some(None));

        let taken = uow.take(Some("a.y"));
        assert_eq!(taken.len(), 1);
        uow.restore(taken);
        assert_eq!(uow.len(), 2);
    }

    #[test]
    fn test_unstage_single_id() {
        let table: InMemoryTable<BaseConfig> =
            InMemoryTable::new().with_rows([entry("a.x", json!(1), false)]);
        table.stage(entry("a.x", json!(2), false)).unwrap();
        table.stage(entry("a.y", json!(3), false)).unwrap();

        assert_eq!(table.find_by_id("a.x").unwrap().unwrap().value, json!(2));
        assert_eq!(table.find_committed("a.x").unwrap().unwrap().value, json!(1));
        assert!(table.find_committed("a.y").unwrap().is_none());
        assert!(matches!(table.staged("a.y").unwrap(), Some(Pending::Upsert(_))));

        table.unstage("a.x").unwrap();
        assert!(table.staged("a.x").unwrap().is_none());
        assert_eq!(table.find_by_id("a.x").unwrap().unwrap().value, json!(1));
        assert_eq!(table.pending_len().unwrap(), 1);
    }

    #[test]
    fn test_jsonl_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.jsonl");

        let table: InMemoryTable<BaseConfig> = InMemoryTable::open(&path).unwrap();
        table.stage(entry("app.name", json!("demo"), true)).unwrap();
        table.commit(None).unwrap();
        assert!(path.exists());

        let reopened: InMemoryTable<BaseConfig> = InMemoryTable::open(&path).unwrap();
        let row = reopened.find_by_id("app.name").unwrap().unwrap();
        assert_eq!(row.value, json!("demo"));
        assert!(row.is_global);
    }

    #[test]
    fn test_failed_persist_keeps_changes_staged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("config.jsonl");

        let table: InMemoryTable<BaseConfig> = InMemoryTable::open(&path).unwrap();
        table.stage(entry("app.name", json!("demo"), false)).unwrap();
        assert!(table.commit(None).is_err());

        assert!(table.is_empty().unwrap());
        assert_eq!(table.pending_len().unwrap(), 1);
        assert_eq!(table.commit_count(), 0);
    }
}
