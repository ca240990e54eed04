//! `SqliteTable`: `EntityTable` backed by `rusqlite`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use easyconfig_core::{
    ConfigEntry, ConfigError, ConfigValue, EntityTable, EntryFlag, Pending, Result, UnitOfWork,
};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

/// Tables created on open.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS config_entries (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) > 0),
    value TEXT NOT NULL,
    value_type TEXT,
    is_global INTEGER NOT NULL DEFAULT 0,
    locked INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_config_entries_global ON config_entries (is_global);
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
";

const SELECT_COLUMNS: &str = "SELECT id, value, value_type, is_global, locked FROM config_entries";

const UPSERT_SQL: &str = "INSERT INTO config_entries (id, value, value_type, is_global, locked)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(id) DO UPDATE SET
         value = excluded.value,
         value_type = excluded.value_type,
         is_global = excluded.is_global,
         locked = excluded.locked";

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
#[must_use]
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn backend(err: rusqlite::Error) -> ConfigError {
    ConfigError::backend(err)
}

/// Raw column values of one row.
type RawRow = (String, String, Option<String>, bool, bool);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode<E: ConfigEntry>((id, value, value_type, is_global, locked): RawRow) -> Result<E> {
    let value: ConfigValue = serde_json::from_str(&value)?;
    let mut entry = E::new(id);
    entry.set_value(value);
    entry.set_value_type(value_type);
    entry.set_global(is_global);
    entry.set_locked(locked);
    Ok(entry)
}

struct SqliteState<E> {
    conn: Connection,
    pending: UnitOfWork<E>,
}

/// Configuration table in a `SQLite` database.
///
/// The database records the entry kind it was created for; opening it for a
/// different kind keeps the recorded name, so binding a store fails with
/// `UnrecognizedSchemaKind`.
pub struct SqliteTable<E> {
    state: Mutex<SqliteState<E>>,
    schema: String,
}

impl<E: ConfigEntry> SqliteTable<E> {
    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(backend)?;
        debug!(path = %path.display(), "opened sqlite table");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory().map_err(backend)?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5)).map_err(backend)?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(backend)?;
        conn.pragma_update(None, "case_sensitive_like", true)
            .map_err(backend)?;
        conn.execute_batch(SCHEMA_SQL).map_err(backend)?;

        conn.execute(
            "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema', ?1)",
            params![E::SCHEMA],
        )
        .map_err(backend)?;
        let schema: String = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'schema'",
                [],
                |row| row.get(0),
            )
            .map_err(backend)?;
        debug!(journal_mode = %mode, schema = %schema, "sqlite schema ready");

        Ok(Self {
            state: Mutex::new(SqliteState {
                conn,
                pending: UnitOfWork::new(),
            }),
            schema,
        })
    }

    /// Every committed entry in id order.
    ///
    /// # Errors
    ///
    /// Returns `Backend` on query failure or `Json` on a corrupt value.
    pub fn all(&self) -> Result<Vec<E>> {
        self.query(&format!("{SELECT_COLUMNS} ORDER BY id"), &[])
    }

    /// Number of committed entries.
    ///
    /// # Errors
    ///
    /// Returns `Backend` on query failure.
    pub fn count(&self) -> Result<usize> {
        let state = self.lock()?;
        let count: i64 = state
            .conn
            .query_row("SELECT COUNT(*) FROM config_entries", [], |row| row.get(0))
            .map_err(backend)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteState<E>>> {
        self.state
            .lock()
            .map_err(|_| ConfigError::poisoned("sqlite table"))
    }

    fn query(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<E>> {
        let raw: Vec<RawRow> = {
            let state = self.lock()?;
            let mut stmt = state.conn.prepare_cached(sql).map_err(backend)?;
            let rows = stmt.query_map(args, read_raw).map_err(backend)?;
            rows.collect::<rusqlite::Result<_>>().map_err(backend)?
        };
        raw.into_iter().map(decode).collect()
    }
}

impl<E: ConfigEntry> EntityTable<E> for SqliteTable<E> {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn find_by_id(&self, id: &str) -> Result<Option<E>> {
        let raw = {
            let state = self.lock()?;
            if let Some(staged) = state.pending.lookup(id) {
                return Ok(staged.cloned());
            }
            select_by_id(&state.conn, id)?
        };
        raw.map(decode).transpose()
    }

    fn find_committed(&self, id: &str) -> Result<Option<E>> {
        let raw = select_by_id(&self.lock()?.conn, id)?;
        raw.map(decode).transpose()
    }

    fn find_by_prefix(&self, prefix: &str) -> Result<Vec<E>> {
        let pattern = format!("{}%", escape_like(prefix));
        self.query(
            &format!("{SELECT_COLUMNS} WHERE id LIKE ?1 ESCAPE '\\' ORDER BY id"),
            &[&pattern],
        )
    }

    fn find_by_prefix_and_flag(
        &self,
        prefix: &str,
        flag: EntryFlag,
        value: bool,
    ) -> Result<Vec<E>> {
        let pattern = format!("{}%", escape_like(prefix));
        // Column names come from a closed enum, never from input.
        let sql = format!(
            "{SELECT_COLUMNS} WHERE id LIKE ?1 ESCAPE '\\' AND {} = ?2 ORDER BY id",
            flag.as_str()
        );
        self.query(&sql, &[&pattern, &value])
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
        if self.lock()?.pending.remove(id) {
            debug!(id, "unstaged");
        }
        Ok(())
    }

    fn commit(&self, scope: Option<&str>) -> Result<()> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let changes = state.pending.take(scope);
        if changes.is_empty() {
            return Ok(());
        }

        match apply(&mut state.conn, &changes) {
            Ok(()) => {
                debug!(applied = changes.len(), scope, "sqlite commit");
                Ok(())
            }
            Err(err) => {
                state.pending.restore(changes);
                Err(err)
            }
        }
    }

    fn discard(&self) -> Result<()> {
        self.lock()?.pending.clear();
        Ok(())
    }
}

fn select_by_id(conn: &Connection, id: &str) -> Result<Option<RawRow>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id],
        read_raw,
    )
    .optional()
    .map_err(backend)
}

/// Apply changes in one transaction; nothing is written on error.
fn apply<E: ConfigEntry>(conn: &mut Connection, changes: &[Pending<E>]) -> Result<()> {
    let tx = conn.transaction().map_err(backend)?;
    {
        let mut upsert = tx.prepare_cached(UPSERT_SQL).map_err(backend)?;
        let mut delete = tx
            .prepare_cached("DELETE FROM config_entries WHERE id = ?1")
            .map_err(backend)?;

        for change in changes {
            match change {
                Pending::Upsert(entry) => {
                    let value = serde_json::to_string(entry.value())?;
                    upsert
                        .execute(params![
                            entry.id(),
                            value,
                            entry.value_type(),
                            entry.is_global(),
                            entry.is_locked(),
                        ])
                        .map_err(backend)?;
                }
                Pending::Delete(id) => {
                    delete.execute(params![id]).map_err(backend)?;
                }
            }
        }
    }
    tx.commit().map_err(backend)
}
