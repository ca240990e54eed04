//! Configuration store over an `EntityTable`.
//!
//! Resolves user/group/global lookups through a region cache, applies the
//! lock/force rule on writes and batches writes into single commits.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::{CachePort, CacheRegion, RegionCache};
use crate::error::{ConfigError, Result};
use crate::key::KeyPath;
use crate::model::{ConfigEntry, ConfigValue, EntryFlag, SaveOutcome};
use crate::table::{EntityTable, Pending};

/// Write options for `ConfigStore::save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Type tag stored with the value. `None` clears any previous tag.
    pub value_type: Option<String>,
    pub locked: bool,
    /// Overwrite even if the existing entry is locked.
    pub force: bool,
    /// Commit immediately. Disable to batch several saves into one commit.
    pub flush: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            value_type: None,
            locked: false,
            force: false,
            flush: true,
        }
    }
}

impl SaveOptions {
    #[must_use]
    pub fn typed(value_type: impl Into<String>) -> Self {
        Self {
            value_type: Some(value_type.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    #[must_use]
    pub const fn force(mut self) -> Self {
        self.force = true;
        self
    }

    #[must_use]
    pub const fn deferred(mut self) -> Self {
        self.flush = false;
        self
    }
}

/// Hierarchical configuration store.
///
/// Entries live in `table` under full dotted ids (`group.key`,
/// `username.group.key`). Query results are cached in `cache`; every commit
/// issued through the store invalidates both cache regions, so a caller never
/// reads a stale result set after writing through the same store.
pub struct ConfigStore<E, T, C = RegionCache<E>> {
    table: T,
    cache: C,
    _entry: PhantomData<fn() -> E>,
}

impl<E, T, C> ConfigStore<E, T, C>
where
    E: ConfigEntry,
    T: EntityTable<E>,
    C: CachePort<E>,
{
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Bind a store to `table`.
    ///
    /// # Errors
    ///
    /// Returns `UnrecognizedSchemaKind` if the table stores a different entry
    /// kind than `E`.
    pub fn new(table: T, cache: C) -> Result<Self> {
        let found = table.schema();
        if found != E::SCHEMA {
            return Err(ConfigError::UnrecognizedSchemaKind {
                expected: E::SCHEMA.to_string(),
                found: found.to_string(),
            });
        }
        debug!(schema = E::SCHEMA, "config store bound");
        Ok(Self {
            table,
            cache,
            _entry: PhantomData,
        })
    }

    pub const fn table(&self) -> &T {
        &self.table
    }

    pub const fn cache(&self) -> &C {
        &self.cache
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Entries under `{username}.{group}.` plus global entries under
    /// `{group}.`.
    ///
    /// User-scoped rows come first; a row present in both sets appears once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for a malformed username or group, or the table's
    /// error unchanged.
    pub fn get_by_username_and_group(&self, username: &str, group: &str) -> Result<Vec<E>> {
        let user_group = KeyPath::user_scoped(username, group)?;
        let group = KeyPath::parse(group)?;
        // Length-prefixed so ("a.b", "c") and ("a", "b.c") never share a slot.
        let cache_key = format!(
            "user-group:{}:{}:{}",
            username.len(),
            username,
            group.as_str()
        );

        self.cache
            .get_or_compute(CacheRegion::ConfigGroup, &cache_key, &mut || {
                let mut rows = self.table.find_by_prefix(&user_group.group_prefix())?;
                let globals = self.table.find_by_prefix_and_flag(
                    &group.group_prefix(),
                    EntryFlag::Global,
                    true,
                )?;
                for global in globals {
                    if !rows.iter().any(|row| row.id() == global.id()) {
                        rows.push(global);
                    }
                }
                debug!(username, group = %group, rows = rows.len(), "loaded user group");
                Ok(rows)
            })
    }

    /// Entries with id `{username}.{key}` or exactly `key`, user-scoped first.
    ///
    /// Reads committed rows only, like the group queries, so nothing staged
    /// ever reaches the cache.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for a malformed username or key, or the table's
    /// error unchanged.
    pub fn get_by_username_and_key(&self, username: &str, key: &str) -> Result<Vec<E>> {
        let user_key = KeyPath::user_scoped(username, key)?;
        let key = KeyPath::parse(key)?;
        let cache_key = format!(
            "user-key:{}:{}:{}",
            username.len(),
            username,
            key.as_str()
        );

        self.cache
            .get_or_compute(CacheRegion::ConfigKey, &cache_key, &mut || {
                let rows: Vec<E> = [&user_key, &key]
                    .into_iter()
                    .map(|id| self.table.find_committed(id.as_str()))
                    .collect::<Result<Vec<_>>>()?
                    .into_iter()
                    .flatten()
                    .collect();
                Ok(rows)
            })
    }

    /// All entries under `{group}.`, keyed by leaf key.
    ///
    /// Returns `None` when the group has no entries. Leaf keys are the id with
    /// the group prefix stripped; if two rows reduce to the same leaf the last
    /// one wins.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for a malformed group, or the table's error
    /// unchanged.
    pub fn load_all_by_group(&self, group: &str) -> Result<Option<BTreeMap<String, E>>> {
        let group = KeyPath::parse(group)?;
        let cache_key = format!("group:{group}");

        let rows = self
            .cache
            .get_or_compute(CacheRegion::ConfigGroup, &cache_key, &mut || {
                self.table.find_by_prefix(&group.group_prefix())
            })?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut by_leaf = BTreeMap::new();
        for row in rows {
            if let Some(leaf) = group.strip_group(row.id()).map(str::to_string) {
                by_leaf.insert(leaf, row);
            }
        }
        Ok(Some(by_leaf))
    }

    /// Values of all entries under `{group}.`, keyed by leaf key. An empty
    /// group yields an empty map.
    ///
    /// # Errors
    ///
    /// Same as `load_all_by_group`.
    pub fn get_values_by_group_key(&self, group: &str) -> Result<BTreeMap<String, ConfigValue>> {
        Ok(self
            .load_all_by_group(group)?
            .unwrap_or_default()
            .into_iter()
            .map(|(leaf, entry)| (leaf, entry.value().clone()))
            .collect())
    }

    /// Full entry stored under exactly `key`.
    ///
    /// # Errors
    ///
    /// Returns the table's error unchanged.
    pub fn get(&self, key: &str) -> Result<Option<E>> {
        self.table.find_by_id(key)
    }

    /// Value stored under exactly `key`.
    ///
    /// # Errors
    ///
    /// Returns the table's error unchanged.
    pub fn get_configuration_value(&self, key: &str) -> Result<Option<ConfigValue>> {
        Ok(self.get(key)?.map(|entry| entry.value().clone()))
    }

    /// Value under `key` decoded into `V`.
    ///
    /// # Errors
    ///
    /// Returns `Json` if the stored value does not decode into `V`, or the
    /// table's error unchanged.
    pub fn get_typed<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        self.get_configuration_value(key)?
            .map(|value| serde_json::from_value(value).map_err(ConfigError::from))
            .transpose()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create or update the entry under `key`.
    ///
    /// A locked entry is returned unchanged unless `options.force` is set;
    /// that is not an error. Use `save_detailed` to tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for a malformed key, or the table's error
    /// unchanged.
    pub fn save(&self, key: &str, value: ConfigValue, options: SaveOptions) -> Result<E> {
        self.save_detailed(key, value, options)
            .map(SaveOutcome::into_entry)
    }

    /// `save`, reporting whether the write happened.
    ///
    /// # Errors
    ///
    /// Same as `save`.
    pub fn save_detailed(
        &self,
        key: &str,
        value: ConfigValue,
        options: SaveOptions,
    ) -> Result<SaveOutcome<E>> {
        let key = KeyPath::parse(key)?;

        let mut entry = match self.table.find_by_id(key.as_str())? {
            None => E::new(key.into_string()),
            Some(existing) if existing.is_locked() && !options.force => {
                warn!(key = existing.id(), "entry is locked; write skipped");
                return Ok(SaveOutcome::SkippedLocked(existing));
            }
            Some(existing) => existing,
        };

        entry.set_value(value);
        entry.set_value_type(options.value_type);
        entry.set_locked(options.locked);

        self.table.stage(entry.clone())?;
        if options.flush {
            self.commit(Some(entry.id()))?;
        }

        debug!(key = entry.id(), flushed = options.flush, "entry saved");
        Ok(SaveOutcome::Written(entry))
    }

    /// Save every `(key, value)` under `{base_key}.{key}` and commit once.
    ///
    /// Each key takes its type from `types` (absent means no type). Locked
    /// entries are skipped without blocking the others. All keys are
    /// validated before anything is staged. If staging a key fails, only the
    /// changes this batch staged are rolled back; earlier deferred saves stay
    /// staged. The final commit applies everything staged, deferred saves
    /// included.
    ///
    /// The batch is as atomic as the table's commit: a transactional table
    /// applies all or nothing, a non-transactional one may apply part of it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for a malformed base or child key, or the table's
    /// error unchanged.
    pub fn save_multiple(
        &self,
        base_key: &str,
        values: &BTreeMap<String, ConfigValue>,
        types: &BTreeMap<String, String>,
    ) -> Result<Vec<SaveOutcome<E>>> {
        let base = KeyPath::parse(base_key)?;
        let keys = values
            .keys()
            .map(|key| base.join(key))
            .collect::<Result<Vec<_>>>()?;

        let mut prior = Vec::with_capacity(keys.len());
        let mut outcomes = Vec::with_capacity(keys.len());
        for (full, (key, value)) in keys.iter().zip(values) {
            let options = SaveOptions {
                value_type: types.get(key).cloned(),
                ..SaveOptions::default()
            }
            .deferred();
            let saved = self.table.staged(full.as_str()).and_then(|before| {
                prior.push((full.as_str(), before));
                self.save_detailed(full.as_str(), value.clone(), options)
            });
            match saved {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    self.roll_back(prior)?;
                    return Err(err);
                }
            }
        }

        self.commit(None)?;

        let skipped = outcomes.iter().filter(|o| !o.is_written()).count();
        info!(base = %base, written = outcomes.len() - skipped, skipped, "batch saved");
        Ok(outcomes)
    }

    /// Set or clear the global flag of an existing entry.
    ///
    /// Returns `None` if nothing is stored under `key`. The lock does not
    /// apply; it guards the value only.
    ///
    /// # Errors
    ///
    /// Returns the table's error unchanged.
    pub fn set_global(&self, key: &str, global: bool) -> Result<Option<E>> {
        let Some(mut entry) = self.table.find_by_id(key)? else {
            return Ok(None);
        };
        entry.set_global(global);
        self.table.stage(entry.clone())?;
        self.commit(Some(entry.id()))?;
        debug!(key, global, "global flag updated");
        Ok(Some(entry))
    }

    /// Delete the entry under `key` if present and commit. Locks are ignored.
    ///
    /// # Errors
    ///
    /// Returns the table's error unchanged.
    pub fn remove_by_key(&self, key: &str) -> Result<()> {
        if let Some(entry) = self.table.find_by_id(key)? {
            self.table.stage_delete(&entry)?;
            self.commit(None)?;
            info!(key, "entry removed");
        }
        Ok(())
    }

    /// Restore the staged state of each id to what it was before a batch.
    fn roll_back(&self, prior: Vec<(&str, Option<Pending<E>>)>) -> Result<()> {
        let ids = prior.len();
        for (id, before) in prior.into_iter().rev() {
            self.table.unstage(id)?;
            match before {
                Some(Pending::Upsert(entry)) => self.table.stage(entry)?,
                Some(Pending::Delete(deleted)) => self.table.stage_delete(&E::new(deleted))?,
                None => {}
            }
        }
        self.cache.invalidate_all();
        warn!(ids, "batch rolled back");
        Ok(())
    }

    /// Commit through the table, then drop every cached result set.
    fn commit(&self, scope: Option<&str>) -> Result<()> {
        let result = self.table.commit(scope);
        self.cache.invalidate_all();
        result
    }
}
