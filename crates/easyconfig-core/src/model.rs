//! Configuration entry types.

use serde::{Deserialize, Serialize};

/// Stored value. The `value_type` tag travels alongside it.
pub type ConfigValue = serde_json::Value;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Capability set every stored configuration row provides.
///
/// `SCHEMA` names the table/shape the entry kind lives in; a store refuses
/// to bind to a table that declares a different schema.
pub trait ConfigEntry: Clone + Send + Sync + 'static {
    const SCHEMA: &'static str;

    /// Build a fresh entry. The id is fixed for the entry's lifetime.
    fn new(id: String) -> Self;

    fn id(&self) -> &str;

    fn value(&self) -> &ConfigValue;
    fn set_value(&mut self, value: ConfigValue);

    fn value_type(&self) -> Option<&str>;
    fn set_value_type(&mut self, value_type: Option<String>);

    fn is_locked(&self) -> bool;
    fn set_locked(&mut self, locked: bool);

    fn is_global(&self) -> bool;
    fn set_global(&mut self, global: bool);
}

/// Boolean columns a table can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryFlag {
    Global,
    Locked,
}

impl EntryFlag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "is_global",
            Self::Locked => "locked",
        }
    }

    /// Read this flag off an entry.
    #[must_use]
    pub fn get<E: ConfigEntry>(self, entry: &E) -> bool {
        match self {
            Self::Global => entry.is_global(),
            Self::Locked => entry.is_locked(),
        }
    }
}

/// Default configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseConfig {
    pub id: String,
    #[serde(default)]
    pub value: ConfigValue,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_global: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
}

impl ConfigEntry for BaseConfig {
    const SCHEMA: &'static str = "config";

    fn new(id: String) -> Self {
        Self {
            id,
            value: ConfigValue::Null,
            value_type: None,
            is_global: false,
            locked: false,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> &ConfigValue {
        &self.value
    }

    fn set_value(&mut self, value: ConfigValue) {
        self.value = value;
    }

    fn value_type(&self) -> Option<&str> {
        self.value_type.as_deref()
    }

    fn set_value_type(&mut self, value_type: Option<String>) {
        self.value_type = value_type;
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    fn is_global(&self) -> bool {
        self.is_global
    }

    fn set_global(&mut self, global: bool) {
        self.is_global = global;
    }
}

/// Result of a single write, distinguishing a skipped locked entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome<E> {
    /// The entry was created or updated and staged.
    Written(E),
    /// The entry is locked and `force` was not set; returned unchanged.
    SkippedLocked(E),
}

impl<E> SaveOutcome<E> {
    #[must_use]
    pub const fn entry(&self) -> &E {
        match self {
            Self::Written(entry) | Self::SkippedLocked(entry) => entry,
        }
    }

    #[must_use]
    pub fn into_entry(self) -> E {
        match self {
            Self::Written(entry) | Self::SkippedLocked(entry) => entry,
        }
    }

    #[must_use]
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}
