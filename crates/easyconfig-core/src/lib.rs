//! `easyconfig-core` - Hierarchical per-user/group configuration store.
//!
//! Keys are dotted namespaces (`group.key`, `username.group.key`). Lookups
//! combine user-scoped entries with global group entries, writes respect
//! locked entries unless forced, and batches commit once.
//!
//! The store talks to storage through [`EntityTable`] and caches query
//! results through [`CachePort`]. [`InMemoryTable`] is a table with optional
//! JSONL persistence; the `easyconfig` crate adds a SQLite table.
//!
//! # Quick Start
//!
//! ```
//! use easyconfig_core::{BaseConfig, ConfigStore, InMemoryTable, RegionCache, SaveOptions};
//! use serde_json::json;
//!
//! let store: ConfigStore<BaseConfig, _> =
//!     ConfigStore::new(InMemoryTable::new(), RegionCache::new()).unwrap();
//!
//! store.save("theme.color", json!("red"), SaveOptions::default()).unwrap();
//! store.save("theme.mode", json!("dark"), SaveOptions::default().locked()).unwrap();
//!
//! // Locked entries are left alone unless forced.
//! store.save("theme.mode", json!("light"), SaveOptions::default()).unwrap();
//! assert_eq!(store.get_configuration_value("theme.mode").unwrap(), Some(json!("dark")));
//!
//! let values = store.get_values_by_group_key("theme").unwrap();
//! assert_eq!(values["color"], json!("red"));
//! ```

pub mod cache;
pub mod error;
pub mod jsonl;
pub mod key;
pub mod model;
pub mod store;
pub mod table;

pub use cache::{CachePort, CacheRegion, CacheStats, NoCache, RegionCache};
pub use error::{ConfigError, Result};
pub use key::KeyPath;
pub use model::{BaseConfig, ConfigEntry, ConfigValue, EntryFlag, SaveOutcome};
pub use store::{ConfigStore, SaveOptions};
pub use table::{EntityTable, InMemoryTable, Pending, UnitOfWork};
