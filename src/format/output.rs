use std::collections::BTreeMap;

use easyconfig_core::{BaseConfig, ConfigValue, SaveOutcome};
use serde::{Deserialize, Serialize};

/// Entry as shown by read commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: BaseConfig,
    /// Leaf key relative to the queried group, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf: Option<String>,
}

impl From<BaseConfig> for EntryView {
    fn from(entry: BaseConfig) -> Self {
        Self { entry, leaf: None }
    }
}

/// Outcome of `ecfg set`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveReport {
    pub key: String,
    /// False when the entry was locked and the write skipped.
    pub written: bool,
    pub entry: BaseConfig,
}

impl From<SaveOutcome<BaseConfig>> for SaveReport {
    fn from(outcome: SaveOutcome<BaseConfig>) -> Self {
        let written = outcome.is_written();
        let entry = outcome.into_entry();
        Self {
            key: entry.id.clone(),
            written,
            entry,
        }
    }
}

/// Outcome of `ecfg set-many`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub base: String,
    pub written: Vec<String>,
    pub skipped_locked: Vec<String>,
    pub values: BTreeMap<String, ConfigValue>,
}

impl BatchReport {
    #[must_use]
    pub fn from_outcomes(base: &str, outcomes: Vec<SaveOutcome<BaseConfig>>) -> Self {
        let mut report = Self {
            base: base.to_string(),
            ..Self::default()
        };
        for outcome in outcomes {
            let written = outcome.is_written();
            let entry = outcome.into_entry();
            if written {
                report.written.push(entry.id.clone());
            } else {
                report.skipped_locked.push(entry.id.clone());
            }
            report.values.insert(entry.id, entry.value);
        }
        report
    }
}
