use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps the free-text row labels of one report section to canonical keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyDef {
    /// Section this vocabulary applies to (e.g. "gf_revenue").
    pub section: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// Label as printed in the report -> canonical category key.
    pub labels: BTreeMap<String, String>,
}

impl VocabularyDef {
    /// Canonical key for a label.
    ///
    /// Canonical keys map to themselves, so normalizing twice is a no-op.
    pub fn lookup<'a>(&'a self, label: &'a str) -> Option<&'a str> {
        if let Some(key) = self.labels.get(label) {
            return Some(key.as_str());
        }
        if self.labels.values().any(|k| k == label) {
            return Some(label);
        }
        None
    }

    /// Distinct canonical keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.labels.values().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}
