use crate::error::QcmrError;
use crate::parsing::categories::UnmappedPolicy;
use crate::vocabulary::VocabularySet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Settings for processing and comparing reports.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "data_dir": "/srv/qcmr", "unmapped": "fail",
///   "vocabularies": { "gf_spending": "spending-2021.json" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Root holding `raw/` PDFs and `processed/` bundles.
    pub data_dir: PathBuf,
    pub unmapped: UnmappedPolicy,
    /// Section name -> vocabulary file replacing the built-in one.
    pub vocabularies: BTreeMap<String, PathBuf>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        AssemblerConfig {
            data_dir: PathBuf::from("data"),
            unmapped: UnmappedPolicy::default(),
            vocabularies: BTreeMap::new(),
        }
    }
}

impl AssemblerConfig {
    /// Read a JSON config file.
    ///
    /// Relative vocabulary paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, QcmrError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AssemblerConfig = serde_json::from_str(&content)?;
        if let Some(base) = path.parent() {
            for file in config.vocabularies.values_mut() {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        Ok(config)
    }

    /// Built-in vocabularies with this config's overrides applied.
    pub fn vocabulary_set(&self) -> Result<VocabularySet, QcmrError> {
        VocabularySet::with_overrides(&self.vocabularies)
    }
}
