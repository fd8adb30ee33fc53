pub mod builtin;
pub mod schema;

use crate::error::QcmrError;
use schema::VocabularyDef;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// The vocabularies in effect for a run: built-in presets, with overrides.
#[derive(Debug, Clone)]
pub struct VocabularySet {
    by_section: BTreeMap<String, VocabularyDef>,
}

impl VocabularySet {
    /// All built-in presets.
    pub fn builtin() -> Result<Self, QcmrError> {
        let mut by_section = BTreeMap::new();
        for name in builtin::PRESETS {
            by_section.insert(name.to_string(), builtin::load_preset(name)?);
        }
        Ok(Self { by_section })
    }

    /// Built-in presets, with the files in `overrides` replacing them per section.
    pub fn with_overrides<P: AsRef<Path>>(
        overrides: &BTreeMap<String, P>,
    ) -> Result<Self, QcmrError> {
        let mut set = Self::builtin()?;
        for (section, path) in overrides {
            let vocabulary = load_vocabulary(path.as_ref())?;
            if &vocabulary.section != section {
                return Err(QcmrError::VocabularyInvalid(format!(
                    "{} declares section '{}' but overrides '{}'",
                    path.as_ref().display(),
                    vocabulary.section,
                    section
                )));
            }
            debug!(section = %section, path = %path.as_ref().display(), "vocabulary override");
            set.insert(vocabulary);
        }
        Ok(set)
    }

    pub fn insert(&mut self, vocabulary: VocabularyDef) {
        self.by_section.insert(vocabulary.section.clone(), vocabulary);
    }

    pub fn get(&self, section: &str) -> Result<&VocabularyDef, QcmrError> {
        self.by_section.get(section).ok_or_else(|| {
            QcmrError::VocabularyInvalid(format!("no vocabulary for section '{}'", section))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &VocabularyDef> {
        self.by_section.values()
    }
}

/// Load a vocabulary from a JSON file.
pub fn load_vocabulary(path: &Path) -> Result<VocabularyDef, QcmrError> {
    let content = std::fs::read_to_string(path).map_err(|e| QcmrError::VocabularyLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_vocabulary(&content, path)
}

/// Parse a vocabulary from a JSON string.
pub fn parse_vocabulary(json: &str, source: &Path) -> Result<VocabularyDef, QcmrError> {
    let vocabulary: VocabularyDef =
        serde_json::from_str(json).map_err(|e| QcmrError::VocabularyLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_vocabulary(&vocabulary)?;
    Ok(vocabulary)
}

/// Parse a vocabulary from a JSON string (no file path context).
pub fn parse_vocabulary_str(json: &str) -> Result<VocabularyDef, QcmrError> {
    let vocabulary: VocabularyDef = serde_json::from_str(json).map_err(QcmrError::Json)?;
    validate_vocabulary(&vocabulary)?;
    Ok(vocabulary)
}

/// Validate that a vocabulary is well-formed.
pub fn validate_vocabulary(vocabulary: &VocabularyDef) -> Result<(), QcmrError> {
    if vocabulary.section.trim().is_empty() {
        return Err(QcmrError::VocabularyInvalid(
            "section must not be empty".into(),
        ));
    }

    if vocabulary.labels.is_empty() {
        return Err(QcmrError::VocabularyInvalid(format!(
            "vocabulary for '{}' has no labels",
            vocabulary.section
        )));
    }

    for (label, key) in &vocabulary.labels {
        if label.trim().is_empty() {
            return Err(QcmrError::VocabularyInvalid(format!(
                "empty label in '{}'",
                vocabulary.section
            )));
        }
        if !is_canonical_key(key) {
            return Err(QcmrError::VocabularyInvalid(format!(
                "label '{}' maps to '{}'; keys must be lowercase snake_case",
                label, key
            )));
        }
    }

    Ok(())
}

/// Lowercase ASCII letters, digits and underscores, starting with a letter.
pub fn is_canonical_key(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
