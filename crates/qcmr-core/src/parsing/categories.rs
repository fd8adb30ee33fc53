use crate::error::QcmrError;
use crate::model::{NumericGrid, RawGrid};
use crate::vocabulary::schema::VocabularyDef;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do with row labels missing from the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    /// Log a warning and drop the rows.
    #[default]
    WarnAndDrop,
    /// Abort the section.
    Fail,
}

/// Result of mapping one grid's labels onto canonical keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<G> {
    pub grid: G,
    /// Labels that were not in the vocabulary (and whose rows were dropped).
    pub unrecognized: Vec<String>,
}

/// Map each label to its key; `None` marks an unrecognized label.
fn map_labels(
    labels: &[String],
    vocabulary: &VocabularyDef,
    policy: UnmappedPolicy,
    section: &str,
) -> Result<(Vec<Option<String>>, Vec<String>), QcmrError> {
    let mut keys = Vec::with_capacity(labels.len());
    let mut unrecognized: Vec<String> = Vec::new();

    for label in labels {
        match vocabulary.lookup(label) {
            Some(key) => keys.push(Some(key.to_string())),
            None => {
                if !unrecognized.contains(label) {
                    unrecognized.push(label.clone());
                }
                keys.push(None);
            }
        }
    }

    if !unrecognized.is_empty() {
        match policy {
            UnmappedPolicy::Fail => {
                return Err(QcmrError::UnrecognizedCategory {
                    section: section.to_string(),
                    labels: unrecognized,
                })
            }
            UnmappedPolicy::WarnAndDrop => {
                warn!(section = %section, labels = ?unrecognized, "ignoring unrecognized categories");
            }
        }
    }

    Ok((keys, unrecognized))
}

/// Replace the label column with canonical keys, dropping unrecognized rows.
pub fn normalize(
    grid: RawGrid,
    vocabulary: &VocabularyDef,
    policy: UnmappedPolicy,
    section: &str,
) -> Result<Normalized<RawGrid>, QcmrError> {
    let labels: Vec<String> = (0..grid.n_rows())
        .map(|i| grid.first_cell(i).to_string())
        .collect();
    let (keys, unrecognized) = map_labels(&labels, vocabulary, policy, section)?;

    let rows = grid
        .into_rows()
        .into_iter()
        .zip(keys)
        .filter_map(|(mut row, key)| {
            let key = key?;
            if let Some(first) = row.first_mut() {
                *first = key;
            }
            Some(row)
        })
        .collect();

    Ok(Normalized {
        grid: RawGrid::new(rows),
        unrecognized,
    })
}

/// [`normalize`] for a grid whose values are already numeric.
pub fn normalize_numeric(
    grid: NumericGrid,
    vocabulary: &VocabularyDef,
    policy: UnmappedPolicy,
    section: &str,
) -> Result<Normalized<NumericGrid>, QcmrError> {
    let (keys, unrecognized) = map_labels(&grid.labels, vocabulary, policy, section)?;

    let mut out = NumericGrid::default();
    for (key, values) in keys.into_iter().zip(grid.values) {
        if let Some(key) = key {
            out.labels.push(key);
            out.values.push(values);
        }
    }

    Ok(Normalized {
        grid: out,
        unrecognized,
    })
}
