//! Static disease reference table
//!
//! Maps a normalized lookup key (see [`crate::classes::normalize_label`]) to a
//! [`DiseaseRecord`]. The builtin table is embedded from
//! `assets/disease_info.json` and built with an explicit last-write-wins step:
//! when two entries share a key, the later one replaces the earlier one and the
//! collision is recorded and logged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classes::{lookup_keys, normalize_label, CLASS_LABELS};
use crate::utils::error::{PlantDocError, Result};

/// Embedded reference data, in class order
const BUILTIN_TABLE: &str = include_str!("../../assets/disease_info.json");

/// Version of the embedded table format this code understands
pub const TABLE_FORMAT_VERSION: u32 = 1;

/// Description, symptoms, treatment tips and a reference video for one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub description: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub diagnosis: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// One row of the source table: the key it is stored under and the class it
/// was written for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseEntry {
    pub source_label: String,
    pub key: String,
    #[serde(flatten)]
    pub record: DiseaseRecord,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    version: u32,
    entries: Vec<DiseaseEntry>,
}

/// A key that more than one entry was stored under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCollision {
    pub key: String,
    /// Source label of the entry that is retrievable
    pub winner: String,
    /// Source labels of the entries that were replaced, in insertion order
    pub overwritten: Vec<String>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    source_label: String,
    record: DiseaseRecord,
}

/// Exact-match lookup table from normalized key to disease record
#[derive(Debug, Clone)]
pub struct DiseaseTable {
    records: BTreeMap<String, StoredRecord>,
    collisions: Vec<KeyCollision>,
}

impl DiseaseTable {
    /// Build a table from ordered entries. Later entries win on key collisions.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = DiseaseEntry>,
    {
        let mut records: BTreeMap<String, StoredRecord> = BTreeMap::new();
        let mut collisions: Vec<KeyCollision> = Vec::new();

        for entry in entries {
            let stored = StoredRecord {
                source_label: entry.source_label,
                record: entry.record,
            };

            if let Some(previous) = records.insert(entry.key.clone(), stored) {
                let winner = records[&entry.key].source_label.clone();
                warn!(
                    "Disease key '{}' from {} replaces the entry from {}",
                    entry.key, winner, previous.source_label
                );

                match collisions.iter_mut().find(|c| c.key == entry.key) {
                    Some(collision) => {
                        collision.overwritten.push(previous.source_label);
                        collision.winner = winner;
                    }
                    None => collisions.push(KeyCollision {
                        key: entry.key,
                        winner,
                        overwritten: vec![previous.source_label],
                    }),
                }
            }
        }

        debug!(
            "Disease table built: {} keys, {} colliding",
            records.len(),
            collisions.len()
        );

        Self {
            records,
            collisions,
        }
    }

    /// Parse a table from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TableFile = serde_json::from_str(json)?;
        if file.version != TABLE_FORMAT_VERSION {
            return Err(PlantDocError::Serialization(format!(
                "disease table version {} is not supported (expected {})",
                file.version, TABLE_FORMAT_VERSION
            )));
        }
        Ok(Self::from_entries(file.entries))
    }

    /// The reference table shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Exact-match retrieval. No fuzzy matching and no default record.
    pub fn lookup(&self, key: &str) -> Result<&DiseaseRecord> {
        self.records
            .get(key)
            .map(|stored| &stored.record)
            .ok_or_else(|| PlantDocError::UnknownDisease {
                key: key.to_string(),
            })
    }

    /// Source label of the entry currently stored under `key`
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(|s| s.source_label.as_str())
    }

    /// Whether a record exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys that more than one entry was stored under
    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    /// Class labels whose normalized key has no record
    pub fn unreachable_labels(&self) -> Vec<&'static str> {
        CLASS_LABELS
            .iter()
            .copied()
            .filter(|label| !self.contains(&normalize_label(label)))
            .collect()
    }

    /// Stored keys that no class label normalizes to
    pub fn orphan_keys(&self) -> Vec<&str> {
        let produced = lookup_keys();
        self.keys()
            .filter(|key| !produced.iter().any(|p| p == key))
            .collect()
    }
}
