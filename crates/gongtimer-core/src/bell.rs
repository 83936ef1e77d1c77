//! Interval bells.
//!
//! A [`BellSet`] keeps its bells sorted by offset from session start, so
//! consumers can walk [`BellSet::ordered`] without sorting. Bells sharing an
//! offset keep insertion order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::duration::{format_seconds, parse_to_seconds};
use crate::error::ValidationError;

pub type BellId = u32;

pub const DEFAULT_BELL_LABEL: &str = "Default Bell";
pub const DEFAULT_BELL_SUBTITLE: &str = "Basu • 1 strike";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bell {
    pub id: BellId,
    pub label: String,
    pub subtitle: String,
    /// Canonical time text, e.g. `"05:00"`.
    pub time: String,
    /// Seconds after session start at which the bell rings.
    pub offset_secs: u64,
}

/// A bell that has not been added to a set yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBell {
    pub label: String,
    pub subtitle: String,
    pub time: String,
}

impl NewBell {
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            label: DEFAULT_BELL_LABEL.to_string(),
            subtitle: DEFAULT_BELL_SUBTITLE.to_string(),
            time: time.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredBellSet")]
pub struct BellSet {
    bells: Vec<Bell>,
    /// Last id handed out. Never decreases, so deleted ids are not reused.
    last_id: BellId,
}

/// Wire form of a [`BellSet`], checked before it becomes one.
#[derive(Deserialize)]
struct StoredBellSet {
    #[serde(default)]
    bells: Vec<Bell>,
    #[serde(default)]
    last_id: BellId,
}

impl TryFrom<StoredBellSet> for BellSet {
    type Error = ValidationError;

    fn try_from(stored: StoredBellSet) -> Result<Self, Self::Error> {
        let mut bells = stored.bells;
        let mut seen = HashSet::with_capacity(bells.len());
        for bell in &bells {
            if !seen.insert(bell.id) {
                return Err(ValidationError::InvalidValue {
                    field: "bells".to_string(),
                    message: format!("duplicate bell id {}", bell.id),
                });
            }
        }
        bells.sort_by_key(|b| b.offset_secs);
        let max_id = bells.iter().map(|b| b.id).max().unwrap_or(0);
        Ok(Self {
            bells,
            last_id: stored.last_id.max(max_id),
        })
    }
}

impl BellSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bell and return its id.
    ///
    /// Fails if the time text is not a valid duration.
    pub fn add(&mut self, bell: NewBell) -> Result<BellId, ValidationError> {
        let offset_secs = parse_to_seconds(&bell.time).into_result()?;
        let id = self.last_id.checked_add(1).ok_or_else(|| ValidationError::InvalidValue {
            field: "id".to_string(),
            message: "bell ids exhausted".to_string(),
        })?;
        self.last_id = id;

        let index = self.bells.partition_point(|b| b.offset_secs <= offset_secs);
        self.bells.insert(
            index,
            Bell {
                id,
                label: bell.label,
                subtitle: bell.subtitle,
                time: format_seconds(offset_secs),
                offset_secs,
            },
        );
        Ok(id)
    }

    pub fn remove(&mut self, id: BellId) -> Option<Bell> {
        let index = self.bells.iter().position(|b| b.id == id)?;
        Some(self.bells.remove(index))
    }

    pub fn get(&self, id: BellId) -> Option<&Bell> {
        self.bells.iter().find(|b| b.id == id)
    }

    /// Bells in ascending offset order.
    pub fn ordered(&self) -> impl Iterator<Item = &Bell> + '_ {
        self.bells.iter()
    }

    pub fn len(&self) -> usize {
        self.bells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bells.is_empty()
    }

    /// Drop every bell. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.bells.clear();
    }
}

impl<'a> IntoIterator for &'a BellSet {
    type Item = &'a Bell;
    type IntoIter = std::slice::Iter<'a, Bell>;

    fn into_iter(self) -> Self::IntoIter {
        self.bells.iter()
    }
}
