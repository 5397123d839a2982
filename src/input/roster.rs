use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;
use crate::model::category::Category;
use crate::model::entry::normalize_bib;

pub const UNKNOWN_ATHLETE: &str = "Unknown Athlete";
pub const RECENT_NAMES_CAPACITY: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Athlete {
    pub bib: String,
    pub name: String,
    pub team: String,
    pub gender: Option<String>,
}

/// Read-only bib lookup used for labels in reports and logs.
pub trait RosterLookup {
    fn athlete(&self, bib: &str) -> Option<&Athlete>;

    fn display_name(&self, bib: &str) -> String {
        self.athlete(bib)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN_ATHLETE.to_string())
    }

    fn team(&self, bib: &str) -> String {
        self.athlete(bib).map(|a| a.team.clone()).unwrap_or_default()
    }

    fn category(&self, bib: &str) -> Option<Category> {
        self.athlete(bib)
            .and_then(|a| a.gender.as_deref())
            .and_then(Category::from_gender)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_bib: BTreeMap<String, Athlete>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBib {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawAthlete {
    name: String,
    bib: RawBib,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    inactive: bool,
}

impl Roster {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, InputError> {
        let mut reader = open_maybe_gz(path)?;
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let roster = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), athletes = roster.len(), "loaded roster");
        Ok(roster)
    }

    /// Parses `{"TEAM": [{"name": "...", "bib": 12}, ...], ...}`. Teams are
    /// visited in key order; the first athlete claiming a bib keeps it.
    pub fn from_json_str(text: &str) -> Result<Self, InputError> {
        let teams: BTreeMap<String, Vec<RawAthlete>> = serde_json::from_str(text)
            .map_err(|e| InputError::Parse(format!("roster JSON: {e}")))?;

        let mut by_bib: BTreeMap<String, Athlete> = BTreeMap::new();
        for (team, athletes) in teams {
            for raw in athletes {
                if raw.inactive {
                    continue;
                }
                let bib = match raw.bib {
                    RawBib::Number(n) => n.to_string(),
                    RawBib::Text(s) => normalize_bib(&s),
                };
                if bib.is_empty() {
                    continue;
                }
                if let Some(existing) = by_bib.get(&bib) {
                    tracing::warn!(
                        bib = %bib,
                        kept = %existing.name,
                        dropped = %raw.name,
                        "duplicate bib in roster; keeping first"
                    );
                    continue;
                }
                by_bib.insert(
                    bib.clone(),
                    Athlete {
                        bib,
                        name: raw.name.trim().to_string(),
                        team: team.clone(),
                        gender: raw
                            .gender
                            .map(|g| g.trim().to_string())
                            .filter(|g| !g.is_empty()),
                    },
                );
            }
        }
        Ok(Self { by_bib })
    }

    pub fn len(&self) -> usize {
        self.by_bib.len()
    }
}

impl RosterLookup for Roster {
    fn athlete(&self, bib: &str) -> Option<&Athlete> {
        self.by_bib.get(&normalize_bib(bib))
    }
}

/// Most-recently-used athlete names for autocompletion, oldest first.
/// Persisted as a JSON array of strings in the same order.
#[derive(Debug, Clone)]
pub struct RecentNames {
    names: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentNames {
    fn default() -> Self {
        Self::with_capacity(RECENT_NAMES_CAPACITY)
    }
}

impl RecentNames {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut recent = Self::default();
        for name in names {
            recent.remember(name);
        }
        recent
    }

    /// Missing files start an empty list.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no recent names file yet");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let names: Vec<String> = serde_json::from_str(&text)
            .map_err(|e| InputError::Parse(format!("recent names JSON: {e}")))?;
        Ok(Self::from_names(names.iter().map(String::as_str)))
    }

    pub fn save(&self, path: &Path) -> Result<(), InputError> {
        let names = self.iter().collect::<Vec<_>>();
        let mut json = serde_json::to_string_pretty(&names)
            .map_err(|e| InputError::Parse(format!("recent names JSON: {e}")))?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }

    /// Remembers the roster name of every bib the roster resolves, in order.
    /// Returns how many names were remembered.
    pub fn remember_bibs<'a>(
        &mut self,
        bibs: impl IntoIterator<Item = &'a str>,
        roster: &dyn RosterLookup,
    ) -> usize {
        let mut count = 0;
        for bib in bibs {
            if let Some(athlete) = roster.athlete(bib) {
                self.remember(&athlete.name);
                count += 1;
            }
        }
        count
    }

    /// Moves `name` to the most-recent slot, dropping the oldest entries
    /// beyond capacity.
    pub fn remember(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            self.names.remove(pos);
        }
        self.names.push_back(name.to_string());
        while self.names.len() > self.capacity {
            self.names.pop_front();
        }
    }

    /// Case-insensitive prefix matches, most recent first.
    pub fn suggest(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.names
            .iter()
            .rev()
            .filter(|n| n.to_lowercase().starts_with(&prefix))
            .map(|n| n.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/roster.rs"]
mod tests;
