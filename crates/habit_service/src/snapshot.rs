use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use habit_core::{CompletionIndex, Habit, HabitCompletion};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// On-disk shape of one snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotFile {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub completions: Vec<HabitCompletion>,
}

impl SnapshotFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot `{}`", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot `{}`", path.display()))
    }
}

/// Immutable pair of habits and completions captured together.
///
/// Every computation for one view should run against a single `Snapshot` so
/// habits and completions never come from different moments.
#[derive(Debug, Clone)]
pub struct Snapshot {
    habits: Vec<Habit>,
    completions: Vec<HabitCompletion>,
    index: CompletionIndex,
    loaded_at: DateTime<Utc>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl Snapshot {
    pub fn new(habits: Vec<Habit>, completions: Vec<HabitCompletion>) -> Self {
        let index = CompletionIndex::new(&completions);
        let orphans = index.orphan_habit_ids(&habits);
        if !orphans.is_empty() {
            debug!(count = orphans.len(), ?orphans, "completions without a habit are ignored");
        }
        Self {
            habits,
            completions,
            index,
            loaded_at: Utc::now(),
        }
    }

    /// Merge files in order. The first habit seen with a given id wins;
    /// completions are combined and deduplicated by the index.
    pub fn merge(files: impl IntoIterator<Item = (PathBuf, SnapshotFile)>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut habits = Vec::new();
        let mut completions = Vec::new();
        for (path, file) in files {
            for habit in file.habits {
                if seen.insert(habit.id.clone()) {
                    habits.push(habit);
                } else {
                    warn!(id = %habit.id, path = %path.display(), "duplicate habit id dropped");
                }
            }
            completions.extend(file.completions);
        }
        Self::new(habits, completions)
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn active_habits(&self) -> impl Iterator<Item = &Habit> {
        self.habits.iter().filter(|habit| habit.is_active)
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn completions(&self) -> &[HabitCompletion] {
        &self.completions
    }

    pub fn index(&self) -> &CompletionIndex {
        &self.index
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}
