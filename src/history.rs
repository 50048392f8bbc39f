use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::Diagram;

pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Linear undo/redo over full diagram copies.
///
/// `past` is bounded: pushing past `max_len` evicts the oldest entry.
/// `future` only ever holds states undone since the last recorded mutation.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Diagram>,
    future: Vec<Diagram>,
    max_len: usize,
}

impl Default for History {
    fn default() -> Self {
        History::new(DEFAULT_MAX_HISTORY)
    }
}

impl History {
    pub fn new(max_len: usize) -> Self {
        History {
            past: VecDeque::new(),
            future: Vec::new(),
            max_len,
        }
    }

    /// Records the state a mutation started from. Invalidates redo.
    pub fn record(&mut self, before: Diagram) {
        self.future.clear();
        self.push_past(before);
    }

    fn push_past(&mut self, state: Diagram) {
        if self.max_len == 0 {
            return;
        }
        self.past.push_back(state);
        while self.past.len() > self.max_len {
            self.past.pop_front();
        }
    }

    /// Swaps `current` for the most recent past state. Returns false, leaving
    /// `current` alone, when there is nothing to undo.
    pub fn undo(&mut self, current: &mut Diagram) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        true
    }

    pub fn redo(&mut self, current: &mut Diagram) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let undone = std::mem::replace(current, next);
        self.push_past(undone);
        true
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedSnapshot {
    pub diagram: Diagram,
    pub file_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Named restore points, owned by one store and unbounded.
#[derive(Debug, Clone, Default)]
pub struct SnapshotTable {
    entries: BTreeMap<String, NamedSnapshot>,
}

impl SnapshotTable {
    /// Stores a copy of `diagram` under `name`, replacing any earlier entry.
    pub fn insert(&mut self, name: &str, diagram: &Diagram, file_path: Option<PathBuf>) {
        self.entries.insert(
            name.to_string(),
            NamedSnapshot {
                diagram: diagram.clone(),
                file_path,
                created_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&NamedSnapshot> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn list(&self) -> Vec<SnapshotInfo> {
        self.entries
            .iter()
            .map(|(name, snap)| SnapshotInfo {
                name: name.clone(),
                created_at: snap.created_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
