//! URL/history collaborator

use serde::{Deserialize, Serialize};

/// Path plus query string (stored without the leading `?`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub search: String,
}

impl Location {
    pub fn new(path: impl Into<String>, search: &str) -> Self {
        Self {
            path: path.into(),
            search: search.strip_prefix('?').unwrap_or(search).to_string(),
        }
    }

    pub fn href(&self) -> String {
        if self.search.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.search)
        }
    }
}

/// Reads and writes the current URL
///
/// `push` appends a history entry (a back-button stop); `replace` overwrites
/// the current one.
pub trait Navigator {
    fn location(&self) -> Location;

    fn push(&mut self, path: &str, search: &str);

    fn replace(&mut self, path: &str, search: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOp {
    Push(Location),
    Replace(Location),
}

/// In-process history stack with back/forward
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Location>,
    index: usize,
    ops: Vec<HistoryOp>,
}

impl MemoryHistory {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            ops: Vec::new(),
        }
    }

    pub fn at(path: &str, search: &str) -> Self {
        Self::new(Location::new(path, search))
    }

    /// Step back one entry; returns the new location, or None at the start
    pub fn back(&mut self) -> Option<Location> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    pub fn forward(&mut self) -> Option<Location> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every push/replace issued so far, in order
    pub fn ops(&self) -> &[HistoryOp] {
        &self.ops
    }

    pub fn replace_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, HistoryOp::Replace(_)))
            .count()
    }

    pub fn push_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, HistoryOp::Push(_)))
            .count()
    }
}

impl Navigator for MemoryHistory {
    fn location(&self) -> Location {
        self.entries[self.index].clone()
    }

    fn push(&mut self, path: &str, search: &str) {
        let location = Location::new(path, search);
        // pushing drops any forward entries
        self.entries.truncate(self.index + 1);
        self.entries.push(location.clone());
        self.index = self.entries.len() - 1;
        self.ops.push(HistoryOp::Push(location));
    }

    fn replace(&mut self, path: &str, search: &str) {
        let location = Location::new(path, search);
        self.entries[self.index] = location.clone();
        self.ops.push(HistoryOp::Replace(location));
    }
}
