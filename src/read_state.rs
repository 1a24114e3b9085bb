use std::collections::HashSet;

use crate::parser::Article;

/// Ids of articles the user has opened. The set only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadState {
    ids: HashSet<String>,
}

impl ReadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns `true` if the id was not already marked.
    pub fn mark_read(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    /// First-run policy: with nothing read yet, the first `batch` fetched
    /// items (feed order) are marked read so a fresh install does not show
    /// the whole feed as unread. Returns how many ids were added.
    pub fn apply_first_run(&mut self, fetched: &[Article], batch: usize) -> usize {
        if !self.ids.is_empty() || fetched.is_empty() {
            return 0;
        }
        fetched
            .iter()
            .take(batch)
            .filter(|article| self.ids.insert(article.id.clone()))
            .count()
    }

    /// Ids in a stable order, for persisting.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}
