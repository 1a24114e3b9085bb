use std::collections::{BTreeSet, HashSet};

use crate::parser::Article;

/// Categories currently shown. New categories start enabled; only a user
/// toggle or a language switch removes anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    enabled: HashSet<String>,
}

impl CategoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, category: &str) -> bool {
        self.enabled.contains(category)
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// Enable every category seen in a fresh fetch.
    pub fn absorb(&mut self, articles: &[Article]) {
        for article in articles {
            if !self.enabled.contains(&article.category) {
                self.enabled.insert(article.category.clone());
            }
        }
    }

    /// Flip one category, returning whether it is now enabled.
    pub fn toggle(&mut self, category: &str) -> bool {
        if self.enabled.remove(category) {
            false
        } else {
            self.enabled.insert(category.to_string());
            true
        }
    }

    pub fn reset(&mut self) {
        self.enabled.clear();
    }
}

/// Distinct categories of a list, sorted, for the filter buttons.
pub fn all_known(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .map(|a| a.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
