use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::categories::CategoryFilter;
use crate::language::Language;
use crate::parser::Article;
use crate::read_state::ReadState;

/// One rendered list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRow {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Localized "5 min ago" style label
    pub age: String,
    pub unread: bool,
}

/// Newest first; undated articles go last.
fn newest_first(a: &Option<DateTime<Utc>>, b: &Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter to enabled categories and sort newest first.
///
/// The sort is stable: articles with equal timestamps keep feed order.
pub fn derive_view(
    articles: &[Article],
    filter: &CategoryFilter,
    read: &ReadState,
    language: Language,
    now: DateTime<Utc>,
) -> Vec<ArticleRow> {
    let mut rows: Vec<ArticleRow> = articles
        .iter()
        .filter(|article| filter.is_enabled(&article.category))
        .map(|article| ArticleRow {
            id: article.id.clone(),
            title: article.title.clone(),
            link: article.link.clone(),
            description: article.description.clone(),
            category: article.category.clone(),
            image_url: article.image_url.clone(),
            published_at: article.published_at,
            age: language.relative_time(article.published_at, now),
            unread: !read.is_read(&article.id),
        })
        .collect();

    rows.sort_by(|a, b| newest_first(&a.published_at, &b.published_at));
    rows
}

/// Articles published at or after `now - 1h`, counted over the whole list
/// regardless of category filter.
pub fn count_last_hour(articles: &[Article], now: DateTime<Utc>) -> usize {
    let cutoff = now - Duration::hours(1);
    articles
        .iter()
        .filter(|article| matches!(article.published_at, Some(ts) if ts >= cutoff))
        .count()
}
