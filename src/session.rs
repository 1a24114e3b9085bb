//! In-memory state of one reader session.
//!
//! `Session` holds no I/O handles. The fetcher drives it and persists
//! whatever it reports as changed.

use chrono::{DateTime, Utc};

use crate::categories::{self, CategoryFilter};
use crate::language::Language;
use crate::parser::Article;
use crate::read_state::ReadState;
use crate::view::{self, ArticleRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Ready,
    Error,
}

/// Why a fetch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Startup or language switch. Eligible for the first-run read batch.
    Initial,
    /// Timer tick or manual refresh. Keeps showing the current content.
    Background,
}

/// Result of handing a fetch outcome to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The language changed while the fetch was in flight; nothing applied.
    Stale,
    Updated { newly_read: usize },
}

#[derive(Debug)]
pub struct Session {
    language: Language,
    /// Bumped on every language change
    epoch: u64,
    articles: Vec<Article>,
    read: ReadState,
    categories: CategoryFilter,
    compact: bool,
    status: Status,
    last_updated: Option<DateTime<Utc>>,
    initial_read_batch: usize,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub status: Status,
    pub language: Language,
    pub compact: bool,
    pub rows: Vec<ArticleRow>,
    /// Every known category with its enabled flag, sorted by name
    pub categories: Vec<(String, bool)>,
    pub last_hour: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(language: Language, read: ReadState, initial_read_batch: usize) -> Self {
        Self {
            language,
            epoch: 0,
            articles: Vec::new(),
            read,
            categories: CategoryFilter::new(),
            compact: false,
            status: Status::Loading,
            last_updated: None,
            initial_read_batch,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn read_state(&self) -> &ReadState {
        &self.read
    }

    pub fn categories(&self) -> &CategoryFilter {
        &self.categories
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Replace the article list with a fresh fetch started at `epoch`.
    pub fn apply_articles(
        &mut self,
        epoch: u64,
        articles: Vec<Article>,
        kind: LoadKind,
        now: DateTime<Utc>,
    ) -> Applied {
        if epoch != self.epoch {
            return Applied::Stale;
        }

        let newly_read = match kind {
            LoadKind::Initial => self.read.apply_first_run(&articles, self.initial_read_batch),
            LoadKind::Background => 0,
        };
        self.categories.absorb(&articles);
        self.articles = articles;
        self.last_updated = Some(now);
        self.status = Status::Ready;

        Applied::Updated { newly_read }
    }

    /// Record a failed fetch started at `epoch`. Returns `false` if stale.
    ///
    /// The previous articles are kept; only the status changes.
    pub fn apply_failure(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.status = Status::Error;
        true
    }

    /// Switch feeds. Clears articles and categories and returns the new
    /// epoch, which the follow-up fetch must carry.
    pub fn change_language(&mut self, language: Language) -> u64 {
        self.language = language;
        self.epoch += 1;
        self.articles.clear();
        self.categories.reset();
        self.status = Status::Loading;
        self.epoch
    }

    /// Mark an article from the current list as read and return its link.
    ///
    /// `None` if no such article is loaded. The flag reports whether the read
    /// set changed.
    pub fn open_article(&mut self, id: &str) -> Option<(String, bool)> {
        let link = self
            .articles
            .iter()
            .find(|article| article.id == id)?
            .link
            .clone();
        let changed = self.read.mark_read(id);
        Some((link, changed))
    }

    pub fn toggle_category(&mut self, category: &str) -> bool {
        self.categories.toggle(category)
    }

    pub fn toggle_compact(&mut self) -> bool {
        self.compact = !self.compact;
        self.compact
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let categories = categories::all_known(&self.articles)
            .into_iter()
            .map(|name| {
                let enabled = self.categories.is_enabled(&name);
                (name, enabled)
            })
            .collect();

        Snapshot {
            status: self.status,
            language: self.language,
            compact: self.compact,
            rows: view::derive_view(&self.articles, &self.categories, &self.read, self.language, now),
            categories,
            last_hour: view::count_last_hour(&self.articles, now),
            last_updated: self.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap()
    }

    fn article(id: &str, category: &str, minutes_ago: i64) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {}", id),
            link: format!("https://example.com/{}", id),
            description: String::new(),
            published_at: Some(now() - Duration::minutes(minutes_ago)),
            category: category.to_string(),
            image_url: None,
        }
    }

    fn batch(n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| article(&format!("id-{}", i), "News", i as i64))
            .collect()
    }

    fn fresh() -> Session {
        Session::new(Language::Ru, ReadState::new(), 5)
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_starts_loading() {
            let session = fresh();
            assert_eq!(session.status(), Status::Loading);
            assert!(session.articles().is_empty());
            assert!(session.last_updated().is_none());
        }

        #[test]
        fn test_successful_fetch_becomes_ready() {
            let mut session = fresh();
            let applied = session.apply_articles(0, batch(3), LoadKind::Initial, now());

            assert_eq!(applied, Applied::Updated { newly_read: 3 });
            assert_eq!(session.status(), Status::Ready);
            assert_eq!(session.articles().len(), 3);
            assert_eq!(session.last_updated(), Some(now()));
        }

        #[test]
        fn test_failure_keeps_previous_articles() {
            let mut session = fresh();
            session.apply_articles(0, batch(3), LoadKind::Initial, now());

            assert!(session.apply_failure(0));
            assert_eq!(session.status(), Status::Error);
            assert_eq!(session.articles().len(), 3);
        }

        #[test]
        fn test_recovers_from_error_on_next_success() {
            let mut session = fresh();
            session.apply_failure(0);
            assert_eq!(session.status(), Status::Error);

            session.apply_articles(0, batch(1), LoadKind::Background, now());
            assert_eq!(session.status(), Status::Ready);
        }

        #[test]
        fn test_list_is_replaced_wholesale() {
            let mut session = fresh();
            session.apply_articles(0, batch(4), LoadKind::Initial, now());
            session.apply_articles(0, vec![article("x", "News", 0)], LoadKind::Background, now());

            assert_eq!(session.articles().len(), 1);
            assert_eq!(session.articles()[0].id, "x");
        }
    }

    mod read_merge_tests {
        use super::*;

        #[test]
        fn test_initial_load_marks_first_five() {
            let mut session = fresh();
            session.apply_articles(0, batch(8), LoadKind::Initial, now());

            let read = session.read_state();
            assert_eq!(read.len(), 5);
            assert!(read.is_read("id-0"));
            assert!(read.is_read("id-4"));
            assert!(!read.is_read("id-5"));
        }

        #[test]
        fn test_background_load_never_auto_marks() {
            let mut session = fresh();
            let applied = session.apply_articles(0, batch(8), LoadKind::Background, now());

            assert_eq!(applied, Applied::Updated { newly_read: 0 });
            assert!(session.read_state().is_empty());
        }

        #[test]
        fn test_persisted_reads_suppress_first_run() {
            let read = ReadState::from_ids(vec!["elsewhere".to_string()]);
            let mut session = Session::new(Language::En, read, 5);
            session.apply_articles(0, batch(8), LoadKind::Initial, now());
            assert_eq!(session.read_state().len(), 1);
        }

        #[test]
        fn test_open_article_marks_read_and_returns_link() {
            let mut session = fresh();
            session.apply_articles(0, batch(8), LoadKind::Background, now());

            let opened = session.open_article("id-6");
            assert_eq!(opened, Some(("https://example.com/id-6".to_string(), true)));
            assert!(session.read_state().is_read("id-6"));

            let again = session.open_article("id-6");
            assert_eq!(again, Some(("https://example.com/id-6".to_string(), false)));
        }

        #[test]
        fn test_open_unknown_article() {
            let mut session = fresh();
            assert_eq!(session.open_article("missing"), None);
            assert!(session.read_state().is_empty());
        }
    }

    mod language_change_tests {
        use super::*;

        #[test]
        fn test_change_resets_articles_and_categories() {
            let mut session = fresh();
            session.apply_articles(0, batch(3), LoadKind::Initial, now());
            assert!(!session.categories().is_empty());

            let epoch = session.change_language(Language::Et);

            assert_eq!(epoch, 1);
            assert_eq!(session.language(), Language::Et);
            assert_eq!(session.status(), Status::Loading);
            assert!(session.articles().is_empty());
            assert!(session.categories().is_empty());
        }

        #[test]
        fn test_change_keeps_read_state() {
            let mut session = fresh();
            session.apply_articles(0, batch(3), LoadKind::Initial, now());
            session.change_language(Language::En);
            assert_eq!(session.read_state().len(), 3);
        }

        #[test]
        fn test_categories_after_change_only_from_new_fetch() {
            let mut session = fresh();
            session.apply_articles(0, vec![article("a", "Спорт", 1)], LoadKind::Initial, now());

            let epoch = session.change_language(Language::Et);
            session.apply_articles(epoch, vec![article("b", "Eesti", 1)], LoadKind::Initial, now());

            assert!(session.categories().is_enabled("Eesti"));
            assert!(!session.categories().is_enabled("Спорт"));
        }

        #[test]
        fn test_stale_success_is_discarded() {
            let mut session = fresh();
            let old_epoch = session.epoch();
            let new_epoch = session.change_language(Language::En);

            let applied = session.apply_articles(old_epoch, batch(3), LoadKind::Background, now());
            assert_eq!(applied, Applied::Stale);
            assert!(session.articles().is_empty());
            assert_eq!(session.status(), Status::Loading);

            session.apply_articles(new_epoch, batch(2), LoadKind::Initial, now());
            assert_eq!(session.articles().len(), 2);
        }

        #[test]
        fn test_stale_failure_is_discarded() {
            let mut session = fresh();
            session.change_language(Language::En);
            assert!(!session.apply_failure(0));
            assert_eq!(session.status(), Status::Loading);
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn test_snapshot_reflects_filter_and_counts() {
            let mut session = fresh();
            let articles = vec![
                article("a", "Sport", 10),
                article("b", "Eesti", 30),
                article("c", "Eesti", 120),
            ];
            session.apply_articles(0, articles, LoadKind::Background, now());
            session.toggle_category("Sport");

            let snapshot = session.snapshot(now());

            assert_eq!(snapshot.status, Status::Ready);
            assert_eq!(snapshot.rows.len(), 2);
            assert_eq!(snapshot.rows[0].id, "b");
            assert_eq!(snapshot.last_hour, 2);
            assert_eq!(
                snapshot.categories,
                vec![("Eesti".to_string(), true), ("Sport".to_string(), false)]
            );
        }

        #[test]
        fn test_compact_toggle_is_session_only() {
            let mut session = fresh();
            assert!(!session.is_compact());
            assert!(session.toggle_compact());
            assert!(session.snapshot(now()).compact);
            assert!(!session.toggle_compact());
        }
    }
}
