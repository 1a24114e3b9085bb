use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::db::Database;
use crate::language::Language;
use crate::parser::{self, Article, ParseError};
use crate::session::{Applied, LoadKind, Session, Snapshot};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Owns the reader session and keeps it in sync with the feed and the
/// local store.
pub struct Fetcher {
    client: Client,
    config: Config,
    db: Arc<Database>,
    session: RwLock<Session>,
    refreshing: AtomicBool,
    /// Serializes writes of the read set to the store
    persist_lock: Mutex<()>,
}

/// Clears the refresh flag when dropped, including when the refreshing task
/// is aborted mid-fetch.
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Fetcher {
    /// Build the session from persisted state: stored language (or the
    /// configured default) and stored read ids.
    pub async fn new(db: Arc<Database>, config: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("ErrNews/1.0 (Feed Reader)")
            .build()?;

        let language = db
            .load_language()
            .await?
            .unwrap_or(config.default_language);
        let read = db.load_read_state().await?;
        info!(
            "Restored session: language {}, {} read articles",
            language,
            read.len()
        );

        let session = Session::new(language, read, config.initial_read_batch);

        Ok(Self {
            client,
            config,
            db,
            session: RwLock::new(session),
            refreshing: AtomicBool::new(false),
            persist_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub async fn language(&self) -> Language {
        self.session.read().await.language()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.session.read().await.snapshot(Utc::now())
    }

    /// Retrieve and parse the feed for one language. No retries.
    pub async fn fetch_articles(&self, language: Language) -> Result<Vec<Article>, FetchError> {
        let url = self.config.feed_url(language);
        info!("Fetching {} feed: {}", language, url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;

        let articles = parser::parse_articles(&bytes, &self.config.fallback_category)?;
        info!("Parsed {} articles from {} feed", articles.len(), language);
        Ok(articles)
    }

    /// Fetch for the current language and hand the result to the session.
    ///
    /// Failures are logged and recorded in the session; the error is also
    /// returned for callers that care.
    pub async fn load(&self, kind: LoadKind) -> Result<Applied, FetchError> {
        let (epoch, language) = {
            let session = self.session.read().await;
            (session.epoch(), session.language())
        };

        match self.fetch_articles(language).await {
            Ok(articles) => {
                let applied =
                    self.session
                        .write()
                        .await
                        .apply_articles(epoch, articles, kind, Utc::now());
                match applied {
                    Applied::Stale => {
                        debug!("Discarding stale {} feed result", language);
                    }
                    Applied::Updated { newly_read } if newly_read > 0 => {
                        info!("Marked {} articles read on first load", newly_read);
                        self.persist_read_state().await;
                    }
                    Applied::Updated { .. } => {}
                }
                Ok(applied)
            }
            Err(e) => {
                error!("Failed to fetch {} feed: {}", language, e);
                if !self.session.write().await.apply_failure(epoch) {
                    debug!("Discarding stale {} feed failure", language);
                }
                Err(e)
            }
        }
    }

    /// Background refresh. Returns `None` if another refresh is already
    /// running.
    pub async fn refresh(&self) -> Option<Result<Applied, FetchError>> {
        // Check if already refreshing
        if self.refreshing.swap(true, Ordering::AcqRel) {
            info!("Refresh already in progress, skipping");
            return None;
        }
        let _guard = RefreshGuard(&self.refreshing);

        Some(self.load(LoadKind::Background).await)
    }

    /// Reset the session for a new language and persist the choice. The
    /// caller follows up with [`Fetcher::load`] using [`LoadKind::Initial`].
    pub async fn switch_language(&self, language: Language) {
        let epoch = self.session.write().await.change_language(language);
        info!("Switched to {} (epoch {})", language, epoch);

        if let Err(e) = self.db.save_language(language).await {
            error!("Failed to persist language: {}", e);
        }
    }

    pub async fn change_language(&self, language: Language) -> Result<Applied, FetchError> {
        self.switch_language(language).await;
        self.load(LoadKind::Initial).await
    }

    /// Mark an article read and return the link to open.
    pub async fn open_article(&self, id: &str) -> Option<String> {
        let (link, changed) = self.session.write().await.open_article(id)?;
        if changed {
            self.persist_read_state().await;
        }
        Some(link)
    }

    pub async fn toggle_category(&self, category: &str) -> bool {
        self.session.write().await.toggle_category(category)
    }

    pub async fn toggle_compact(&self) -> bool {
        self.session.write().await.toggle_compact()
    }

    /// Write the current read set. The set is cloned only after taking the
    /// persist lock, so a later save never stores less than an earlier one.
    async fn persist_read_state(&self) {
        let _lock = self.persist_lock.lock().await;
        let read = self.session.read().await.read_state().clone();
        if let Err(e) = self.db.save_read_state(&read).await {
            error!("Failed to persist read articles: {}", e);
        }
    }
}

/// Handle to the polling task. Dropping it stops polling, even in the middle
/// of a fetch.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Initial load, then a background refresh every `interval`.
pub fn start_polling(fetcher: Arc<Fetcher>, interval: Duration) -> PollHandle {
    let task = tokio::spawn(async move {
        info!("Starting initial feed fetch");
        let _ = fetcher.load(LoadKind::Initial).await;

        loop {
            tokio::time::sleep(interval).await;
            info!("Starting scheduled feed refresh");
            let _ = fetcher.refresh().await;
        }
    });

    PollHandle { task }
}
