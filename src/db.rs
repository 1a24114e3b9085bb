use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::warn;

use crate::language::Language;
use crate::read_state::ReadState;

pub const READ_ARTICLES_KEY: &str = "read_articles";
pub const LANGUAGE_KEY: &str = "language";

/// Local key/value storage for the two persisted session values.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_setting(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn put_setting(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load the read ids. A corrupt stored value is logged and read as empty.
    pub async fn load_read_state(&self) -> anyhow::Result<ReadState> {
        let Some(raw) = self.get_setting(READ_ARTICLES_KEY).await? else {
            return Ok(ReadState::new());
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Ok(ReadState::from_ids(ids)),
            Err(e) => {
                warn!("Failed to parse stored read articles, starting empty: {}", e);
                Ok(ReadState::new())
            }
        }
    }

    pub async fn save_read_state(&self, read: &ReadState) -> anyhow::Result<()> {
        let json = serde_json::to_string(&read.to_sorted_vec())?;
        self.put_setting(READ_ARTICLES_KEY, &json).await
    }

    /// Stored language, if any. Unknown codes are ignored.
    pub async fn load_language(&self) -> anyhow::Result<Option<Language>> {
        let Some(raw) = self.get_setting(LANGUAGE_KEY).await? else {
            return Ok(None);
        };

        match raw.parse::<Language>() {
            Ok(language) => Ok(Some(language)),
            Err(e) => {
                warn!("Ignoring stored language: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save_language(&self, language: Language) -> anyhow::Result<()> {
        self.put_setting(LANGUAGE_KEY, language.code()).await
    }
}
