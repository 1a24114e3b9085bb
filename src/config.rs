use serde::Deserialize;
use std::path::Path;

use crate::language::Language;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Refresh interval in seconds
    pub refresh_interval: u64,
    /// Prefix put in front of every feed URL (cross-origin relay)
    pub relay: String,
    pub default_language: Language,
    /// Category assigned to items that carry none
    pub fallback_category: String,
    /// How many items get marked read on the very first load
    pub initial_read_batch: usize,
    pub bind: String,
    pub feeds: FeedUrls,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FeedUrls {
    pub et: String,
    pub ru: String,
    pub en: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            relay: "https://corsproxy.io/?".to_string(),
            default_language: Language::default(),
            fallback_category: "Новости".to_string(),
            initial_read_batch: 5,
            bind: "0.0.0.0:3000".to_string(),
            feeds: FeedUrls::default(),
        }
    }
}

impl Default for FeedUrls {
    fn default() -> Self {
        Self {
            et: "https://www.err.ee/rss".to_string(),
            ru: "https://rus.err.ee/rss".to_string(),
            en: "https://news.err.ee/rss".to_string(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    60
}

impl FeedUrls {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Et => &self.et,
            Language::Ru => &self.ru,
            Language::En => &self.en,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.refresh_interval > 0,
            "refresh_interval must be at least 1 second"
        );
        Ok(())
    }

    /// Address actually requested for a language: relay prefix plus feed URL.
    pub fn feed_url(&self, language: Language) -> String {
        format!("{}{}", self.relay, self.feeds.get(language))
    }
}
