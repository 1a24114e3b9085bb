use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feed languages offered by the reader. Each one maps to its own feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Et,
    #[default]
    Ru,
    En,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown language: {0:?}")]
pub struct UnknownLanguage(pub String);

impl Language {
    pub const ALL: [Language; 3] = [Language::Et, Language::Ru, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Et => "et",
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    /// Label used on the language switch buttons.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Et => "Estonian",
            Language::Ru => "Russian",
            Language::En => "English",
        }
    }

    pub fn translations(self) -> &'static Translations {
        match self {
            Language::Et => &ET,
            Language::Ru => &RU,
            Language::En => &EN,
        }
    }

    /// Human readable age of an article, e.g. "5 min ago".
    ///
    /// Anything older than a day falls back to a short absolute date.
    pub fn relative_time(self, published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
        let Some(published) = published else {
            return String::new();
        };
        let t = self.translations();
        let elapsed = now.signed_duration_since(published);
        let minutes = elapsed.num_minutes();
        let hours = elapsed.num_hours();

        if minutes < 1 {
            t.just_now.to_string()
        } else if minutes < 60 {
            format!("{} {}", minutes, t.minutes_ago)
        } else if hours < 24 {
            format!("{} {}", hours, t.hours_ago)
        } else {
            published
                .with_timezone(&Local)
                .format("%d.%m %H:%M")
                .to_string()
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "et" => Ok(Language::Et),
            "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// User facing strings for one language.
#[derive(Debug)]
pub struct Translations {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub loading: &'static str,
    pub error: &'static str,
    pub updated: &'static str,
    pub news_last_hour: &'static str,
    pub compact_view: &'static str,
    pub unread: &'static str,
    pub no_news: &'static str,
    pub just_now: &'static str,
    pub minutes_ago: &'static str,
    pub hours_ago: &'static str,
}

static ET: Translations = Translations {
    title: "ERR Uudised",
    subtitle: "Jälgi Eesti viimaseid uudiseid reaalajas",
    loading: "Uudiste laadimine...",
    error: "Uudiste laadimine ebaõnnestus. Palun proovi hiljem uuesti.",
    updated: "Uuendatud",
    news_last_hour: "uudist viimase tunni jooksul",
    compact_view: "Compact view",
    unread: "Lugemata",
    no_news: "Uudiseid pole veel",
    just_now: "just nüüd",
    minutes_ago: "min tagasi",
    hours_ago: "h tagasi",
};

static RU: Translations = Translations {
    title: "ERR Новости",
    subtitle: "Следите за новостями в режиме реального времени",
    loading: "Загрузка новостей...",
    error: "Не удалось загрузить новости. Попробуйте позже.",
    updated: "Обновлено",
    news_last_hour: "новостей за последний час",
    compact_view: "Compact view",
    unread: "Unread",
    no_news: "Новостей пока нет",
    just_now: "только что",
    minutes_ago: "мин назад",
    hours_ago: "ч назад",
};

static EN: Translations = Translations {
    title: "ERR News",
    subtitle: "Follow the latest Estonian news in real-time",
    loading: "Loading news...",
    error: "Failed to load news. Please try again later.",
    updated: "Updated",
    news_last_hour: "news in the last hour",
    compact_view: "Compact view",
    unread: "Unread",
    no_news: "No news yet",
    just_now: "just now",
    minutes_ago: "min ago",
    hours_ago: "h ago",
};
