use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Local;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::fetcher::Fetcher;
use crate::language::{Language, Translations, UnknownLanguage};
use crate::session::{LoadKind, Status};
use crate::view::ArticleRow;

/// Seconds before the loading page reloads itself
const LOADING_RELOAD_SECS: u64 = 2;

pub struct AppState {
    pub fetcher: Arc<Fetcher>,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub t: &'static Translations,
    pub lang: &'static str,
    pub languages: Vec<LanguageButton>,
    pub loading: bool,
    pub error: bool,
    pub compact: bool,
    pub rows: Vec<ArticleRow>,
    pub categories: Vec<CategoryButton>,
    pub last_hour: usize,
    pub last_updated: Option<String>,
    pub reload_after: u64,
}

pub struct LanguageButton {
    pub code: &'static str,
    pub label: &'static str,
    pub active: bool,
}

pub struct CategoryButton {
    pub name: String,
    pub enabled: bool,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

pub enum AppError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

impl From<UnknownLanguage> for AppError {
    fn from(err: UnknownLanguage) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/open", get(open_article))
        .route("/categories/toggle", post(toggle_category))
        .route("/language/:code", post(change_language))
        .route("/compact", post(toggle_compact))
        .route("/refresh", post(refresh))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.fetcher.snapshot().await;
    let language = snapshot.language;

    let languages = Language::ALL
        .iter()
        .map(|&l| LanguageButton {
            code: l.code(),
            label: l.display_name(),
            active: l == language,
        })
        .collect();

    let categories = snapshot
        .categories
        .into_iter()
        .map(|(name, enabled)| CategoryButton { name, enabled })
        .collect();

    let loading = snapshot.status == Status::Loading;
    let reload_after = if loading {
        LOADING_RELOAD_SECS
    } else {
        state.fetcher.config().refresh_interval
    };

    HtmlTemplate(IndexTemplate {
        t: language.translations(),
        lang: language.code(),
        languages,
        loading,
        error: snapshot.status == Status::Error,
        compact: snapshot.compact,
        rows: snapshot.rows,
        categories,
        last_hour: snapshot.last_hour,
        last_updated: snapshot
            .last_updated
            .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string()),
        reload_after,
    })
}

#[derive(Deserialize)]
pub struct OpenQuery {
    pub id: String,
}

/// Mark the article read, then send the browser on to it.
pub async fn open_article(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OpenQuery>,
) -> Result<Redirect, AppError> {
    let link = state
        .fetcher
        .open_article(&query.id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Article not found: {}", query.id)))?;

    // Redirect::to needs a valid header value
    if link.is_empty() || HeaderValue::from_str(&link).is_err() {
        return Ok(Redirect::to("/"));
    }
    Ok(Redirect::to(&link))
}

#[derive(Deserialize)]
pub struct CategoryForm {
    pub category: String,
}

pub async fn toggle_category(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CategoryForm>,
) -> Redirect {
    state.fetcher.toggle_category(&form.category).await;
    Redirect::to("/")
}

pub async fn change_language(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Redirect, AppError> {
    let language: Language = code.parse()?;
    state.fetcher.switch_language(language).await;

    // Load in the background so the loading page shows right away
    let fetcher = state.fetcher.clone();
    tokio::spawn(async move {
        let _ = fetcher.load(LoadKind::Initial).await;
    });

    Ok(Redirect::to("/"))
}

pub async fn toggle_compact(State(state): State<Arc<AppState>>) -> Redirect {
    state.fetcher.toggle_compact().await;
    Redirect::to("/")
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Redirect {
    // Spawn the refresh task
    let fetcher = state.fetcher.clone();
    tokio::spawn(async move {
        let _ = fetcher.refresh().await;
    });

    Redirect::to("/")
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
