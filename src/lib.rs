//! ERR News - a polling news reader
//!
//! This crate keeps one reader session in sync with the ERR RSS feed of the
//! selected language: it parses items, remembers which ones were read,
//! filters by category and serves the resulting list through a small web UI.

pub mod categories;
pub mod config;
pub mod db;
pub mod fetcher;
pub mod language;
pub mod parser;
pub mod read_state;
pub mod routes;
pub mod session;
pub mod view;
