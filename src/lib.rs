//! pagedesk - operator console for localized, annotated pages.
//!
//! The library holds everything the binary drives: the REST client, the
//! per-screen controllers, the drawing surface used for annotations, and the
//! locale export transform. The terminal UI and the CLI subcommands are thin
//! layers over these.

pub mod api;
pub mod canvas;
pub mod colors;
pub mod config;
pub mod debounce;
pub mod export;
pub mod models;
pub mod routes;
pub mod services;
pub mod tui;

pub use api::{ApiClient, ApiError};
pub use config::Settings;
pub use models::{LocaleEntry, LocaleTable, NewPage, Page, Tag};
