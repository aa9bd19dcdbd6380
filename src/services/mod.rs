//! Screen controllers for pagedesk.
//!
//! Each screen owns its state and reacts to operator input and backend
//! responses by returning [`Effect`]s: requests to send, notices to show, or
//! a route to navigate to. Nothing here performs I/O except [`execute`],
//! which the front end runs off the UI thread.

pub mod annotate;
pub mod catalog;
pub mod detail;

use std::path::PathBuf;

use tracing::debug;

use crate::api::{ApiClient, ApiError, PageQuery};
use crate::models::{LocaleEntry, NewPage, Page, Tag};
use crate::routes::Route;

pub use annotate::{AnnotatePhase, AnnotateScreen, EditorFocus};
pub use catalog::{CatalogModal, CatalogScreen, ModalKind};
pub use detail::{DetailScreen, ImageView, LocaleView};

/// Severity of an operator notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Something a controller wants the front end to do.
#[derive(Debug)]
pub enum Effect {
    Send(Request),
    Notify(Notice),
    Navigate(Route),
}

/// A backend call to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListTags,
    ListPages(PageQuery),
    GetPage(String),
    FetchImage(String),
    CreateTag(String),
    CreatePage(NewPage),
    BulkInsert(PathBuf),
    DeletePage(String),
    Download(Vec<String>),
    SaveAnnotatedImage {
        id: String,
        name: String,
        png: Vec<u8>,
    },
    SaveLocale {
        id: String,
        locale: String,
    },
}

/// Result of a [`Request`], tagged by kind.
#[derive(Debug)]
pub enum Response {
    Tags(Result<Vec<Tag>, ApiError>),
    Pages(Result<Vec<Page>, ApiError>),
    Page(Result<Page, ApiError>),
    Image(Result<Vec<u8>, ApiError>),
    TagCreated(Result<(), ApiError>),
    PageCreated(Result<(), ApiError>),
    BulkInserted(Result<(), ApiError>),
    PageDeleted(Result<(), ApiError>),
    Downloaded(Result<Vec<LocaleEntry>, ApiError>),
    AnnotationSaved(Result<(), ApiError>),
    LocaleSaved(Result<(), ApiError>),
}

/// Perform a request against the backend.
pub async fn execute(api: &ApiClient, request: Request) -> Response {
    debug!("Executing {}", request_label(&request));
    match request {
        Request::ListTags => Response::Tags(api.list_tags().await),
        Request::ListPages(query) => Response::Pages(api.list_pages(&query).await),
        Request::GetPage(id) => Response::Page(api.get_page(&id).await),
        Request::FetchImage(link) => Response::Image(api.fetch_image(&link).await),
        Request::CreateTag(name) => Response::TagCreated(api.create_tag(&name).await),
        Request::CreatePage(page) => Response::PageCreated(api.create_page(&page).await),
        Request::BulkInsert(path) => Response::BulkInserted(api.bulk_insert(&path).await),
        Request::DeletePage(id) => Response::PageDeleted(api.delete_page(&id).await),
        Request::Download(tags) => Response::Downloaded(api.download_locales(&tags).await),
        Request::SaveAnnotatedImage { id, name, png } => {
            Response::AnnotationSaved(api.save_annotated_image(&id, &name, png).await)
        }
        Request::SaveLocale { id, locale } => {
            Response::LocaleSaved(api.save_locale(&id, &locale).await)
        }
    }
}

fn request_label(request: &Request) -> &'static str {
    match request {
        Request::ListTags => "list-tags",
        Request::ListPages(_) => "list-pages",
        Request::GetPage(_) => "get-page",
        Request::FetchImage(_) => "fetch-image",
        Request::CreateTag(_) => "create-tag",
        Request::CreatePage(_) => "create-page",
        Request::BulkInsert(_) => "bulk-insert",
        Request::DeletePage(_) => "delete-page",
        Request::Download(_) => "download",
        Request::SaveAnnotatedImage { .. } => "save-annotated-image",
        Request::SaveLocale { .. } => "save-locale",
    }
}

/// Collect the requests from a list of effects. Used by tests and the CLI.
pub fn requests(effects: &[Effect]) -> Vec<&Request> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Send(r) => Some(r),
            _ => None,
        })
        .collect()
}

/// Collect the notices from a list of effects.
pub fn notices(effects: &[Effect]) -> Vec<&Notice> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
        .collect()
}
