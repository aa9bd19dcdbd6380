//! Catalog screen: page listing, filters and bulk actions.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::{Effect, Notice, Request};
use crate::api::{ApiError, PageQuery};
use crate::debounce::Debouncer;
use crate::export::LocaleBundle;
use crate::models::{LocaleEntry, LocaleTable, NewPage, Page, Tag};
use crate::routes::Route;

/// Search text shorter than this clears the name filter.
pub const SEARCH_MIN_LENGTH: usize = 1;

/// Multi-select over the available tags. Selection keeps pick order.
#[derive(Debug, Clone, Default)]
pub struct TagPicker {
    available: Vec<String>,
    selected: Vec<String>,
    cursor: usize,
}

impl TagPicker {
    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.iter().any(|t| t == tag)
    }

    /// Replace the available options, dropping selections that vanished.
    pub fn set_available(&mut self, tags: Vec<String>) {
        self.available = tags;
        let available = &self.available;
        self.selected.retain(|t| available.contains(t));
        self.cursor = self.cursor.min(self.available.len().saturating_sub(1));
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.available.is_empty() {
            return;
        }
        let len = self.available.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    pub fn toggle(&mut self, tag: &str) {
        if let Some(pos) = self.selected.iter().position(|t| t == tag) {
            self.selected.remove(pos);
        } else {
            self.selected.push(tag.to_string());
        }
    }

    /// Toggle the tag under the cursor; false when there is none.
    pub fn toggle_current(&mut self) -> bool {
        match self.available.get(self.cursor).cloned() {
            Some(tag) => {
                self.toggle(&tag);
                true
            }
            None => false,
        }
    }

    /// Clear the selection; returns whether anything was selected.
    pub fn reset(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }
}

/// Which catalog dialog is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    CreatePage,
    CreateTag,
    BulkUpload,
    Download,
}

impl ModalKind {
    pub fn title(self) -> &'static str {
        match self {
            ModalKind::CreatePage => "Create Page",
            ModalKind::CreateTag => "Create Tag",
            ModalKind::BulkUpload => "Bulk Upload File",
            ModalKind::Download => "Download Files",
        }
    }

    pub fn uses_tags(self) -> bool {
        matches!(self, ModalKind::CreatePage | ModalKind::Download)
    }

    fn fields(self) -> Vec<FormField> {
        match self {
            ModalKind::CreatePage => vec![
                FormField::new("Page Name", "Page name here"),
                FormField::new("Image", "Path to an image file"),
                FormField::new("Locale", "Locale string in JSON"),
            ],
            ModalKind::CreateTag => vec![FormField::new("Tag Name", "Insert tag name here")],
            ModalKind::BulkUpload => vec![FormField::new("File", "Path to a JSON file")],
            ModalKind::Download => Vec::new(),
        }
    }
}

/// One text input in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub placeholder: &'static str,
    pub value: String,
}

impl FormField {
    fn new(label: &'static str, placeholder: &'static str) -> Self {
        Self {
            label,
            placeholder,
            value: String::new(),
        }
    }
}

/// An open catalog dialog.
#[derive(Debug, Clone)]
pub struct CatalogModal {
    pub kind: ModalKind,
    pub fields: Vec<FormField>,
    /// Index into `fields`; `fields.len()` is the tag picker.
    pub focus: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl CatalogModal {
    pub fn new(kind: ModalKind) -> Self {
        Self {
            kind,
            fields: kind.fields(),
            focus: 0,
            error: None,
            submitting: false,
        }
    }

    fn stops(&self) -> usize {
        self.fields.len() + usize::from(self.kind.uses_tags())
    }

    pub fn focus_next(&mut self) {
        let stops = self.stops();
        if stops > 0 {
            self.focus = (self.focus + 1) % stops;
        }
    }

    pub fn focus_prev(&mut self) {
        let stops = self.stops();
        if stops > 0 {
            self.focus = (self.focus + stops - 1) % stops;
        }
    }

    pub fn tags_focused(&self) -> bool {
        self.kind.uses_tags() && self.focus == self.fields.len()
    }

    pub fn focused_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.focus)
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.trim())
            .unwrap_or("")
    }

    pub fn set_value(&mut self, label: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.label == label) {
            field.value = value.to_string();
        }
    }

    fn fail(&mut self, message: &str) -> Vec<Effect> {
        self.submitting = false;
        self.error = Some(message.to_string());
        vec![Effect::Notify(Notice::error(message))]
    }
}

/// State of the catalog screen.
#[derive(Debug)]
pub struct CatalogScreen {
    pub pages: Vec<Page>,
    pub tags: TagPicker,
    pub search: String,
    pub modal: Option<CatalogModal>,
    selected_row: usize,
    applied_name: String,
    debouncer: Debouncer<String>,
    export_dir: PathBuf,
}

impl CatalogScreen {
    pub fn new(search_debounce: Duration, export_dir: PathBuf) -> Self {
        Self {
            pages: Vec::new(),
            tags: TagPicker::default(),
            search: String::new(),
            modal: None,
            selected_row: 0,
            applied_name: String::new(),
            debouncer: Debouncer::new(search_debounce),
            export_dir,
        }
    }

    /// Filters currently applied to the listing.
    pub fn query(&self) -> PageQuery {
        PageQuery {
            tags: self.tags.selected().to_vec(),
            name: self.applied_name.clone(),
        }
    }

    fn fetch_pages(&self) -> Effect {
        Effect::Send(Request::ListPages(self.query()))
    }

    /// Initial loads: tags once, pages with the current filters.
    pub fn mount(&self) -> Vec<Effect> {
        vec![Effect::Send(Request::ListTags), self.fetch_pages()]
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    pub fn search_push(&mut self, c: char, now: Instant) {
        self.search.push(c);
        self.debouncer.push(self.search.clone(), now);
    }

    pub fn search_backspace(&mut self, now: Instant) {
        if self.search.pop().is_some() {
            self.debouncer.push(self.search.clone(), now);
        }
    }

    /// Advance timers; fires the debounced search when it is due.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let Some(text) = self.debouncer.poll(now) else {
            return Vec::new();
        };
        let name = if text.chars().count() >= SEARCH_MIN_LENGTH {
            text
        } else {
            String::new()
        };
        if name == self.applied_name {
            return Vec::new();
        }
        self.applied_name = name;
        vec![self.fetch_pages()]
    }

    /// Time until the pending search fires, if any.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    /// Toggle the filter tag under the picker cursor.
    pub fn toggle_filter_tag(&mut self) -> Vec<Effect> {
        if self.modal.is_some() || !self.tags.toggle_current() {
            return Vec::new();
        }
        vec![self.fetch_pages()]
    }

    fn reset_tags(&mut self) -> Vec<Effect> {
        if self.tags.reset() {
            vec![self.fetch_pages()]
        } else {
            Vec::new()
        }
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn selected_page(&self) -> Option<&Page> {
        self.pages.get(self.selected_row)
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.pages.is_empty() {
            self.selected_row = 0;
            return;
        }
        let max = self.pages.len() as isize - 1;
        self.selected_row = (self.selected_row as isize + delta).clamp(0, max) as usize;
    }

    pub fn view_selected(&self) -> Vec<Effect> {
        self.selected_page()
            .map(|p| vec![Effect::Navigate(Route::Detail(p.id.clone()))])
            .unwrap_or_default()
    }

    pub fn edit_selected(&self) -> Vec<Effect> {
        self.selected_page()
            .map(|p| vec![Effect::Navigate(Route::Annotate(p.id.clone()))])
            .unwrap_or_default()
    }

    pub fn delete_selected(&self) -> Vec<Effect> {
        self.selected_page()
            .map(|p| vec![Effect::Send(Request::DeletePage(p.id.clone()))])
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Dialogs
    // ------------------------------------------------------------------

    pub fn open_modal(&mut self, kind: ModalKind) {
        self.modal = Some(CatalogModal::new(kind));
    }

    /// Dismiss the open dialog. Dialogs with a tag picker also reset it.
    pub fn close_modal(&mut self) -> Vec<Effect> {
        match self.modal.take() {
            Some(modal) if modal.kind.uses_tags() || modal.kind == ModalKind::CreateTag => {
                self.reset_tags()
            }
            _ => Vec::new(),
        }
    }

    /// Validate and submit the open dialog.
    pub fn submit_modal(&mut self) -> Vec<Effect> {
        let selected_tags = self.tags.selected().to_vec();
        let Some(modal) = self.modal.as_mut() else {
            return Vec::new();
        };
        if modal.submitting {
            return Vec::new();
        }
        modal.error = None;

        let request = match modal.kind {
            ModalKind::CreatePage => {
                let name = modal.value("Page Name").to_string();
                let image = modal.value("Image").to_string();
                let locale = modal.value("Locale").to_string();
                if name.is_empty() {
                    return modal.fail("Page name is required.");
                }
                if image.is_empty() || !Path::new(&image).is_file() {
                    return modal.fail("Image must point to an existing file.");
                }
                let locale = match LocaleTable::validate_for_upload(&locale) {
                    Ok(locale) => locale,
                    Err(e) => return modal.fail(&format!("Invalid locale: {}", e)),
                };
                Request::CreatePage(NewPage {
                    name,
                    tags: selected_tags,
                    image: PathBuf::from(image),
                    locale,
                })
            }
            ModalKind::CreateTag => {
                let name = modal.value("Tag Name").to_string();
                if name.is_empty() {
                    return modal.fail("Tag name is required.");
                }
                Request::CreateTag(name)
            }
            ModalKind::BulkUpload => {
                let file = modal.value("File").to_string();
                if file.is_empty() || !Path::new(&file).is_file() {
                    return modal.fail("Choose an existing file to upload.");
                }
                Request::BulkInsert(PathBuf::from(file))
            }
            ModalKind::Download => Request::Download(selected_tags),
        };

        modal.submitting = true;
        vec![Effect::Send(request)]
    }

    // ------------------------------------------------------------------
    // Responses
    // ------------------------------------------------------------------

    pub fn on_tags(&mut self, result: Result<Vec<Tag>, ApiError>) -> Vec<Effect> {
        match result {
            Ok(tags) => {
                self.tags
                    .set_available(tags.into_iter().map(|t| t.name).collect());
                Vec::new()
            }
            Err(e) => {
                warn!("Fetching tags failed: {}", e);
                vec![Effect::Notify(Notice::error("Error fetching tags"))]
            }
        }
    }

    /// Replace the listing wholesale.
    pub fn on_pages(&mut self, result: Result<Vec<Page>, ApiError>) -> Vec<Effect> {
        match result {
            Ok(pages) => {
                self.pages = pages;
                self.move_selection(0);
                Vec::new()
            }
            Err(e) => {
                warn!("Fetching pages failed: {}", e);
                vec![Effect::Notify(Notice::error("Error fetching pages"))]
            }
        }
    }

    /// Close on success; keep the dialog open with the error otherwise.
    fn finish_create(
        &mut self,
        result: Result<(), ApiError>,
        success: &str,
        fallback: &str,
    ) -> Vec<Effect> {
        match result {
            Ok(()) => {
                self.modal = None;
                self.tags.reset();
                vec![Effect::Notify(Notice::success(success)), self.fetch_pages()]
            }
            Err(e) => {
                warn!("{}: {}", fallback, e);
                let message = e.user_message(fallback);
                match self.modal.as_mut() {
                    Some(modal) => modal.fail(&message),
                    None => vec![Effect::Notify(Notice::error(message))],
                }
            }
        }
    }

    pub fn on_page_created(&mut self, result: Result<(), ApiError>) -> Vec<Effect> {
        self.finish_create(result, "Page created successfully!", "Error uploading image.")
    }

    pub fn on_tag_created(&mut self, result: Result<(), ApiError>) -> Vec<Effect> {
        let created = result.is_ok();
        let mut effects =
            self.finish_create(result, "Tag created successfully!", "Error creating tag.");
        if created {
            effects.push(Effect::Send(Request::ListTags));
        }
        effects
    }

    /// The upload dialog closes whatever the outcome.
    pub fn on_bulk_inserted(&mut self, result: Result<(), ApiError>) -> Vec<Effect> {
        self.modal = None;
        match result {
            Ok(()) => vec![
                Effect::Notify(Notice::success("Bulk upload is done successfully!")),
                self.fetch_pages(),
            ],
            Err(e) => {
                warn!("Bulk upload failed: {}", e);
                vec![Effect::Notify(Notice::error(
                    e.user_message("Error doing bulk upload"),
                ))]
            }
        }
    }

    /// Write the three locale files, then close the dialog.
    pub fn on_downloaded(&mut self, result: Result<Vec<LocaleEntry>, ApiError>) -> Vec<Effect> {
        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Locale download failed: {}", e);
                let message = e.user_message("Error downloading locale files.");
                return match self.modal.as_mut() {
                    Some(modal) => modal.fail(&message),
                    None => vec![Effect::Notify(Notice::error(message))],
                };
            }
        };

        let bundle = LocaleBundle::from_entries(&entries);
        match bundle.write_to(&self.export_dir) {
            Ok(paths) => {
                info!("Wrote {} locale files", paths.len());
                self.modal = None;
                let mut effects = vec![Effect::Notify(Notice::success(format!(
                    "File is downloaded successfully! ({} keys in {})",
                    bundle.len(),
                    self.export_dir.display()
                )))];
                effects.extend(self.reset_tags());
                effects
            }
            Err(e) => {
                let message = format!("Error writing locale files: {}", e);
                match self.modal.as_mut() {
                    Some(modal) => modal.fail(&message),
                    None => vec![Effect::Notify(Notice::error(message))],
                }
            }
        }
    }

    /// Refetch after a delete so the removed row disappears.
    pub fn on_page_deleted(&mut self, result: Result<(), ApiError>) -> Vec<Effect> {
        match result {
            Ok(()) => vec![
                Effect::Notify(Notice::success("Page is deleted successfully!")),
                self.fetch_pages(),
            ],
            Err(e) => {
                warn!("Delete failed: {}", e);
                vec![Effect::Notify(Notice::error(
                    e.user_message("Error deleting page."),
                ))]
            }
        }
    }
}
