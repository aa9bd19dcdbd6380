//! Annotation editor: text overlays on a page image, plus locale editing.

use std::sync::Arc;

use tracing::{info, warn};

use super::{Effect, LocaleView, Notice, Request};
use crate::api::ApiError;
use crate::canvas::{GlyphFont, RasterCanvas, Surface, TextOverlay};
use crate::models::{LocaleTable, Page};
use crate::routes::Route;

/// Where the editor is in its load/edit/save cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotatePhase {
    Idle,
    Loading,
    CanvasReady,
    Editing,
    Saving,
    Failed(String),
}

/// What keyboard input goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorFocus {
    #[default]
    Canvas,
    /// Typing replaces the selected overlay's text.
    OverlayText,
    Locale,
}

/// State of the annotation editor.
#[derive(Debug)]
pub struct AnnotateScreen {
    pub id: String,
    pub page: Option<Page>,
    pub phase: AnnotatePhase,
    pub focus: EditorFocus,
    pub locale_input: String,
    pub show_raw_locale: bool,
    canvas: RasterCanvas,
    selected: Option<usize>,
    nudge_step: i32,
}

impl AnnotateScreen {
    pub fn new(id: impl Into<String>, font: Option<Arc<GlyphFont>>, nudge_step: u32) -> Self {
        let canvas = match font {
            Some(font) => RasterCanvas::default().with_font(font),
            None => RasterCanvas::default(),
        };
        Self {
            id: id.into(),
            page: None,
            phase: AnnotatePhase::Idle,
            focus: EditorFocus::Canvas,
            locale_input: String::new(),
            show_raw_locale: false,
            canvas,
            selected: None,
            nudge_step: i32::try_from(nudge_step.max(1)).unwrap_or(i32::MAX),
        }
    }

    pub fn canvas(&self) -> &RasterCanvas {
        &self.canvas
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_overlay(&self) -> Option<&TextOverlay> {
        self.selected.and_then(|i| self.canvas.overlays().get(i))
    }

    /// Overlays can only be placed once the page image is on the canvas, and
    /// not while a save is in flight.
    pub fn can_edit(&self) -> bool {
        self.canvas.has_backdrop()
            && !matches!(self.phase, AnnotatePhase::Loading | AnnotatePhase::Saving)
    }

    /// Saving needs the decoded page image. A failed save keeps the backdrop,
    /// so it can be retried; a failed load never set one.
    pub fn can_save(&self) -> bool {
        self.canvas.has_backdrop()
            && matches!(
                self.phase,
                AnnotatePhase::CanvasReady | AnnotatePhase::Editing | AnnotatePhase::Failed(_)
            )
    }

    pub fn locale_view(&self) -> Option<LocaleView<'_>> {
        self.page
            .as_ref()
            .map(|page| LocaleView::of(page, self.show_raw_locale))
    }

    pub fn toggle_locale(&mut self) {
        self.show_raw_locale = !self.show_raw_locale;
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    pub fn mount(&mut self) -> Vec<Effect> {
        self.phase = AnnotatePhase::Loading;
        vec![Effect::Send(Request::GetPage(self.id.clone()))]
    }

    /// Store the page and go fetch its image.
    pub fn on_page(&mut self, result: Result<Page, ApiError>) -> Vec<Effect> {
        match result {
            Ok(page) => {
                self.locale_input = page.locale_text().to_string();
                let link = page.image_link.clone();
                self.page = Some(page);
                if link.is_empty() {
                    self.phase = AnnotatePhase::CanvasReady;
                    return vec![Effect::Notify(Notice::info("Page has no image to annotate"))];
                }
                vec![Effect::Send(Request::FetchImage(link))]
            }
            Err(e) => {
                warn!("Fetching page {} failed: {}", self.id, e);
                self.phase = AnnotatePhase::Failed("Error fetching page".to_string());
                vec![Effect::Notify(Notice::error("Error fetching page"))]
            }
        }
    }

    pub fn on_image(&mut self, result: Result<Vec<u8>, ApiError>) -> Vec<Effect> {
        let outcome = result
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                self.canvas
                    .set_backdrop_bytes(&bytes)
                    .map_err(|e| e.to_string())
            });
        match outcome {
            Ok(()) => {
                self.phase = AnnotatePhase::CanvasReady;
                Vec::new()
            }
            Err(e) => {
                warn!("Loading image for {} failed: {}", self.id, e);
                self.phase = AnnotatePhase::Failed("Error loading image".to_string());
                vec![Effect::Notify(Notice::error("Error loading image"))]
            }
        }
    }

    // ------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------

    /// Insert a default "Edit me" overlay and select it.
    pub fn add_text(&mut self) {
        if !self.can_edit() {
            return;
        }
        self.selected = Some(self.canvas.add_text(TextOverlay::default()));
        self.phase = AnnotatePhase::Editing;
    }

    pub fn clear(&mut self) {
        if !self.can_edit() {
            return;
        }
        self.canvas.clear_overlays();
        self.selected = None;
        if self.focus == EditorFocus::OverlayText {
            self.focus = EditorFocus::Canvas;
        }
    }

    /// Cycle the selection through the overlays.
    pub fn select_next(&mut self) {
        let count = self.canvas.overlays().len();
        self.selected = match (self.selected, count) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), n) => Some((i + 1) % n),
        };
    }

    /// Move the selected overlay by `(dx, dy)` steps.
    pub fn nudge(&mut self, dx: i32, dy: i32) {
        if !self.can_edit() {
            return;
        }
        let bounds = self.canvas.size();
        let step = self.nudge_step;
        if let Some(overlay) = self.selected.and_then(|i| self.canvas.overlay_mut(i)) {
            overlay.nudge(dx.saturating_mul(step), dy.saturating_mul(step), bounds);
            self.phase = AnnotatePhase::Editing;
        }
    }

    /// Start typing into the selected overlay. The first keystroke replaces
    /// the placeholder text.
    pub fn begin_text_edit(&mut self) -> bool {
        if self.selected_overlay().is_none() || !self.can_edit() {
            return false;
        }
        self.focus = EditorFocus::OverlayText;
        true
    }

    pub fn focus_locale(&mut self) {
        self.focus = EditorFocus::Locale;
    }

    pub fn end_edit(&mut self) {
        self.focus = EditorFocus::Canvas;
    }

    /// Route a typed character to whatever has focus.
    pub fn type_char(&mut self, c: char) {
        match self.focus {
            EditorFocus::Canvas => {}
            EditorFocus::OverlayText => {
                if let Some(overlay) = self.selected.and_then(|i| self.canvas.overlay_mut(i)) {
                    if overlay.text == TextOverlay::default().text {
                        overlay.text.clear();
                    }
                    overlay.text.push(c);
                    self.phase = AnnotatePhase::Editing;
                }
            }
            EditorFocus::Locale => self.locale_input.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            EditorFocus::Canvas => {}
            EditorFocus::OverlayText => {
                if let Some(overlay) = self.selected.and_then(|i| self.canvas.overlay_mut(i)) {
                    overlay.text.pop();
                }
            }
            EditorFocus::Locale => {
                self.locale_input.pop();
            }
        }
    }

    // ------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------

    /// Flatten the canvas and upload it as the page's annotated image.
    pub fn save_image(&mut self) -> Vec<Effect> {
        if self.phase == AnnotatePhase::Saving {
            return Vec::new();
        }
        if !self.can_save() {
            return vec![Effect::Notify(Notice::error("Page image is not loaded"))];
        }
        let Some(name) = self.page.as_ref().map(|p| p.name.clone()) else {
            return vec![Effect::Notify(Notice::error("Page is not loaded yet"))];
        };

        match self.canvas.rasterize() {
            Ok(png) => {
                self.phase = AnnotatePhase::Saving;
                vec![Effect::Send(Request::SaveAnnotatedImage {
                    id: self.id.clone(),
                    name,
                    png,
                })]
            }
            Err(e) => {
                warn!("Rasterizing {} failed: {}", self.id, e);
                let message = format!("Error rendering image: {}", e);
                self.phase = AnnotatePhase::Failed(message.clone());
                vec![Effect::Notify(Notice::error(message))]
            }
        }
    }

    /// Back to the catalog on success; stay put so the operator can retry otherwise.
    pub fn on_image_saved(&mut self, result: Result<(), ApiError>) -> Vec<Effect> {
        match result {
            Ok(()) => {
                info!("Annotated image saved for {}", self.id);
                self.phase = AnnotatePhase::Idle;
                vec![
                    Effect::Notify(Notice::success("Image uploaded successfully!")),
                    Effect::Navigate(Route::Catalog),
                ]
            }
            Err(e) => {
                warn!("Saving annotated image for {} failed: {}", self.id, e);
                let message = e.user_message("Error uploading image.");
                self.phase = AnnotatePhase::Failed(message.clone());
                vec![Effect::Notify(Notice::error(message))]
            }
        }
    }

    /// Validate the edited locale and send it. Invalid text is never sent.
    pub fn save_locale(&mut self) -> Vec<Effect> {
        if self.phase == AnnotatePhase::Saving {
            return Vec::new();
        }
        let locale = match LocaleTable::validate_for_upload(&self.locale_input) {
            Ok(locale) => locale,
            Err(e) => {
                return vec![Effect::Notify(Notice::error(format!("Invalid locale: {}", e)))]
            }
        };
        self.phase = AnnotatePhase::Saving;
        vec![Effect::Send(Request::SaveLocale {
            id: self.id.clone(),
            locale,
        })]
    }

    pub fn on_locale_saved(&mut self, result: Result<(), ApiError>) -> Vec<Effect> {
        match result {
            Ok(()) => {
                info!("Locale saved for {}", self.id);
                self.phase = AnnotatePhase::Idle;
                vec![
                    Effect::Notify(Notice::success("Locale saved successfully!")),
                    Effect::Navigate(Route::Catalog),
                ]
            }
            Err(e) => {
                warn!("Saving locale for {} failed: {}", self.id, e);
                let message = e.user_message("Error saving locale.");
                self.phase = AnnotatePhase::Failed(message.clone());
                vec![Effect::Notify(Notice::error(message))]
            }
        }
    }
}
