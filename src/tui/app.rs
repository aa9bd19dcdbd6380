//! Terminal front end state: the active screen, routing and key bindings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use super::toast::Toasts;
use crate::canvas::GlyphFont;
use crate::config::Settings;
use crate::routes::Route;
use crate::services::{
    AnnotateScreen, CatalogScreen, DetailScreen, Effect, EditorFocus, ModalKind, Request,
    Response,
};

/// Which part of the catalog receives keys when no dialog is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogPane {
    #[default]
    Table,
    Search,
    Tags,
}

/// The screen currently shown.
#[derive(Debug)]
pub enum Screen {
    Catalog(CatalogScreen),
    Detail(DetailScreen),
    Annotate(AnnotateScreen),
}

/// Everything the terminal UI owns.
#[derive(Debug)]
pub struct App {
    pub route: Route,
    pub screen: Screen,
    pub toasts: Toasts,
    pub catalog_pane: CatalogPane,
    pub quit: bool,
    /// Bumped on every navigation; responses from older screens are dropped.
    generation: u64,
    outbox: Vec<(u64, Request)>,
    font: Option<Arc<GlyphFont>>,
    search_debounce: Duration,
    export_dir: PathBuf,
    nudge_step: u32,
}

impl App {
    pub fn new(settings: &Settings, font: Option<Arc<GlyphFont>>) -> Self {
        let search_debounce = settings.search_debounce;
        let export_dir = settings.export_dir.clone();
        Self {
            route: Route::Catalog,
            screen: Screen::Catalog(CatalogScreen::new(search_debounce, export_dir.clone())),
            toasts: Toasts::default(),
            catalog_pane: CatalogPane::Table,
            quit: false,
            generation: 0,
            outbox: Vec::new(),
            font,
            search_debounce,
            export_dir,
            nudge_step: settings.nudge_step,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Requests queued since the last call, tagged with their generation.
    pub fn take_outbox(&mut self) -> Vec<(u64, Request)> {
        std::mem::take(&mut self.outbox)
    }

    /// Switch screens and mount the new one.
    pub fn navigate(&mut self, route: Route, now: Instant) {
        info!("Navigating to {}", route);
        self.generation += 1;
        self.catalog_pane = CatalogPane::Table;
        let (screen, effects) = match route {
            Route::Catalog => {
                let screen = CatalogScreen::new(self.search_debounce, self.export_dir.clone());
                let effects = screen.mount();
                (Screen::Catalog(screen), effects)
            }
            Route::Detail(ref id) => {
                let mut screen = DetailScreen::new(id.clone());
                let effects = screen.mount();
                (Screen::Detail(screen), effects)
            }
            Route::Annotate(ref id) => {
                let mut screen =
                    AnnotateScreen::new(id.clone(), self.font.clone(), self.nudge_step);
                let effects = screen.mount();
                (Screen::Annotate(screen), effects)
            }
        };
        self.route = route;
        self.screen = screen;
        self.apply(effects, now);
    }

    /// Carry out controller effects.
    pub fn apply(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::Send(request) => self.outbox.push((self.generation, request)),
                Effect::Notify(notice) => self.toasts.push(notice, now),
                Effect::Navigate(route) => self.navigate(route, now),
            }
        }
    }

    /// Timers: debounced search and toast expiry.
    pub fn tick(&mut self, now: Instant) {
        self.toasts.expire(now);
        if let Screen::Catalog(ref mut screen) = self.screen {
            let effects = screen.tick(now);
            self.apply(effects, now);
        }
    }

    /// Time until the next timer is due, if sooner than `cap`.
    pub fn poll_timeout(&self, now: Instant, cap: Duration) -> Duration {
        match self.screen {
            Screen::Catalog(ref screen) => screen
                .next_deadline(now)
                .map_or(cap, |d| d.min(cap)),
            _ => cap,
        }
    }

    /// Route a backend response to the screen that asked for it.
    pub fn on_response(&mut self, generation: u64, response: Response, now: Instant) {
        if generation != self.generation {
            debug!("Dropping response from generation {}", generation);
            return;
        }
        let effects = match (&mut self.screen, response) {
            (Screen::Catalog(s), Response::Tags(r)) => s.on_tags(r),
            (Screen::Catalog(s), Response::Pages(r)) => s.on_pages(r),
            (Screen::Catalog(s), Response::PageCreated(r)) => s.on_page_created(r),
            (Screen::Catalog(s), Response::TagCreated(r)) => s.on_tag_created(r),
            (Screen::Catalog(s), Response::BulkInserted(r)) => s.on_bulk_inserted(r),
            (Screen::Catalog(s), Response::PageDeleted(r)) => s.on_page_deleted(r),
            (Screen::Catalog(s), Response::Downloaded(r)) => s.on_downloaded(r),
            (Screen::Detail(s), Response::Page(r)) => s.on_page(r),
            (Screen::Annotate(s), Response::Page(r)) => s.on_page(r),
            (Screen::Annotate(s), Response::Image(r)) => s.on_image(r),
            (Screen::Annotate(s), Response::AnnotationSaved(r)) => s.on_image_saved(r),
            (Screen::Annotate(s), Response::LocaleSaved(r)) => s.on_locale_saved(r),
            _ => {
                debug!("Response does not belong to the {} screen", self.route);
                Vec::new()
            }
        };
        self.apply(effects, now);
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        let effects = match self.screen {
            Screen::Catalog(_) => self.catalog_key(key, now),
            Screen::Detail(_) => self.detail_key(key),
            Screen::Annotate(_) => self.annotate_key(key),
        };
        self.apply(effects, now);
    }

    fn catalog_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        let Screen::Catalog(ref mut screen) = self.screen else {
            return Vec::new();
        };

        if let Some(ref mut modal) = screen.modal {
            match key.code {
                KeyCode::Esc => return screen.close_modal(),
                KeyCode::Enter => return screen.submit_modal(),
                KeyCode::Tab | KeyCode::Down => modal.focus_next(),
                KeyCode::BackTab | KeyCode::Up => modal.focus_prev(),
                _ if modal.tags_focused() => match key.code {
                    KeyCode::Left => screen.tags.move_cursor(-1),
                    KeyCode::Right => screen.tags.move_cursor(1),
                    KeyCode::Char(' ') => {
                        screen.tags.toggle_current();
                    }
                    _ => {}
                },
                KeyCode::Char(c) => {
                    if let Some(field) = modal.focused_field_mut() {
                        field.value.push(c);
                    }
                }
                KeyCode::Backspace => {
                    if let Some(field) = modal.focused_field_mut() {
                        field.value.pop();
                    }
                }
                _ => {}
            }
            return Vec::new();
        }

        match self.catalog_pane {
            CatalogPane::Search => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => self.catalog_pane = CatalogPane::Table,
                    KeyCode::Backspace => screen.search_backspace(now),
                    KeyCode::Char(c) => screen.search_push(c, now),
                    _ => {}
                }
                Vec::new()
            }
            CatalogPane::Tags => match key.code {
                KeyCode::Esc | KeyCode::Tab => {
                    self.catalog_pane = CatalogPane::Table;
                    Vec::new()
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    screen.tags.move_cursor(-1);
                    Vec::new()
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    screen.tags.move_cursor(1);
                    Vec::new()
                }
                KeyCode::Char(' ') | KeyCode::Enter => screen.toggle_filter_tag(),
                _ => Vec::new(),
            },
            CatalogPane::Table => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.quit = true;
                    Vec::new()
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    screen.move_selection(-1);
                    Vec::new()
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    screen.move_selection(1);
                    Vec::new()
                }
                KeyCode::Char('/') => {
                    self.catalog_pane = CatalogPane::Search;
                    Vec::new()
                }
                KeyCode::Tab => {
                    self.catalog_pane = CatalogPane::Tags;
                    Vec::new()
                }
                KeyCode::Enter | KeyCode::Char('v') => screen.view_selected(),
                KeyCode::Char('e') => screen.edit_selected(),
                KeyCode::Char('d') | KeyCode::Delete => screen.delete_selected(),
                KeyCode::Char('r') => screen.mount(),
                KeyCode::Char('n') => {
                    screen.open_modal(ModalKind::CreatePage);
                    Vec::new()
                }
                KeyCode::Char('t') => {
                    screen.open_modal(ModalKind::CreateTag);
                    Vec::new()
                }
                KeyCode::Char('b') => {
                    screen.open_modal(ModalKind::BulkUpload);
                    Vec::new()
                }
                KeyCode::Char('x') => {
                    screen.open_modal(ModalKind::Download);
                    Vec::new()
                }
                _ => Vec::new(),
            },
        }
    }

    fn detail_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let Screen::Detail(ref mut screen) = self.screen else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
                vec![Effect::Navigate(Route::Catalog)]
            }
            KeyCode::Char('i') => {
                screen.toggle_image();
                Vec::new()
            }
            KeyCode::Char('l') => {
                screen.toggle_locale();
                Vec::new()
            }
            KeyCode::Char('e') => vec![Effect::Navigate(Route::Annotate(screen.id.clone()))],
            KeyCode::Char('r') => screen.mount(),
            _ => Vec::new(),
        }
    }

    fn annotate_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let Screen::Annotate(ref mut screen) = self.screen else {
            return Vec::new();
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match screen.focus {
            EditorFocus::OverlayText => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => screen.end_edit(),
                    KeyCode::Backspace => screen.backspace(),
                    KeyCode::Char(c) => screen.type_char(c),
                    _ => {}
                }
                Vec::new()
            }
            EditorFocus::Locale => match key.code {
                KeyCode::Char('s') if ctrl => screen.save_locale(),
                KeyCode::Esc => {
                    screen.end_edit();
                    Vec::new()
                }
                KeyCode::Enter => {
                    screen.type_char('\n');
                    Vec::new()
                }
                KeyCode::Backspace => {
                    screen.backspace();
                    Vec::new()
                }
                KeyCode::Char(c) => {
                    screen.type_char(c);
                    Vec::new()
                }
                _ => Vec::new(),
            },
            EditorFocus::Canvas => {
                let step = if key.modifiers.contains(KeyModifiers::SHIFT) { 5 } else { 1 };
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => {
                        return vec![Effect::Navigate(Route::Catalog)];
                    }
                    KeyCode::Char('a') => screen.add_text(),
                    KeyCode::Char('c') => screen.clear(),
                    KeyCode::Tab => screen.select_next(),
                    KeyCode::Enter => {
                        screen.begin_text_edit();
                    }
                    KeyCode::Left => screen.nudge(-step, 0),
                    KeyCode::Right => screen.nudge(step, 0),
                    KeyCode::Up => screen.nudge(0, -step),
                    KeyCode::Down => screen.nudge(0, step),
                    KeyCode::Char('s') => return screen.save_image(),
                    KeyCode::Char('L') => screen.focus_locale(),
                    KeyCode::Char('S') => return screen.save_locale(),
                    KeyCode::Char('v') => screen.toggle_locale(),
                    _ => {}
                }
                Vec::new()
            }
        }
    }
}
