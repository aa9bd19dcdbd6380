//! Read-only page view.

use tracing::warn;

use super::{Effect, Notice, Request};
use crate::api::ApiError;
use crate::models::{LocaleTable, Page};

/// Which image the detail view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageView<'a> {
    Original(&'a str),
    Annotated(&'a str),
    /// Annotated requested but none saved yet.
    Missing,
}

/// How the locale section renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleView<'a> {
    /// Stored text, verbatim.
    Raw(&'a str),
    Table(LocaleTable),
    /// Stored text does not parse; shown instead of the table.
    Invalid(String),
}

impl<'a> LocaleView<'a> {
    pub fn of(page: &'a Page, raw: bool) -> Self {
        if raw {
            return LocaleView::Raw(page.locale_text());
        }
        match page.locale_table() {
            Ok(table) => LocaleView::Table(table),
            Err(e) => LocaleView::Invalid(e.to_string()),
        }
    }
}

/// State of the detail screen.
#[derive(Debug)]
pub struct DetailScreen {
    pub id: String,
    pub page: Option<Page>,
    pub show_annotated: bool,
    pub show_raw_locale: bool,
    pub loading: bool,
}

impl DetailScreen {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            page: None,
            show_annotated: false,
            show_raw_locale: false,
            loading: false,
        }
    }

    pub fn mount(&mut self) -> Vec<Effect> {
        self.loading = true;
        vec![Effect::Send(Request::GetPage(self.id.clone()))]
    }

    pub fn on_page(&mut self, result: Result<Page, ApiError>) -> Vec<Effect> {
        self.loading = false;
        match result {
            Ok(page) => {
                self.page = Some(page);
                Vec::new()
            }
            Err(e) => {
                warn!("Fetching page {} failed: {}", self.id, e);
                vec![Effect::Notify(Notice::error("Error fetching page"))]
            }
        }
    }

    pub fn toggle_image(&mut self) {
        self.show_annotated = !self.show_annotated;
    }

    pub fn toggle_locale(&mut self) {
        self.show_raw_locale = !self.show_raw_locale;
    }

    pub fn image_view(&self) -> Option<ImageView<'_>> {
        let page = self.page.as_ref()?;
        Some(if self.show_annotated {
            page.annotated_image()
                .map(ImageView::Annotated)
                .unwrap_or(ImageView::Missing)
        } else {
            ImageView::Original(&page.image_link)
        })
    }

    pub fn locale_view(&self) -> Option<LocaleView<'_>> {
        self.page
            .as_ref()
            .map(|page| LocaleView::of(page, self.show_raw_locale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notices;

    const GREETING: &str =
        r#"[{"name":"greeting","values":{"id":"halo","en":"hello","vn":"chào"}}]"#;

    fn loaded(locale: &str, annotated: Option<&str>) -> DetailScreen {
        let mut screen = DetailScreen::new("p1");
        let page: Page = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Welcome",
            "image_link": "http://img/p1.png",
            "annotated_image_link": annotated,
            "locale": locale,
        }))
        .unwrap();
        let _ = screen.on_page(Ok(page));
        screen
    }

    #[test]
    fn test_mount_requests_page() {
        let mut screen = DetailScreen::new("p1");
        let effects = screen.mount();
        assert!(screen.loading);
        assert!(matches!(
            effects.as_slice(),
            [Effect::Send(Request::GetPage(id))] if id == "p1"
        ));
    }

    #[test]
    fn test_locale_toggle_table_then_raw() {
        let mut screen = loaded(GREETING, None);

        match screen.locale_view().unwrap() {
            LocaleView::Table(table) => {
                let rows: Vec<_> = table.rows().map(|r| r.map(str::to_string)).collect();
                assert_eq!(
                    rows,
                    vec![["greeting", "halo", "hello", "chào"].map(str::to_string)]
                );
            }
            other => panic!("expected table, got {:?}", other),
        }

        screen.toggle_locale();
        assert_eq!(screen.locale_view(), Some(LocaleView::Raw(GREETING)));
    }

    #[test]
    fn test_invalid_locale_is_display_error() {
        let screen = loaded("[{broken", None);
        assert!(matches!(
            screen.locale_view(),
            Some(LocaleView::Invalid(_))
        ));
    }

    #[test]
    fn test_image_toggle_with_missing_annotation() {
        let mut screen = loaded("[]", None);
        assert_eq!(
            screen.image_view(),
            Some(ImageView::Original("http://img/p1.png"))
        );
        screen.toggle_image();
        assert_eq!(screen.image_view(), Some(ImageView::Missing));
    }

    #[test]
    fn test_image_toggle_with_annotation() {
        let mut screen = loaded("[]", Some("http://img/p1-a.png"));
        screen.toggle_image();
        assert_eq!(
            screen.image_view(),
            Some(ImageView::Annotated("http://img/p1-a.png"))
        );
    }

    #[test]
    fn test_fetch_failure_notifies() {
        let mut screen = DetailScreen::new("gone");
        let effects = screen.on_page(Err(ApiError::Status(404)));
        assert_eq!(notices(&effects)[0].message, "Error fetching page");
        assert!(screen.image_view().is_none());
    }
}
