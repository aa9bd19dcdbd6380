//! Screen controllers driven end to end against the fake backend.

mod common;

use std::time::Duration;

use common::FakeBackend;
use pagedesk::api::ApiClient;
use pagedesk::canvas::{CANVAS_HEIGHT, CANVAS_WIDTH};
use pagedesk::routes::Route;
use pagedesk::services::catalog::ModalKind;
use pagedesk::services::{
    self, notices, requests, AnnotatePhase, AnnotateScreen, CatalogScreen, DetailScreen, Effect,
    LocaleView, NoticeLevel, Response,
};

const GREETING: &str = r#"[{"name":"greeting","values":{"id":"halo","en":"hello","vn":"chào"}}]"#;

/// Run every request in `effects`, in order.
async fn run(api: &ApiClient, effects: &[Effect]) -> Vec<Response> {
    let mut responses = Vec::new();
    for request in requests(effects) {
        responses.push(services::execute(api, request.clone()).await);
    }
    responses
}

async fn single(api: &ApiClient, effects: &[Effect]) -> Response {
    let mut responses = run(api, effects).await;
    assert_eq!(responses.len(), 1, "expected exactly one request");
    responses.remove(0)
}

#[tokio::test]
async fn rejected_bulk_upload_shows_reason_and_closes() {
    let backend = FakeBackend::start().await;
    backend.state.lock().unwrap().reject_bulk = Some("invalid format".into());
    let api = backend.client();

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"[]").unwrap();

    let mut screen = CatalogScreen::new(Duration::from_millis(300), std::env::temp_dir());
    screen.open_modal(ModalKind::BulkUpload);
    if let Some(ref mut modal) = screen.modal {
        modal.set_value("File", &file.path().display().to_string());
    }

    let effects = screen.submit_modal();
    let Response::BulkInserted(result) = single(&api, &effects).await else {
        panic!("expected bulk insert response");
    };
    let effects = screen.on_bulk_inserted(result);

    let shown = notices(&effects);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].level, NoticeLevel::Error);
    assert_eq!(shown[0].message, "invalid format");
    assert!(screen.modal.is_none());
    assert_eq!(backend.uploads("bulk").len(), 1);
}

#[tokio::test]
async fn download_writes_three_sorted_bundles() {
    let backend = FakeBackend::start().await;
    backend.seed_page(
        "Home",
        &["web"],
        r#"[{"name":"title","values":{"id":"Judul","en":"Title","vn":"Tiêu đề"}},
            {"name":"greeting","values":{"id":"halo","en":"hi","vn":"chào"}}]"#,
    );
    backend.seed_page("About", &["web"], GREETING);
    backend.seed_page("Other", &["print"], GREETING);
    let api = backend.client();
    let out = tempfile::tempdir().unwrap();

    let mut screen = CatalogScreen::new(Duration::from_millis(300), out.path().to_path_buf());
    let Response::Tags(tags) = single(&api, &[Effect::Send(services::Request::ListTags)]).await
    else {
        panic!("expected tags");
    };
    let _ = screen.on_tags(tags);
    screen.open_modal(ModalKind::Download);

    let effects = screen.submit_modal();
    let Response::Downloaded(result) = single(&api, &effects).await else {
        panic!("expected download response");
    };
    let effects = screen.on_downloaded(result);
    assert_eq!(notices(&effects)[0].level, NoticeLevel::Success);
    assert!(screen.modal.is_none());

    let en = std::fs::read_to_string(out.path().join("en.json")).unwrap();
    // Last occurrence wins; keys ascend.
    assert_eq!(
        en,
        "{\n  \"greeting\": \"hello\",\n  \"title\": \"Title\"\n}"
    );
    let vn: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("vn.json")).unwrap())
            .unwrap();
    assert_eq!(vn["title"], "Tiêu đề");
    assert!(out.path().join("id.json").is_file());
}

#[tokio::test]
async fn created_tag_refreshes_tags_and_pages() {
    let backend = FakeBackend::start().await;
    let api = backend.client();
    let mut screen = CatalogScreen::new(Duration::from_millis(300), std::env::temp_dir());

    screen.open_modal(ModalKind::CreateTag);
    if let Some(ref mut modal) = screen.modal {
        modal.set_value("Tag Name", "fresh");
    }
    let effects = screen.submit_modal();
    let Response::TagCreated(result) = single(&api, &effects).await else {
        panic!("expected tag response");
    };
    let effects = screen.on_tag_created(result);
    assert!(screen.modal.is_none());

    for response in run(&api, &effects).await {
        match response {
            Response::Tags(r) => {
                let _ = screen.on_tags(r);
            }
            Response::Pages(r) => {
                let _ = screen.on_pages(r);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }
    assert_eq!(screen.tags.available(), ["fresh".to_string()]);
}

#[tokio::test]
async fn detail_shows_greeting_table_and_raw_text() {
    let backend = FakeBackend::start().await;
    let id = backend.seed_page("Welcome", &[], GREETING);
    let api = backend.client();

    let mut screen = DetailScreen::new(id);
    let effects = screen.mount();
    let Response::Page(result) = single(&api, &effects).await else {
        panic!("expected page");
    };
    let _ = screen.on_page(result);

    match screen.locale_view() {
        Some(LocaleView::Table(table)) => {
            let rows: Vec<[&str; 4]> = table.rows().collect();
            assert_eq!(rows, vec![["greeting", "halo", "hello", "chào"]]);
        }
        other => panic!("expected a table, got {:?}", other),
    }
    screen.toggle_locale();
    assert_eq!(screen.locale_view(), Some(LocaleView::Raw(GREETING)));
}

#[tokio::test]
async fn annotation_round_trip_uploads_png() {
    let backend = FakeBackend::start().await;
    let id = backend.seed_page("Welcome", &[], GREETING);
    let api = backend.client();

    let mut screen = AnnotateScreen::new(id.clone(), None, 10);
    let effects = screen.mount();
    let Response::Page(page) = single(&api, &effects).await else {
        panic!("expected page");
    };
    let effects = screen.on_page(page);
    let Response::Image(bytes) = single(&api, &effects).await else {
        panic!("expected image");
    };
    let _ = screen.on_image(bytes);
    assert_eq!(screen.phase, AnnotatePhase::CanvasReady);

    screen.add_text();
    screen.nudge(2, 3);
    let effects = screen.save_image();
    let Response::AnnotationSaved(result) = single(&api, &effects).await else {
        panic!("expected save response");
    };
    let effects = screen.on_image_saved(result);
    assert_eq!(notices(&effects)[0].message, "Image uploaded successfully!");
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::Navigate(Route::Catalog))));

    let uploads = backend.uploads("annotated");
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.text("id"), id);
    assert_eq!(upload.text("pagename"), "Welcome");
    assert_eq!(upload.content_type.as_deref(), Some("image/png"));

    let png = image::load_from_memory(&upload.fields["file"]).unwrap();
    assert_eq!((png.width(), png.height()), (CANVAS_WIDTH, CANVAS_HEIGHT));

    let page = api.get_page(&id).await.unwrap();
    assert!(page.annotated_image().is_some());
}

#[tokio::test]
async fn edited_locale_is_saved() {
    let backend = FakeBackend::start().await;
    let id = backend.seed_page("Welcome", &[], "[]");
    let api = backend.client();

    let mut screen = AnnotateScreen::new(id.clone(), None, 10);
    let effects = screen.mount();
    let Response::Page(page) = single(&api, &effects).await else {
        panic!("expected page");
    };
    let _ = screen.on_page(page);

    screen.locale_input = GREETING.to_string();
    let effects = screen.save_locale();
    let Response::LocaleSaved(result) = single(&api, &effects).await else {
        panic!("expected locale response");
    };
    let effects = screen.on_locale_saved(result);
    assert_eq!(notices(&effects)[0].message, "Locale saved successfully!");

    assert_eq!(api.get_page(&id).await.unwrap().locale_text(), GREETING);
}
