//! In-process fake of the page backend, served on a random local port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};

use pagedesk::ApiClient;

/// One multipart request as the backend received it.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub fields: HashMap<String, Vec<u8>>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl Upload {
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct Backend {
    pub tags: Vec<String>,
    pub pages: Vec<Value>,
    pub next_id: u64,
    pub uploads: Vec<(String, Upload)>,
    pub queries: Vec<HashMap<String, String>>,
    pub download_tags: Vec<String>,
    /// When set, bulk insert answers `success: false` with this reason.
    pub reject_bulk: Option<String>,
    /// When set, the tag list answers only after this long.
    pub tag_delay: Option<Duration>,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct FakeBackend {
    pub state: Shared,
    pub base_url: String,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend {
            next_id: 1,
            ..Default::default()
        }));

        let api = Router::new()
            .route("/tag", get(list_tags).post(create_tag))
            .route("/page", get(list_pages).post(create_page))
            .route("/page/bulk-insert", post(bulk_insert))
            .route("/page/save-annotated-image", post(save_annotated))
            .route("/page/:id", get(get_page).delete(delete_page))
            .route("/page/:id/locale", put(save_locale))
            .route("/download", post(download));
        let app = Router::new()
            .nest("/api/v1", api)
            .route("/images/:name", get(serve_image))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake backend");
        });

        Self {
            state,
            base_url: format!("http://{}/api/v1", addr),
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::with_base_url(&self.base_url).expect("client")
    }

    /// Insert a page directly, returning its id as text.
    pub fn seed_page(&self, name: &str, tags: &[&str], locale: &str) -> String {
        let mut backend = self.state.lock().unwrap();
        let id = backend.next_id;
        backend.next_id += 1;
        backend.pages.push(json!({
            "id": id,
            "name": name,
            "tags": tags,
            "image_link": "/images/source.png",
            "annotated_image_link": null,
            "locale": locale,
        }));
        id.to_string()
    }

    pub fn uploads(&self, endpoint: &str) -> Vec<Upload> {
        self.state
            .lock()
            .unwrap()
            .uploads
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, u)| u.clone())
            .collect()
    }
}

/// A small solid PNG used as every page's source image.
pub fn source_png() -> Vec<u8> {
    let image = RgbaImage::from_pixel(80, 60, Rgba([20, 120, 220, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn ack() -> Json<Value> {
    Json(json!({ "success": true }))
}

fn rejected(reason: &str) -> Json<Value> {
    Json(json!({ "success": false, "error": reason }))
}

fn id_of(page: &Value) -> String {
    match &page["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn read_form(mut multipart: Multipart) -> Upload {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            upload.file_name = field.file_name().map(str::to_string);
            upload.content_type = field.content_type().map(str::to_string);
        }
        let bytes = field.bytes().await.expect("field bytes");
        upload.fields.insert(name, bytes.to_vec());
    }
    upload
}

async fn list_tags(State(state): State<Shared>) -> Json<Value> {
    let delay = state.lock().unwrap().tag_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let backend = state.lock().unwrap();
    let tags: Vec<Value> = backend.tags.iter().map(|t| json!({ "name": t })).collect();
    ok(Value::Array(tags))
}

async fn create_tag(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut backend = state.lock().unwrap();
    if backend.tags.contains(&name) {
        return rejected("Tag already exists");
    }
    backend.tags.push(name);
    ack()
}

/// Empty results come back as `data: null`, as the real backend does.
async fn list_pages(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut backend = state.lock().unwrap();
    backend.queries.push(params.clone());

    let wanted: Vec<&str> = params
        .get("tags")
        .map(|t| t.split(',').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let name = params.get("name").map(String::as_str).unwrap_or("");

    let pages: Vec<Value> = backend
        .pages
        .iter()
        .filter(|p| {
            let tags: Vec<&str> = p["tags"]
                .as_array()
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            wanted.iter().all(|t| tags.contains(t))
                && p["name"].as_str().unwrap_or("").contains(name)
        })
        .cloned()
        .collect();

    if pages.is_empty() {
        Json(json!({ "success": true, "data": null }))
    } else {
        ok(Value::Array(pages))
    }
}

async fn get_page(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    if id == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    let backend = state.lock().unwrap();
    match backend.pages.iter().find(|p| id_of(p) == id) {
        Some(page) => ok(page.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, rejected("Page not found")).into_response(),
    }
}

async fn create_page(State(state): State<Shared>, multipart: Multipart) -> Json<Value> {
    let upload = read_form(multipart).await;
    let mut backend = state.lock().unwrap();
    let id = backend.next_id;
    backend.next_id += 1;
    let tags: Vec<String> = upload
        .text("tags")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    backend.pages.push(json!({
        "id": id,
        "name": upload.text("pagename"),
        "tags": tags,
        "image_link": "/images/source.png",
        "locale": upload.text("locale"),
    }));
    backend.uploads.push(("page".to_string(), upload));
    ack()
}

async fn bulk_insert(State(state): State<Shared>, multipart: Multipart) -> Json<Value> {
    let upload = read_form(multipart).await;
    let mut backend = state.lock().unwrap();
    backend.uploads.push(("bulk".to_string(), upload));
    match backend.reject_bulk.clone() {
        Some(reason) => rejected(&reason),
        None => ack(),
    }
}

async fn save_annotated(State(state): State<Shared>, multipart: Multipart) -> Json<Value> {
    let upload = read_form(multipart).await;
    let mut backend = state.lock().unwrap();
    let id = upload.text("id");
    if let Some(page) = backend.pages.iter_mut().find(|p| id_of(p) == id) {
        page["annotated_image_link"] = json!(format!("/images/{}-annotated.png", id));
    }
    backend.uploads.push(("annotated".to_string(), upload));
    ack()
}

async fn save_locale(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut backend = state.lock().unwrap();
    match backend.pages.iter_mut().find(|p| id_of(p) == id) {
        Some(page) => {
            page["locale"] = body["locale"].clone();
            ack()
        }
        None => rejected("Page not found"),
    }
}

async fn delete_page(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    let mut backend = state.lock().unwrap();
    let before = backend.pages.len();
    backend.pages.retain(|p| id_of(p) != id);
    if backend.pages.len() == before {
        rejected("Page not found")
    } else {
        ack()
    }
}

/// Flatten the locale entries of matching pages, in page order.
async fn download(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut backend = state.lock().unwrap();
    let wanted: Vec<String> = body["tags"]
        .as_str()
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    backend.download_tags = wanted.clone();

    let mut entries = Vec::new();
    for page in &backend.pages {
        let tags: Vec<&str> = page["tags"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if !wanted.iter().all(|t| tags.contains(&t.as_str())) {
            continue;
        }
        let locale = page["locale"].as_str().unwrap_or("[]");
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(locale) {
            entries.extend(items);
        }
    }
    ok(Value::Array(entries))
}

async fn serve_image(Path(name): Path<String>) -> Response {
    if name == "source.png" {
        ([("content-type", "image/png")], source_png()).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
