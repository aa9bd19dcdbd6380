//! HTTP client for the page backend.

use std::path::Path;
use std::time::Instant;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::envelope::{ApiError, Envelope};
use crate::config::Settings;
use crate::models::{LocaleEntry, NewPage, Page, Tag};

/// Filters for the page listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub tags: Vec<String>,
    pub name: String,
}

impl PageQuery {
    /// Query string pairs; empty filters are omitted.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.tags.is_empty() {
            params.push(("tags", self.tags.join(",")));
        }
        if !self.name.is_empty() {
            params.push(("name", self.name.clone()));
        }
        params
    }
}

/// Typed client over the `/api/v1` surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from settings.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let mut builder = Client::builder()
            .user_agent(&settings.user_agent)
            .gzip(true)
            .brotli(true);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client with default settings against `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(&Settings::default().with_api_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/page/<id>[/<rest>...]` with the id escaped as a single path segment.
    pub fn page_url(&self, id: &str, rest: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Url(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(format!("{}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push("page")
            .push(id)
            .extend(rest);
        Ok(url)
    }

    /// List every tag.
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let req = self.client.get(self.url("/tag"));
        send_envelope::<Vec<Tag>>(req, "GET /tag")
            .await?
            .into_data_or_default()
    }

    /// List pages matching the tag and name filters.
    pub async fn list_pages(&self, query: &PageQuery) -> Result<Vec<Page>, ApiError> {
        let req = self.client.get(self.url("/page")).query(&query.params());
        send_envelope::<Vec<Page>>(req, "GET /page")
            .await?
            .into_data_or_default()
    }

    /// Fetch one page by id.
    pub async fn get_page(&self, id: &str) -> Result<Page, ApiError> {
        let req = self.client.get(self.page_url(id, &[])?);
        send_envelope::<Page>(req, "GET /page/:id").await?.into_data()
    }

    /// Create a tag.
    pub async fn create_tag(&self, name: &str) -> Result<(), ApiError> {
        let req = self
            .client
            .post(self.url("/tag"))
            .json(&json!({ "name": name }));
        send_envelope::<Value>(req, "POST /tag").await?.into_ack()?;
        info!("Created tag {}", name);
        Ok(())
    }

    /// Create a page from an image file, tags and locale text.
    pub async fn create_page(&self, page: &NewPage) -> Result<(), ApiError> {
        let file = file_part(&page.image).await?;
        let form = Form::new()
            .part("file", file)
            .text("pagename", page.name.clone())
            .text("tags", page.tags_csv())
            .text("locale", page.locale.clone());

        let req = self.client.post(self.url("/page")).multipart(form);
        send_envelope::<Value>(req, "POST /page").await?.into_ack()?;
        info!("Created page {}", page.name);
        Ok(())
    }

    /// Upload a bulk-insert file as-is.
    pub async fn bulk_insert(&self, path: &Path) -> Result<(), ApiError> {
        let form = Form::new().part("file", file_part(path).await?);
        let req = self.client.post(self.url("/page/bulk-insert")).multipart(form);
        send_envelope::<Value>(req, "POST /page/bulk-insert")
            .await?
            .into_ack()?;
        info!("Bulk insert of {} accepted", path.display());
        Ok(())
    }

    /// Upload a rendered annotation for a page.
    pub async fn save_annotated_image(
        &self,
        id: &str,
        page_name: &str,
        png: Vec<u8>,
    ) -> Result<(), ApiError> {
        let part = Part::bytes(png)
            .file_name(format!("{}-annotated.png", id))
            .mime_str("image/png")?;
        let form = Form::new()
            .part("file", part)
            .text("pagename", page_name.to_string())
            .text("id", id.to_string());

        let req = self
            .client
            .post(self.url("/page/save-annotated-image"))
            .multipart(form);
        send_envelope::<Value>(req, "POST /page/save-annotated-image")
            .await?
            .into_ack()?;
        info!("Saved annotated image for page {}", id);
        Ok(())
    }

    /// Replace a page's locale text.
    pub async fn save_locale(&self, id: &str, locale: &str) -> Result<(), ApiError> {
        let req = self
            .client
            .put(self.page_url(id, &["locale"])?)
            .json(&json!({ "locale": locale }));
        send_envelope::<Value>(req, "PUT /page/:id/locale")
            .await?
            .into_ack()?;
        info!("Saved locale for page {}", id);
        Ok(())
    }

    /// Delete a page.
    pub async fn delete_page(&self, id: &str) -> Result<(), ApiError> {
        let req = self.client.delete(self.page_url(id, &[])?);
        send_envelope::<Value>(req, "DELETE /page/:id")
            .await?
            .into_ack()?;
        info!("Deleted page {}", id);
        Ok(())
    }

    /// Locale entries of every page carrying the given tags.
    pub async fn download_locales(&self, tags: &[String]) -> Result<Vec<LocaleEntry>, ApiError> {
        let req = self
            .client
            .post(self.url("/download"))
            .json(&json!({ "tags": tags.join(",") }));
        send_envelope::<Vec<LocaleEntry>>(req, "POST /download")
            .await?
            .into_data_or_default()
    }

    /// Fetch raw image bytes. Relative links resolve against the backend URL.
    pub async fn fetch_image(&self, link: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.resolve_link(link)?;
        let start = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            debug!("GET {} -> {}", url, status.as_u16());
            return Err(ApiError::Status(status.as_u16()));
        }
        let bytes = resp.bytes().await?;
        debug!(
            "GET {} -> {} ({} bytes, {} ms)",
            url,
            status.as_u16(),
            bytes.len(),
            start.elapsed().as_millis()
        );
        Ok(bytes.to_vec())
    }

    /// Resolve an image link that may be absolute or relative to the backend.
    pub fn resolve_link(&self, link: &str) -> Result<Url, ApiError> {
        if let Ok(url) = Url::parse(link) {
            return Ok(url);
        }
        let base = Url::parse(&format!("{}/", self.base_url))
            .map_err(|e| ApiError::Url(format!("{}: {}", self.base_url, e)))?;
        base.join(link)
            .map_err(|e| ApiError::Url(format!("{}: {}", link, e)))
    }
}

/// Read a file into a multipart part named after the file.
async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}

/// Send the request and decode the envelope, falling back to the HTTP status
/// when the body is not one.
async fn send_envelope<T: DeserializeOwned>(
    req: RequestBuilder,
    label: &str,
) -> Result<Envelope<T>, ApiError> {
    let start = Instant::now();
    let resp = req.send().await?;
    let status = resp.status();
    let body = resp.bytes().await?;
    debug!(
        "{} -> {} ({} bytes, {} ms)",
        label,
        status.as_u16(),
        body.len(),
        start.elapsed().as_millis()
    );

    match serde_json::from_slice::<Envelope<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(ApiError::Status(status.as_u16())),
        Err(e) => Err(ApiError::Decode(e)),
    }
}
