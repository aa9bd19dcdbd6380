//! Batch subcommands: one backend action each, results on stdout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use pagedesk::api::PageQuery;
use pagedesk::canvas::{load_font, RasterCanvas, Surface, TextOverlay};
use pagedesk::colors::tag_color;
use pagedesk::export::LocaleBundle;
use pagedesk::{ApiClient, LocaleTable, NewPage, Settings};

/// Locale argument: literal JSON, or `@path` to read it from a file.
fn read_locale_arg(arg: &str) -> Result<String> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read locale file {}", path))?,
        None => arg.to_string(),
    };
    LocaleTable::validate_for_upload(&text).context("invalid locale")
}

pub async fn list_tags(api: &ApiClient) -> Result<()> {
    let tags = api.list_tags().await.context("Error fetching tags")?;
    for tag in tags {
        println!("{}\t{:?}", tag.name, tag_color(&tag.name));
    }
    Ok(())
}

pub async fn create_tag(api: &ApiClient, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("tag name is required");
    }
    api.create_tag(name.trim())
        .await
        .context("Error creating tag.")?;
    println!("Tag created successfully!");
    Ok(())
}

pub async fn list_pages(api: &ApiClient, tags: Vec<String>, name: String) -> Result<()> {
    let query = PageQuery { tags, name };
    let pages = api
        .list_pages(&query)
        .await
        .context("Error fetching pages")?;
    for page in pages {
        let annotated = if page.annotated_image().is_some() { "annotated" } else { "-" };
        println!(
            "{}\t{}\t{}\t{}",
            page.id,
            page.name,
            page.tags.join(","),
            annotated
        );
    }
    Ok(())
}

pub async fn show_page(api: &ApiClient, id: &str, raw: bool) -> Result<()> {
    let page = api.get_page(id).await.context("Error fetching page")?;
    println!("id:        {}", page.id);
    println!("name:      {}", page.name);
    println!("tags:      {}", page.tags.join(", "));
    println!("image:     {}", page.image_link);
    println!(
        "annotated: {}",
        page.annotated_image().unwrap_or("(none)")
    );
    println!();

    if raw {
        println!("{}", page.locale_text());
        return Ok(());
    }
    match page.locale_table() {
        Ok(table) => {
            println!("name\tid\ten\tvn");
            for row in table.rows() {
                println!("{}", row.join("\t"));
            }
        }
        Err(e) => println!("invalid locale: {}", e),
    }
    Ok(())
}

pub async fn create_page(
    api: &ApiClient,
    name: String,
    image: PathBuf,
    locale: &str,
    tags: Vec<String>,
) -> Result<()> {
    if !image.is_file() {
        bail!("image {} does not exist", image.display());
    }
    let page = NewPage {
        name,
        tags,
        image,
        locale: read_locale_arg(locale)?,
    };
    api.create_page(&page)
        .await
        .context("Error uploading image.")?;
    println!("Page created successfully!");
    Ok(())
}

pub async fn delete_page(api: &ApiClient, id: &str) -> Result<()> {
    api.delete_page(id).await.context("Error deleting page.")?;
    println!("Page is deleted successfully!");
    Ok(())
}

pub async fn set_locale(api: &ApiClient, id: &str, locale: &str) -> Result<()> {
    let locale = read_locale_arg(locale)?;
    api.save_locale(id, &locale)
        .await
        .context("Error saving locale.")?;
    println!("Locale saved successfully!");
    Ok(())
}

pub async fn bulk_insert(api: &ApiClient, file: &Path) -> Result<()> {
    api.bulk_insert(file)
        .await
        .context("Error doing bulk upload")?;
    println!("Bulk upload is done successfully!");
    Ok(())
}

pub async fn export(api: &ApiClient, tags: &[String], dir: &Path) -> Result<()> {
    let entries = api
        .download_locales(tags)
        .await
        .context("Error downloading locale files.")?;
    let bundle = LocaleBundle::from_entries(&entries);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let paths = bundle
        .write_to(dir)
        .with_context(|| format!("failed to write locale files to {}", dir.display()))?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

/// Editor workflow without the terminal UI.
pub async fn annotate(
    api: &ApiClient,
    settings: &Settings,
    id: &str,
    texts: &[String],
    output: Option<&Path>,
    upload: bool,
) -> Result<()> {
    let overlays = texts
        .iter()
        .map(|t| {
            TextOverlay::parse_placement(t)
                .with_context(|| format!("expected label@x,y, got {:?}", t))
        })
        .collect::<Result<Vec<_>>>()?;

    let page = api.get_page(id).await.context("Error fetching page")?;
    if page.image_link.is_empty() {
        bail!("page {} has no image", id);
    }
    let bytes = api
        .fetch_image(&page.image_link)
        .await
        .context("Error loading image")?;

    let mut canvas = match load_font(settings) {
        Some(font) => RasterCanvas::default().with_font(font),
        None => RasterCanvas::default(),
    };
    canvas
        .set_backdrop_bytes(&bytes)
        .context("failed to decode page image")?;
    for overlay in overlays {
        canvas.add_text(overlay);
    }
    let png = canvas.rasterize().context("failed to render annotation")?;

    if let Some(path) = output {
        std::fs::write(path, &png)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {} ({} bytes)", path.display(), png.len());
    }

    if upload {
        api.save_annotated_image(id, &page.name, png)
            .await
            .context("Error uploading image.")?;
        println!("Image uploaded successfully!");
    } else if output.is_none() {
        warn!("Nothing to do: --no-upload without --output");
    }
    Ok(())
}
