mod commands;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pagedesk::config::{load_settings, Settings};
use pagedesk::routes::Route;
use pagedesk::{tui, ApiClient};

#[derive(Parser)]
#[command(
    name = "pagedesk",
    version,
    about = "Operator console for localized, annotated pages"
)]
struct Cli {
    /// Backend base URL, e.g. http://localhost:3000/api/v1
    #[arg(long, global = true, env = "PAGEDESK_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the terminal UI (default)
    Tui {
        /// Start at a route: `/`, `/<id>` or `/<id>/edit`
        #[arg(long)]
        open: Option<String>,
    },
    /// Manage tags
    #[command(subcommand)]
    Tags(TagsCommand),
    /// Manage pages
    #[command(subcommand)]
    Pages(PagesCommand),
    /// Upload a bulk-insert file
    BulkInsert {
        /// JSON file accepted by the backend's bulk insert
        file: PathBuf,
    },
    /// Download locale bundles as en.json, id.json and vn.json
    Export {
        /// Only pages carrying these tags (comma separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Output directory (defaults to the configured export_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TagsCommand {
    /// List every tag with its label color
    List,
    /// Create a tag
    Create { name: String },
}

#[derive(Subcommand)]
enum PagesCommand {
    /// List pages
    List {
        /// Filter by tags (comma separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Filter by name
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Show one page
    Show {
        id: String,
        /// Print the stored locale text instead of a table
        #[arg(long)]
        raw: bool,
    },
    /// Create a page from an image file
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: PathBuf,
        /// Locale JSON, or @FILE to read it from a file
        #[arg(long, default_value = "[]")]
        locale: String,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Delete a page
    Delete { id: String },
    /// Replace a page's locale text
    SetLocale {
        id: String,
        /// Locale JSON, or @FILE to read it from a file
        locale: String,
    },
    /// Render text onto a page's image and save it as the annotated image
    Annotate {
        id: String,
        /// Text placement as label@x,y (repeatable; \n breaks lines)
        #[arg(long = "text", required = true)]
        texts: Vec<String>,
        /// Also write the PNG here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Render only; do not upload
        #[arg(long)]
        no_upload: bool,
    },
}

/// Log to stderr, or to a file while the terminal UI owns the screen.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn run_tui(settings: Settings, open: Option<String>) -> Result<()> {
    settings
        .ensure_directories()
        .context("failed to create data directory")?;
    init_logging(Some(&settings.log_file))?;

    let api = ApiClient::new(&settings).context("failed to build HTTP client")?;
    let start = open.map(|p| Route::parse(&p)).unwrap_or_default();
    tokio::task::spawn_blocking(move || tui::run(&settings, api, start))
        .await
        .context("terminal UI task failed")?
        .context("terminal UI error")?;
    Ok(())
}

async fn run_command(command: Command, settings: Settings) -> Result<()> {
    init_logging(None)?;
    let api = ApiClient::new(&settings).context("failed to build HTTP client")?;

    match command {
        Command::Tui { .. } => anyhow::bail!("the terminal UI is not a batch command"),
        Command::Tags(TagsCommand::List) => commands::list_tags(&api).await,
        Command::Tags(TagsCommand::Create { name }) => commands::create_tag(&api, &name).await,
        Command::Pages(PagesCommand::List { tags, name }) => {
            commands::list_pages(&api, tags, name).await
        }
        Command::Pages(PagesCommand::Show { id, raw }) => {
            commands::show_page(&api, &id, raw).await
        }
        Command::Pages(PagesCommand::Create {
            name,
            image,
            locale,
            tags,
        }) => commands::create_page(&api, name, image, &locale, tags).await,
        Command::Pages(PagesCommand::Delete { id }) => commands::delete_page(&api, &id).await,
        Command::Pages(PagesCommand::SetLocale { id, locale }) => {
            commands::set_locale(&api, &id, &locale).await
        }
        Command::Pages(PagesCommand::Annotate {
            id,
            texts,
            output,
            no_upload,
        }) => {
            commands::annotate(&api, &settings, &id, &texts, output.as_deref(), !no_upload).await
        }
        Command::BulkInsert { file } => commands::bulk_insert(&api, &file).await,
        Command::Export { tags, out } => {
            let dir = out.unwrap_or_else(|| settings.export_dir.clone());
            commands::export(&api, &tags, &dir).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings().await;
    if let Some(ref url) = cli.api_url {
        settings = settings.with_api_url(url);
    }

    match cli.command {
        None => run_tui(settings, None).await,
        Some(Command::Tui { open }) => run_tui(settings, open).await,
        Some(command) => run_command(command, settings).await,
    }
}
