//! Configuration management for pagedesk using the prefer crate.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend base URL, including the API version prefix.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";

/// Quiet interval before a name search is sent.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "PAGEDESK_API_URL";

/// Fonts probed when no `font_path` is configured.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Backend base URL, e.g. `http://host/api/v1`.
    pub api_url: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    /// Quiet interval for the catalog name search.
    pub search_debounce: Duration,
    /// Directory receiving `en.json`, `id.json` and `vn.json`.
    pub export_dir: PathBuf,
    /// Font used to render annotation text.
    pub font_path: Option<PathBuf>,
    /// Pixels an overlay moves per arrow key in the editor.
    pub nudge_step: u32,
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Log file used while the terminal UI owns the screen.
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("pagedesk");

        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("pagedesk/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: None,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            export_dir: PathBuf::from("."),
            font_path: None,
            nudge_step: 10,
            log_file: data_dir.join("pagedesk.log"),
            data_dir,
        }
    }
}

impl Settings {
    /// Set the backend URL, dropping any trailing slash.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Resolve the annotation font: configured path first, then known system fonts.
    pub fn resolve_font(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.font_path {
            return Some(path.clone());
        }
        FALLBACK_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        if let Some(parent) = self.log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL.
    #[serde(default)]
    pub api_url: Option<String>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Search debounce interval in milliseconds.
    #[serde(default)]
    pub search_debounce_ms: Option<u64>,
    /// Export directory for locale bundles.
    #[serde(default)]
    pub export_dir: Option<String>,
    /// TTF/OTF font for annotation text.
    #[serde(default)]
    pub font_path: Option<String>,
    /// Overlay movement step in pixels.
    #[serde(default)]
    pub nudge_step: Option<u32>,
    /// Log file path for the terminal UI.
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers pagedesk config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("pagedesk").await {
            Ok(pref_config) => {
                let api_url: Option<String> = pref_config.get("api_url").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let search_debounce_ms: Option<u64> =
                    pref_config.get("search_debounce_ms").ok();
                let export_dir: Option<String> = pref_config.get("export_dir").ok();
                let font_path: Option<String> = pref_config.get("font_path").ok();
                let nudge_step: Option<u32> = pref_config.get("nudge_step").ok();
                let log_file: Option<String> = pref_config.get("log_file").ok();

                Config {
                    api_url,
                    user_agent,
                    request_timeout,
                    search_debounce_ms,
                    export_dir,
                    font_path,
                    nudge_step,
                    log_file,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref api_url) = self.api_url {
            settings.api_url = api_url.trim_end_matches('/').to_string();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = (timeout > 0).then(|| Duration::from_secs(timeout));
        }
        if let Some(ms) = self.search_debounce_ms {
            settings.search_debounce = Duration::from_millis(ms);
        }
        if let Some(ref dir) = self.export_dir {
            settings.export_dir = expand(dir);
        }
        if let Some(ref font) = self.font_path {
            settings.font_path = Some(expand(font));
        }
        if let Some(step) = self.nudge_step {
            settings.nudge_step = step.max(1);
        }
        if let Some(ref log_file) = self.log_file {
            settings.log_file = expand(log_file);
        }
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Load settings from `.env`, configuration files and the environment.
pub async fn load_settings() -> Settings {
    let _ = dotenvy::dotenv();

    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            settings = settings.with_api_url(url.trim());
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.search_debounce, Duration::from_millis(300));
        assert!(settings.request_timeout.is_none());
    }

    #[test]
    fn test_apply_overrides() {
        let config = Config {
            api_url: Some("http://backend:9000/api/v1/".to_string()),
            request_timeout: Some(15),
            search_debounce_ms: Some(500),
            export_dir: Some("/tmp/bundles".to_string()),
            nudge_step: Some(0),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.api_url, "http://backend:9000/api/v1");
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(settings.search_debounce, Duration::from_millis(500));
        assert_eq!(settings.export_dir, PathBuf::from("/tmp/bundles"));
        assert_eq!(settings.nudge_step, 1);
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let config = Config {
            request_timeout: Some(0),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);
        assert!(settings.request_timeout.is_none());
    }

    #[test]
    fn test_configured_font_wins() {
        let mut settings = Settings::default();
        settings.font_path = Some(PathBuf::from("/nonexistent/font.ttf"));
        assert_eq!(
            settings.resolve_font(),
            Some(PathBuf::from("/nonexistent/font.ttf"))
        );
    }
}
