//! TOML-based configuration system.
//!
//! Loads settings from a `config.toml` file, falling back to defaults that
//! reproduce the stock look of the browser. Every struct implements
//! `Default` so a missing or partial config file behaves like no file at all.
//!
//! ## Config file search order
//!
//! 1. `KALI_BROWSER_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`%APPDATA%\KaliBrowser\config.toml` on Windows)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `Config::default()`

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::{Result, UrlError};
use crate::sanitize::sanitize_url;

const CONFIG_ENV_VAR: &str = "KALI_BROWSER_CONFIG";
const BLANK_URL: &str = "about:blank";

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub window: WindowConfig,
    pub chrome: ChromeConfig,
    pub search: SearchConfig,
    pub engine: EngineConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Page loaded by the Home button and by every new tab.
    pub home_url: String,
    pub window_title: String,
}

/// Initial window geometry, in logical pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Chrome (tab strip + toolbar) geometry and appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    pub tab_strip_height: u32,
    pub toolbar_height: u32,
    pub min_tab_width: f32,
    pub max_tab_width: f32,
    pub button_width: f32,
    pub spacing: f32,
    pub font_size: f32,
    /// Explicit TTF/OTF path. Empty = look in `resources/fonts/` then system fonts.
    pub font_path: String,
    pub colors: ChromeColors,
}

/// RGBA colors for the chrome UI (values 0.0–1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeColors {
    pub window_background: [f32; 4],
    pub tab_strip: [f32; 4],
    pub tab: [f32; 4],
    pub tab_hover: [f32; 4],
    pub tab_active: [f32; 4],
    pub tab_text: [f32; 4],
    pub tab_active_text: [f32; 4],
    pub toolbar: [f32; 4],
    pub border: [f32; 4],
    pub button: [f32; 4],
    pub button_text: [f32; 4],
    pub url_field: [f32; 4],
    pub url_field_focused: [f32; 4],
    pub url_text: [f32; 4],
    pub accent: [f32; 4],
    pub secure: [f32; 4],
    pub insecure: [f32; 4],
    pub neutral: [f32; 4],
}

/// Search engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Prefix the url-encoded query is appended to.
    pub engine_url: String,
}

/// Embedded engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum layout threads. 0 = auto-detect from CPU count.
    pub layout_threads: i64,
    /// HTTP cache size in entries.
    pub cache_size: i64,
    /// User-agent string. Empty = engine default.
    pub user_agent: String,
    pub precache_shaders: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// `#rrggbb` → linear-ish RGBA as used by the GL chrome.
const fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            home_url: "https://www.google.com".to_string(),
            window_title: "Kali Browser".to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: 1400,
            height: 900,
        }
    }
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            tab_strip_height: 36,
            toolbar_height: 50,
            min_tab_width: 150.0,
            max_tab_width: 280.0,
            button_width: 40.0,
            spacing: 8.0,
            font_size: 14.0,
            font_path: String::new(),
            colors: ChromeColors::default(),
        }
    }
}

impl Default for ChromeColors {
    fn default() -> Self {
        Self {
            window_background: rgb(0x0d0d0d),
            tab_strip: rgb(0x121212),
            tab: rgb(0x1f1f1f),
            tab_hover: rgb(0x2a2a2a),
            tab_active: rgb(0x323232),
            tab_text: rgb(0x909090),
            tab_active_text: rgb(0xffffff),
            toolbar: rgb(0x161616),
            border: rgb(0x2a2a2a),
            button: rgb(0x252525),
            button_text: rgb(0xd0d0d0),
            url_field: rgb(0x1f1f1f),
            url_field_focused: rgb(0x252525),
            url_text: rgb(0xe0e0e0),
            accent: rgb(0x4a9eff),
            secure: rgb(0x34a853),
            insecure: rgb(0xea4335),
            neutral: rgb(0x4a9eff),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine_url: "https://www.google.com/search?q=".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout_threads: 0,
            cache_size: 50_000,
            user_agent: String::new(),
            precache_shaders: true,
        }
    }
}

impl ChromeConfig {
    /// Total height of the chrome area (tab strip + toolbar).
    pub fn height(&self) -> u32 {
        self.tab_strip_height + self.toolbar_height
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading and saving
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// The configured home page, run through the same sanitizer as URL bar
    /// input.
    pub fn home_url(&self) -> std::result::Result<Url, UrlError> {
        sanitize_url(&self.general.home_url, &self.search.engine_url)
    }

    /// [`Config::home_url`], or `about:blank` (logged) when the home page is
    /// rejected.
    pub fn home_url_or_blank(&self) -> std::result::Result<Url, url::ParseError> {
        self.home_url().or_else(|error| {
            warn!(home = %self.general.home_url, %error, "Home URL rejected, using about:blank");
            Url::parse(BLANK_URL)
        })
    }

    /// Loads configuration from a TOML file. Never fails: returns defaults
    /// if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        info!(path = %path.display(), "Configuration loaded");
                        config
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                        Config::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                    Config::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        }
    }

    /// Saves configuration to the platform config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = save_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(&path, content)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(path)
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
        warn!(path = %p.display(), "{CONFIG_ENV_VAR} does not point to a file");
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    if let Some(dir) = platform_config_dir() {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    let p = PathBuf::from("config.toml");
    p.is_file().then_some(p)
}

fn save_path() -> PathBuf {
    platform_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("KaliBrowser"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("kali-browser"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.general.home_url, "https://www.google.com");
        assert_eq!(c.general.window_title, "Kali Browser");
        assert_eq!((c.window.x, c.window.y), (100, 100));
        assert_eq!((c.window.width, c.window.height), (1400, 900));
        assert_eq!(c.search.engine_url, "https://www.google.com/search?q=");
        assert_eq!(c.chrome.min_tab_width, 150.0);
        assert_eq!(c.chrome.max_tab_width, 280.0);
        assert_eq!(c.chrome.height(), 86);
        assert!(c.chrome.font_path.is_empty());
    }

    #[test]
    fn test_rgb_conversion() {
        assert_eq!(rgb(0x000000), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb(0xffffff), [1.0, 1.0, 1.0, 1.0]);
        let accent = rgb(0x4a9eff);
        assert!((accent[0] - 74.0 / 255.0).abs() < f32::EPSILON);
        assert!((accent[2] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_toml_returns_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.window.width, 1400);
        assert_eq!(config.chrome.toolbar_height, 50);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[general]
home_url = "https://duckduckgo.com"

[search]
engine_url = "https://duckduckgo.com/?q="
"#,
        )
        .unwrap();
        assert_eq!(config.general.home_url, "https://duckduckgo.com");
        assert_eq!(config.general.window_title, "Kali Browser");
        assert_eq!(config.search.engine_url, "https://duckduckgo.com/?q=");
        assert_eq!(config.window.height, 900);
    }

    #[test]
    fn test_color_override() {
        let config: Config = toml::from_str(
            r#"
[chrome.colors]
accent = [1.0, 0.0, 0.0, 1.0]
"#,
        )
        .unwrap();
        assert_eq!(config.chrome.colors.accent, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(config.chrome.colors.secure, rgb(0x34a853));
    }

    #[test]
    fn test_serialized_config_parses_back() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.general.home_url, "https://www.google.com");
        assert_eq!(parsed.chrome.tab_strip_height, 36);
        assert_eq!(parsed.engine.cache_size, 50_000);
    }

    #[test]
    fn test_save_path_ends_with_config_toml() {
        assert!(save_path().ends_with("config.toml"));
    }

    #[test]
    fn test_home_url_is_sanitized() {
        let mut config = Config::default();
        assert_eq!(config.home_url().unwrap().as_str(), "https://www.google.com/");

        config.general.home_url = "servo.org".to_string();
        assert_eq!(config.home_url().unwrap().as_str(), "https://servo.org/");

        config.general.home_url = "ftp://example.com".to_string();
        assert!(config.home_url().is_err());
    }

    #[test]
    fn test_rejected_home_falls_back_to_blank() {
        let mut config = Config::default();
        assert_eq!(config.home_url_or_blank().unwrap().as_str(), "https://www.google.com/");
        config.general.home_url = "ws://example.com".to_string();
        assert_eq!(config.home_url_or_blank().unwrap().as_str(), "about:blank");
    }
}
