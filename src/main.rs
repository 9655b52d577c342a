//! Kali Browser entry point.
//!
//! Usage:
//!   kali-browser [URL]
//!   kali-browser --write-config
//!
//! Examples:
//!   cargo run                          → opens the configured home page
//!   cargo run -- https://servo.org     → opens servo.org
//!   cargo run -- wikipedia.org         → https:// is added automatically
//!   cargo run -- "rust book"           → web search
//!   cargo run -- --write-config        → writes the current config to disk

use std::env;
use std::error::Error;

use kali_browser::browser::App;
use kali_browser::config::Config;
use kali_browser::sanitize::sanitize_url;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;
use winit::event_loop::EventLoop;

const DEFAULT_LOG_FILTER: &str = "kali_browser=info";

fn main() -> Result<(), Box<dyn Error>> {
    // ── 1. TLS crypto provider ─────────────────────────────────────────
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| "failed to install the rustls crypto provider")?;

    // ── 2. Logging ─────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    #[cfg(debug_assertions)]
    warn!("Debug build: pages load slowly, use `cargo run --release` for normal speed");

    // ── 3. Configuration ───────────────────────────────────────────────
    let config = Config::load();
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--write-config") {
        let path = config.save()?;
        info!(path = %path.display(), "Configuration written");
        return Ok(());
    }

    // ── 4. Engine resources ────────────────────────────────────────────
    let resources = kali_browser::resources::init()?;

    // ── 5. Start page ──────────────────────────────────────────────────
    let input = args.iter().find(|arg| !arg.starts_with("--"));
    let initial_url = initial_url(input.map(String::as_str), &config)?;
    info!(url = %initial_url, "Starting");

    // ── 6. Event loop ──────────────────────────────────────────────────
    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, resources, initial_url);

    Ok(event_loop.run_app(&mut app)?)
}

/// The command-line URL goes through the URL bar sanitizer; anything it
/// rejects falls back to the home page, and a broken home page to
/// `about:blank`.
fn initial_url(input: Option<&str>, config: &Config) -> Result<Url, url::ParseError> {
    if let Some(input) = input {
        match sanitize_url(input, &config.search.engine_url) {
            Ok(url) => return Ok(url),
            Err(error) => warn!(input, %error, "Command-line URL rejected, opening home page"),
        }
    }
    config.home_url_or_blank()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_url_from_argument() {
        let config = Config::default();
        let url = initial_url(Some("servo.org"), &config).unwrap();
        assert_eq!(url.as_str(), "https://servo.org/");
    }

    #[test]
    fn test_initial_url_defaults_to_home() {
        let config = Config::default();
        let url = initial_url(None, &config).unwrap();
        assert_eq!(url.as_str(), "https://www.google.com/");
    }

    #[test]
    fn test_rejected_argument_falls_back_to_home() {
        let config = Config::default();
        let url = initial_url(Some("ftp://example.com/file"), &config).unwrap();
        assert_eq!(url.as_str(), "https://www.google.com/");
    }

    #[test]
    fn test_broken_home_falls_back_to_blank() {
        let mut config = Config::default();
        config.general.home_url = "ws://example.com".to_string();
        let url = initial_url(None, &config).unwrap();
        assert_eq!(url.as_str(), "about:blank");
    }
}
