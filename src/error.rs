//! Error types shared across the browser shell.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a piece of user input or a navigation target was refused.
///
/// Rejections are never surfaced to the user: the URL bar simply does not
/// navigate, and the navigation hook vetoes the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// Nothing left after trimming whitespace.
    #[error("empty URL")]
    Empty,

    /// The candidate could not be parsed as a URL.
    #[error("unparseable URL '{input}': {source}")]
    Unparseable {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// The URL parsed but its scheme is not on the allow-list.
    #[error("scheme '{0}' is not allowed")]
    SchemeNotAllowed(String),
}

/// Fatal startup failures raised while bringing the window up.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("window handle unavailable: {0}")]
    Handle(#[from] winit::raw_window_handle::HandleError),

    #[error("engine resources directory not found (set SERVO_RESOURCES_PATH)")]
    ResourcesNotFound,

    #[error("rendering context error: {0}")]
    Rendering(String),

    #[error("failed to load font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BrowserError>;
