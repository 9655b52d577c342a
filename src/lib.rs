//! # Kali Browser
//!
//! A tabbed desktop browser shell around the Servo engine: tab strip,
//! navigation toolbar, URL bar with a sanitizer, and a scheme allow-list
//! enforced on every navigation.
//!
//! ## Modules
//!
//! - [`browser`]: winit event loop, window lifecycle, input routing, tab wiring.
//! - [`servo_glue`]: the waker bridging engine threads to the loop, and the
//!   per-view delegate (URL/title/load notifications, navigation veto).
//! - [`sanitize`]: turns URL bar input into a navigable URL; the scheme
//!   allow-list.
//! - [`tabs`]: ordered tab list with active index and per-tab page state.
//! - [`urlbar`]: URL bar editing state machine.
//! - [`commands`]: browser commands and the keyboard shortcut table.
//! - [`layout`]: chrome geometry and hit testing.
//! - [`chrome`]: GL renderer for the chrome (`glow` + `fontdue`).
//! - [`security`]: connection security indicator.
//! - [`rendering`]: window and offscreen rendering contexts.
//! - [`config`], [`preferences`], [`resources`]: TOML config, engine
//!   preferences, engine resource files.
//! - [`keyutils`]: winit → engine keyboard event conversion.

pub mod browser;
pub mod chrome;
pub mod commands;
pub mod config;
pub mod error;
pub mod keyutils;
pub mod layout;
pub mod preferences;
pub mod rendering;
pub mod resources;
pub mod sanitize;
pub mod security;
pub mod servo_glue;
pub mod tabs;
pub mod urlbar;
