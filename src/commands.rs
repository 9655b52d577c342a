//! Browser commands and their keyboard shortcuts.
//!
//! Toolbar clicks, tab strip clicks and shortcuts all resolve to a
//! [`BrowserCommand`], executed in one place by the browser state.

use url::Url;
use winit::keyboard::{Key, ModifiersState, NamedKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCommand {
    Back,
    Forward,
    Reload,
    Stop,
    Home,
    NewTab,
    CloseTab(usize),
    CloseActiveTab,
    SelectTab(usize),
    /// Ctrl+9: always the rightmost tab.
    SelectLastTab,
    NextTab,
    PreviousTab,
    MoveTabLeft,
    MoveTabRight,
    FocusUrlBar,
    Navigate(Url),
}

/// Maps a key press to a global shortcut.
///
/// `url_bar_focused` matters for Escape only: with the URL bar focused it
/// cancels the edit, otherwise it stops the page load.
pub fn shortcut_command(
    key: &Key,
    mods: ModifiersState,
    url_bar_focused: bool,
) -> Option<BrowserCommand> {
    let ctrl = mods.control_key();
    let shift = mods.shift_key();
    let alt = mods.alt_key();

    match key {
        Key::Character(c) if ctrl && !alt => {
            let c = c.as_str().to_ascii_lowercase();
            match c.as_str() {
                "l" => Some(BrowserCommand::FocusUrlBar),
                "r" => Some(BrowserCommand::Reload),
                "t" => Some(BrowserCommand::NewTab),
                "w" => Some(BrowserCommand::CloseActiveTab),
                "9" => Some(BrowserCommand::SelectLastTab),
                digit => digit
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=8).contains(n))
                    .map(|n| BrowserCommand::SelectTab(n - 1)),
            }
        }
        Key::Named(NamedKey::F5) => Some(BrowserCommand::Reload),
        Key::Named(NamedKey::ArrowLeft) if alt && !ctrl => Some(BrowserCommand::Back),
        Key::Named(NamedKey::ArrowRight) if alt && !ctrl => Some(BrowserCommand::Forward),
        Key::Named(NamedKey::BrowserBack) => Some(BrowserCommand::Back),
        Key::Named(NamedKey::BrowserForward) => Some(BrowserCommand::Forward),
        Key::Named(NamedKey::Home) if alt => Some(BrowserCommand::Home),
        Key::Named(NamedKey::BrowserHome) => Some(BrowserCommand::Home),
        Key::Named(NamedKey::Tab) if ctrl && shift => Some(BrowserCommand::PreviousTab),
        Key::Named(NamedKey::Tab) if ctrl => Some(BrowserCommand::NextTab),
        Key::Named(NamedKey::PageUp) if ctrl && shift => Some(BrowserCommand::MoveTabLeft),
        Key::Named(NamedKey::PageDown) if ctrl && shift => Some(BrowserCommand::MoveTabRight),
        Key::Named(NamedKey::PageUp) if ctrl => Some(BrowserCommand::PreviousTab),
        Key::Named(NamedKey::PageDown) if ctrl => Some(BrowserCommand::NextTab),
        Key::Named(NamedKey::Escape) if !url_bar_focused => Some(BrowserCommand::Stop),
        _ => None,
    }
}
