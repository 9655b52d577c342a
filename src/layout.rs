//! Chrome geometry and hit testing.
//!
//! ```text
//! ┌─────────────┬─────────────┬────────────────────────────────┐
//! │ Tab 1     × │ Tab 2     × │                                │  tab strip
//! ├───┬───┬───┬───┬──────────────────────────────────┬───┬─────┤
//! │ ◀ │ ▶ │ ↻ │ ⌂ │ https://example.com/             │ 🔒 │  +  │  toolbar
//! ├───┴───┴───┴───┴──────────────────────────────────┴───┴─────┤
//! │                        engine view                          │
//! ```
//!
//! All coordinates are physical pixels with a top-left origin.

use crate::commands::BrowserCommand;
use crate::config::ChromeConfig;

/// Left margin of the tab strip.
const STRIP_PADDING: f32 = 4.0;
/// Extra gap between the Home button and the URL field (toolbar separator).
const SEPARATOR_GAP: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// Toolbar buttons, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarButton {
    Back,
    Forward,
    Reload,
    Home,
}

impl ToolbarButton {
    pub const ALL: [ToolbarButton; 4] = [Self::Back, Self::Forward, Self::Reload, Self::Home];

    /// Preferred glyph, then an ASCII fallback. Reload turns into Stop while
    /// the page is loading.
    pub fn glyphs(self, loading: bool) -> (char, char) {
        match self {
            Self::Back => ('◀', '<'),
            Self::Forward => ('▶', '>'),
            Self::Reload if loading => ('×', 'x'),
            Self::Reload => ('↻', 'R'),
            Self::Home => ('⌂', 'H'),
        }
    }
}

/// What a point in the chrome area lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeHit {
    Tab(usize),
    CloseTab(usize),
    Button(ToolbarButton),
    UrlBar,
    Security,
    NewTab,
    /// Chrome background: no action.
    Empty,
}

impl ChromeHit {
    /// Command triggered by a left click.
    pub fn click_command(self, loading: bool) -> Option<BrowserCommand> {
        match self {
            Self::Tab(i) => Some(BrowserCommand::SelectTab(i)),
            Self::CloseTab(i) => Some(BrowserCommand::CloseTab(i)),
            Self::Button(ToolbarButton::Back) => Some(BrowserCommand::Back),
            Self::Button(ToolbarButton::Forward) => Some(BrowserCommand::Forward),
            Self::Button(ToolbarButton::Reload) if loading => Some(BrowserCommand::Stop),
            Self::Button(ToolbarButton::Reload) => Some(BrowserCommand::Reload),
            Self::Button(ToolbarButton::Home) => Some(BrowserCommand::Home),
            Self::UrlBar => Some(BrowserCommand::FocusUrlBar),
            Self::NewTab => Some(BrowserCommand::NewTab),
            Self::Security | Self::Empty => None,
        }
    }

    /// Command triggered by a middle click.
    pub fn middle_click_command(self) -> Option<BrowserCommand> {
        match self {
            Self::Tab(i) | Self::CloseTab(i) => Some(BrowserCommand::CloseTab(i)),
            _ => None,
        }
    }
}

/// Computed chrome geometry for one window width and tab count.
#[derive(Debug, Clone)]
pub struct ChromeLayout {
    pub width: f32,
    pub height: f32,
    pub tab_strip: Rect,
    pub toolbar: Rect,
    pub tabs: Vec<TabRect>,
    pub buttons: [(ToolbarButton, Rect); 4],
    pub url_field: Rect,
    pub security: Rect,
    pub new_tab: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabRect {
    pub tab: Rect,
    pub close: Rect,
}

impl ChromeLayout {
    pub fn compute(window_width: u32, tab_count: usize, config: &ChromeConfig) -> Self {
        let width = window_width as f32;
        let strip_h = config.tab_strip_height as f32;
        let toolbar_h = config.toolbar_height as f32;
        let spacing = config.spacing;

        let tab_strip = Rect::new(0.0, 0.0, width, strip_h);
        let toolbar = Rect::new(0.0, strip_h, width, toolbar_h);

        // ── Tabs ─────────────────────────────────────────────────────────
        let tab_w = tab_width(width, tab_count, config);
        let tab_h = (strip_h - STRIP_PADDING).max(1.0);
        let close_size = (tab_h * 0.5).round();
        let tabs = (0..tab_count)
            .map(|i| {
                let x = STRIP_PADDING + i as f32 * (tab_w + 2.0);
                let tab = Rect::new(x, STRIP_PADDING, tab_w, tab_h);
                let close = Rect::new(
                    tab.right() - close_size - spacing,
                    tab.y + (tab_h - close_size) / 2.0,
                    close_size,
                    close_size,
                );
                TabRect { tab, close }
            })
            .collect();

        // ── Toolbar ──────────────────────────────────────────────────────
        let item_y = strip_h + spacing;
        let item_h = (toolbar_h - 2.0 * spacing).max(1.0);
        let bw = config.button_width;

        let buttons = ToolbarButton::ALL.map(|button| {
            let i = button as usize as f32;
            (button, Rect::new(spacing + i * (bw + spacing / 2.0), item_y, bw, item_h))
        });

        let new_tab = Rect::new(width - spacing - bw, item_y, bw, item_h);
        let security = Rect::new(new_tab.x - spacing - bw, item_y, bw, item_h);
        let url_x = buttons[3].1.right() + spacing + SEPARATOR_GAP;
        let url_field = Rect::new(url_x, item_y, (security.x - spacing - url_x).max(0.0), item_h);

        Self {
            width,
            height: strip_h + toolbar_h,
            tab_strip,
            toolbar,
            tabs,
            buttons,
            url_field,
            security,
            new_tab,
        }
    }

    /// `None` when the point is below the chrome (engine view area).
    pub fn hit_test(&self, x: f32, y: f32) -> Option<ChromeHit> {
        if y < 0.0 || y >= self.height || x < 0.0 || x >= self.width {
            return None;
        }

        if self.tab_strip.contains(x, y) {
            for (i, tab) in self.tabs.iter().enumerate() {
                if tab.close.contains(x, y) {
                    return Some(ChromeHit::CloseTab(i));
                }
                if tab.tab.contains(x, y) {
                    return Some(ChromeHit::Tab(i));
                }
            }
            return Some(ChromeHit::Empty);
        }

        if let Some((button, _)) = self.buttons.iter().find(|(_, r)| r.contains(x, y)) {
            return Some(ChromeHit::Button(*button));
        }
        if self.url_field.contains(x, y) {
            return Some(ChromeHit::UrlBar);
        }
        if self.security.contains(x, y) {
            return Some(ChromeHit::Security);
        }
        if self.new_tab.contains(x, y) {
            return Some(ChromeHit::NewTab);
        }
        Some(ChromeHit::Empty)
    }
}

/// Even split of the strip, clamped to `min_tab_width..=max_tab_width`.
/// Tabs past the right edge are clipped.
fn tab_width(width: f32, tab_count: usize, config: &ChromeConfig) -> f32 {
    // A config may list the bounds in either order.
    let (min, max) = (
        config.min_tab_width.min(config.max_tab_width),
        config.min_tab_width.max(config.max_tab_width),
    );
    if tab_count == 0 {
        return max;
    }
    let available = (width - 2.0 * STRIP_PADDING).max(0.0);
    (available / tab_count as f32 - 2.0).clamp(min, max)
}
