//! URL bar: text editing state machine.
//!
//! Holds the text, the cursor and the focus state of the single URL field
//! shared by all tabs. Pure logic, no graphics: the chrome renderer reads
//! [`UrlBar::display_text`] and [`UrlBar::cursor_char_offset`].
//!
//! The bar always mirrors the active tab. Engine URL notifications go through
//! [`UrlBar::set_url`], which leaves an in-progress edit alone; tab switches
//! go through [`UrlBar::replace_url`], which discards it.

use url::Url;

use crate::error::UrlError;
use crate::sanitize::sanitize_url;

/// Display form of a URL.
///
/// Punycode hosts are flagged so lookalike domains stand out, and invisible
/// characters that could hide part of the address are dropped.
fn normalize_url_for_display(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    if host.starts_with("xn--") || host.contains(".xn--") {
        return format!("⚠ {url} (Punycode)");
    }

    url.as_str()
        .chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{034F}' | '\u{2028}' | '\u{2029}'
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlBarFocus {
    /// Keyboard input goes to the page.
    Unfocused,
    /// Just focused: the whole text is selected, next keystroke replaces it.
    Focused,
    /// Character-by-character editing.
    Editing,
}

#[derive(Debug)]
pub struct UrlBar {
    text: String,
    /// Byte offset into `text`.
    cursor: usize,
    focus: UrlBarFocus,
    current_url: Option<Url>,
}

impl Default for UrlBar {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlBar {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            focus: UrlBarFocus::Unfocused,
            current_url: None,
        }
    }

    /// Engine reported a new URL for the active tab. Ignored while editing.
    pub fn set_url(&mut self, url: &Url) {
        self.current_url = Some(url.clone());
        if self.focus == UrlBarFocus::Unfocused {
            self.show_current();
        }
    }

    /// Active tab changed: show its address, dropping any pending edit.
    pub fn replace_url(&mut self, url: Option<&Url>) {
        self.current_url = url.cloned();
        self.focus = UrlBarFocus::Unfocused;
        self.show_current();
    }

    fn show_current(&mut self) {
        self.text = self
            .current_url
            .as_ref()
            .map(normalize_url_for_display)
            .unwrap_or_default();
        self.cursor = self.text.len();
    }

    /// Ctrl+L or click: select everything. The raw address replaces the
    /// display form so that editing starts from a navigable URL.
    pub fn focus(&mut self) {
        if self.focus == UrlBarFocus::Unfocused
            && let Some(url) = &self.current_url
        {
            self.text = url.to_string();
        }
        self.focus = UrlBarFocus::Focused;
        self.cursor = self.text.len();
    }

    /// Escape: drop the edit and show the current address again.
    pub fn unfocus(&mut self) {
        self.focus = UrlBarFocus::Unfocused;
        self.show_current();
    }

    /// Leaves `Focused` (select-all) for `Editing`, clearing the selection
    /// text when `replace` is set.
    fn begin_edit(&mut self, replace: bool) -> bool {
        if self.focus != UrlBarFocus::Focused {
            return false;
        }
        self.focus = UrlBarFocus::Editing;
        if replace {
            self.text.clear();
            self.cursor = 0;
        }
        true
    }

    pub fn insert_char(&mut self, c: char) {
        self.begin_edit(true);
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.begin_edit(true) {
            return;
        }
        if let Some(prev) = self.prev_boundary() {
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.begin_edit(true) {
            return;
        }
        if let Some(next) = self.next_boundary() {
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.begin_edit(false) {
            self.cursor = 0;
            return;
        }
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.begin_edit(false) {
            return;
        }
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.begin_edit(false);
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.begin_edit(false);
        self.cursor = self.text.len();
    }

    pub fn select_all(&mut self) {
        self.focus();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    /// Enter: sanitize the text into a navigable URL.
    ///
    /// On rejection the text and focus are kept and nothing is navigated.
    pub fn submit(&mut self, search_prefix: &str) -> Result<Url, UrlError> {
        let url = sanitize_url(&self.text, search_prefix)?;
        self.focus = UrlBarFocus::Unfocused;
        Ok(url)
    }

    /// `true` while the bar should consume keyboard input.
    pub fn is_focused(&self) -> bool {
        self.focus != UrlBarFocus::Unfocused
    }

    pub fn focus_state(&self) -> UrlBarFocus {
        self.focus
    }

    pub fn display_text(&self) -> &str {
        &self.text
    }

    /// Address of the active tab, independent of any edit in progress.
    pub fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }

    /// Characters before the cursor, for rendering.
    pub fn cursor_char_offset(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = "https://www.google.com/search?q=";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn type_str(bar: &mut UrlBar, s: &str) {
        for c in s.chars() {
            bar.insert_char(c);
        }
    }

    #[test]
    fn test_punycode_warning() {
        let shown = normalize_url_for_display(&url("https://xn--ggle-0nd.com/path"));
        assert!(shown.starts_with('⚠'), "{shown}");
        assert!(shown.contains("xn--ggle-0nd.com"));
        assert!(shown.ends_with("(Punycode)"));
    }

    #[test]
    fn test_punycode_subdomain_warning() {
        let shown = normalize_url_for_display(&url("https://login.xn--ggle-0nd.com/"));
        assert!(shown.contains("Punycode"), "{shown}");
    }

    #[test]
    fn test_normal_domain_unchanged() {
        let u = url("https://google.com/path?query=value");
        assert_eq!(normalize_url_for_display(&u), "https://google.com/path?query=value");
    }

    #[test]
    fn test_set_url_ignored_while_editing() {
        let mut bar = UrlBar::new();
        bar.set_url(&url("https://a.com/"));
        bar.focus();
        type_str(&mut bar, "b.com");
        bar.set_url(&url("https://c.com/"));
        assert_eq!(bar.display_text(), "b.com");
        assert_eq!(bar.current_url().unwrap().as_str(), "https://c.com/");
    }

    #[test]
    fn test_replace_url_discards_edit() {
        let mut bar = UrlBar::new();
        bar.set_url(&url("https://a.com/"));
        bar.focus();
        type_str(&mut bar, "half typed");
        bar.replace_url(Some(&url("https://tab2.com/")));
        assert!(!bar.is_focused());
        assert_eq!(bar.display_text(), "https://tab2.com/");
        bar.replace_url(None);
        assert_eq!(bar.display_text(), "");
    }

    #[test]
    fn test_focus_then_type_replaces_everything() {
        let mut bar = UrlBar::new();
        bar.set_url(&url("https://a.com/"));
        bar.focus();
        assert_eq!(bar.focus_state(), UrlBarFocus::Focused);
        bar.insert_char('x');
        assert_eq!(bar.display_text(), "x");
        assert_eq!(bar.focus_state(), UrlBarFocus::Editing);
    }

    #[test]
    fn test_unfocus_restores_url() {
        let mut bar = UrlBar::new();
        bar.set_url(&url("https://a.com/"));
        bar.focus();
        type_str(&mut bar, "junk");
        bar.unfocus();
        assert_eq!(bar.display_text(), "https://a.com/");
        assert!(!bar.is_focused());
    }

    #[test]
    fn test_cursor_editing_multibyte() {
        let mut bar = UrlBar::new();
        bar.focus();
        type_str(&mut bar, "héllo");
        bar.move_cursor_left();
        bar.move_cursor_left();
        bar.move_cursor_left();
        bar.backspace();
        assert_eq!(bar.display_text(), "hllo");
        assert_eq!(bar.cursor_char_offset(), 1);
        bar.delete();
        assert_eq!(bar.display_text(), "hlo");
        bar.end();
        assert_eq!(bar.cursor_char_offset(), 3);
        bar.home();
        assert_eq!(bar.cursor_char_offset(), 0);
        bar.backspace();
        assert_eq!(bar.display_text(), "hlo");
    }

    #[test]
    fn test_backspace_after_focus_clears() {
        let mut bar = UrlBar::new();
        bar.set_url(&url("https://a.com/"));
        bar.focus();
        bar.backspace();
        assert_eq!(bar.display_text(), "");
        assert!(bar.is_focused());
    }

    #[test]
    fn test_arrow_after_focus_keeps_text() {
        let mut bar = UrlBar::new();
        bar.set_url(&url("https://a.com/"));
        bar.focus();
        bar.move_cursor_left();
        assert_eq!(bar.display_text(), "https://a.com/");
        assert_eq!(bar.cursor_char_offset(), 0);
    }

    #[test]
    fn test_submit_host() {
        let mut bar = UrlBar::new();
        bar.focus();
        type_str(&mut bar, "example.com");
        assert_eq!(bar.submit(SEARCH).unwrap().as_str(), "https://example.com/");
        assert!(!bar.is_focused());
    }

    #[test]
    fn test_submit_search() {
        let mut bar = UrlBar::new();
        bar.focus();
        type_str(&mut bar, "hello world");
        let target = bar.submit(SEARCH).unwrap();
        assert_eq!(target.as_str(), "https://www.google.com/search?q=hello+world");
    }

    #[test]
    fn test_rejected_submit_keeps_text_and_focus() {
        let mut bar = UrlBar::new();
        bar.focus();
        type_str(&mut bar, "ftp://files.example.com");
        assert!(bar.submit(SEARCH).is_err());
        assert!(bar.is_focused());
        assert_eq!(bar.display_text(), "ftp://files.example.com");

        let mut empty = UrlBar::new();
        empty.focus();
        assert_eq!(empty.submit(SEARCH), Err(UrlError::Empty));
    }

    #[test]
    fn test_focus_edits_raw_punycode_address() {
        let mut bar = UrlBar::new();
        bar.set_url(&url("https://xn--pple-43d.com/"));
        assert!(bar.display_text().starts_with('⚠'));
        bar.focus();
        assert_eq!(bar.display_text(), "https://xn--pple-43d.com/");
        bar.unfocus();
        assert!(bar.display_text().starts_with('⚠'));
    }
}
