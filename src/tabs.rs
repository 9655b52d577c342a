//! Tab list: the open tabs, the active index, and per-tab page state.
//!
//! Generic over the view type `V` so the bookkeeping can be exercised
//! without a running engine. The browser instantiates it with
//! `servo::WebView`; tests use `()`.
//!
//! Invariant: once the first tab is pushed the list is never empty.
//! [`Tabs::close`] refuses to remove the last tab and reports
//! [`CloseOutcome::LastTab`] so the caller can close the window instead.

use url::Url;

/// Label shown before the first page title arrives.
pub const NEW_TAB_TITLE: &str = "New Tab";
/// Label shown while a load is starting.
pub const LOADING_TITLE: &str = "Loading...";
/// Tab labels longer than this many characters are truncated.
pub const MAX_TITLE_CHARS: usize = 25;

/// One open tab.
#[derive(Debug)]
pub struct Tab<V> {
    pub view: V,
    url: Option<Url>,
    title: String,
    page_title: Option<String>,
    loading: bool,
    progress: u8,
}

impl<V> Tab<V> {
    pub fn new(view: V) -> Self {
        Self {
            view,
            url: None,
            title: NEW_TAB_TITLE.to_string(),
            page_title: None,
            loading: false,
            progress: 0,
        }
    }

    /// Last URL committed by the engine.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Full (untruncated) tab label.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Tab label truncated to [`MAX_TITLE_CHARS`] characters plus `...`.
    pub fn display_title(&self) -> String {
        truncate_title(&self.title)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Load progress, 0–100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn on_url_changed(&mut self, url: Url) {
        self.url = Some(url);
    }

    /// `None` means the page has no `<title>`: the URL is shown instead.
    pub fn on_title_changed(&mut self, title: Option<String>) {
        self.page_title = title.filter(|t| !t.trim().is_empty());
        if !self.loading || self.page_title.is_some() {
            self.title = self.resolved_title();
        }
    }

    pub fn on_load_started(&mut self) {
        self.loading = true;
        self.progress = 10;
        self.page_title = None;
        self.title = LOADING_TITLE.to_string();
    }

    pub fn on_load_head_parsed(&mut self) {
        self.progress = self.progress.max(50);
    }

    pub fn on_load_complete(&mut self) {
        self.loading = false;
        self.progress = 100;
        self.title = self.resolved_title();
    }

    fn resolved_title(&self) -> String {
        if let Some(ref title) = self.page_title {
            return title.clone();
        }
        match self.url {
            Some(ref url) => url.to_string(),
            None => NEW_TAB_TITLE.to_string(),
        }
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let head: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Result of [`Tabs::close`].
#[derive(Debug)]
pub enum CloseOutcome<V> {
    /// The tab was removed and is handed back (dropping it closes the view).
    Closed(Tab<V>),
    /// Refused: it was the only tab. The window should close instead.
    LastTab,
    OutOfRange,
}

/// Ordered list of tabs with an active index.
#[derive(Debug)]
pub struct Tabs<V> {
    tabs: Vec<Tab<V>>,
    active: usize,
}

impl<V> Default for Tabs<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Tabs<V> {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> Option<&Tab<V>> {
        self.tabs.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab<V>> {
        self.tabs.get_mut(self.active)
    }

    pub fn get(&self, index: usize) -> Option<&Tab<V>> {
        self.tabs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab<V>> {
        self.tabs.iter()
    }

    /// Appends a tab at the end of the strip and makes it active.
    pub fn push(&mut self, tab: Tab<V>) -> usize {
        self.tabs.push(tab);
        self.active = self.tabs.len() - 1;
        self.active
    }

    /// Removes the tab at `index`, unless it is the last one.
    ///
    /// Closing the active tab activates the tab that slides into its
    /// position, or the new last tab when the closed one was rightmost.
    pub fn close(&mut self, index: usize) -> CloseOutcome<V> {
        if index >= self.tabs.len() {
            return CloseOutcome::OutOfRange;
        }
        if self.tabs.len() == 1 {
            return CloseOutcome::LastTab;
        }

        let tab = self.tabs.remove(index);
        if index < self.active {
            self.active -= 1;
        } else if self.active >= self.tabs.len() {
            self.active = self.tabs.len() - 1;
        }
        CloseOutcome::Closed(tab)
    }

    /// Makes `index` the active tab. Returns `false` if out of range or
    /// already active.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() || index == self.active {
            return false;
        }
        self.active = index;
        true
    }

    pub fn select_next(&mut self) -> bool {
        if self.tabs.len() < 2 {
            return false;
        }
        self.select((self.active + 1) % self.tabs.len())
    }

    pub fn select_previous(&mut self) -> bool {
        if self.tabs.len() < 2 {
            return false;
        }
        let len = self.tabs.len();
        self.select((self.active + len - 1) % len)
    }

    /// Moves the active tab `delta` positions, clamped to the strip.
    /// Returns `true` if the order changed.
    pub fn move_active(&mut self, delta: isize) -> bool {
        if self.tabs.is_empty() {
            return false;
        }
        let last = self.tabs.len() as isize - 1;
        let target = (self.active as isize + delta).clamp(0, last) as usize;
        if target == self.active {
            return false;
        }
        let tab = self.tabs.remove(self.active);
        self.tabs.insert(target, tab);
        self.active = target;
        true
    }

    /// Index of the first tab whose view matches `pred`.
    pub fn position(&self, pred: impl Fn(&V) -> bool) -> Option<usize> {
        self.tabs.iter().position(|t| pred(&t.view))
    }

    /// Applies `update` to the first tab whose view matches `pred`.
    /// Returns whether that tab is the active one, `None` if none matched.
    pub fn update_where(
        &mut self,
        pred: impl Fn(&V) -> bool,
        update: impl FnOnce(&mut Tab<V>),
    ) -> Option<bool> {
        let index = self.position(pred)?;
        update(&mut self.tabs[index]);
        Some(index == self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(n: u32) -> Tabs<u32> {
        let mut tabs = Tabs::new();
        for i in 0..n {
            tabs.push(Tab::new(i));
        }
        tabs
    }

    fn views(tabs: &Tabs<u32>) -> Vec<u32> {
        tabs.iter().map(|t| t.view).collect()
    }

    #[test]
    fn test_push_activates_new_tab() {
        let mut tabs = strip(2);
        assert_eq!(tabs.active_index(), 1);
        assert_eq!(tabs.push(Tab::new(7)), 2);
        assert_eq!(tabs.active().unwrap().view, 7);
    }

    #[test]
    fn test_new_tab_defaults() {
        let tab = Tab::new(());
        assert_eq!(tab.title(), NEW_TAB_TITLE);
        assert!(tab.url().is_none());
        assert!(!tab.is_loading());
        assert_eq!(tab.progress(), 0);
    }

    #[test]
    fn test_last_tab_cannot_be_closed() {
        let mut tabs = strip(1);
        assert!(matches!(tabs.close(0), CloseOutcome::LastTab));
        assert_eq!(tabs.len(), 1);
    }

    #[test]
    fn test_close_out_of_range() {
        let mut tabs = strip(2);
        assert!(matches!(tabs.close(5), CloseOutcome::OutOfRange));
        assert_eq!(tabs.len(), 2);
    }

    #[test]
    fn test_close_active_selects_right_neighbour() {
        let mut tabs = strip(4);
        tabs.select(1);
        let CloseOutcome::Closed(tab) = tabs.close(1) else {
            panic!("expected Closed");
        };
        assert_eq!(tab.view, 1);
        assert_eq!(views(&tabs), vec![0, 2, 3]);
        assert_eq!(tabs.active().unwrap().view, 2);
    }

    #[test]
    fn test_close_rightmost_active_selects_new_last() {
        let mut tabs = strip(3);
        assert!(matches!(tabs.close(2), CloseOutcome::Closed(_)));
        assert_eq!(tabs.active_index(), 1);
        assert_eq!(tabs.active().unwrap().view, 1);
    }

    #[test]
    fn test_close_before_active_keeps_active_tab() {
        let mut tabs = strip(3);
        tabs.select(2);
        tabs.close(0);
        assert_eq!(tabs.active().unwrap().view, 2);
        assert_eq!(tabs.active_index(), 1);
    }

    #[test]
    fn test_close_after_active_keeps_index() {
        let mut tabs = strip(3);
        tabs.select(0);
        tabs.close(2);
        assert_eq!(tabs.active_index(), 0);
        assert_eq!(tabs.active().unwrap().view, 0);
    }

    #[test]
    fn test_select() {
        let mut tabs = strip(3);
        assert!(tabs.select(0));
        assert!(!tabs.select(0), "already active");
        assert!(!tabs.select(3), "out of range");
        assert_eq!(tabs.active_index(), 0);
    }

    #[test]
    fn test_select_next_and_previous_wrap() {
        let mut tabs = strip(3);
        assert!(tabs.select_next());
        assert_eq!(tabs.active_index(), 0);
        assert!(tabs.select_previous());
        assert_eq!(tabs.active_index(), 2);
        let mut single = strip(1);
        assert!(!single.select_next());
        assert!(!single.select_previous());
    }

    #[test]
    fn test_move_active() {
        let mut tabs = strip(3);
        tabs.select(0);
        assert!(tabs.move_active(1));
        assert_eq!(views(&tabs), vec![1, 0, 2]);
        assert_eq!(tabs.active().unwrap().view, 0);
        assert!(tabs.move_active(5));
        assert_eq!(views(&tabs), vec![1, 2, 0]);
        assert!(!tabs.move_active(1), "already rightmost");
        assert!(tabs.move_active(-10));
        assert_eq!(views(&tabs), vec![0, 1, 2]);
        assert_eq!(tabs.active_index(), 0);
    }

    #[test]
    fn test_position_and_update() {
        let mut tabs = strip(3);
        assert_eq!(tabs.position(|v| *v == 2), Some(2));
        assert_eq!(tabs.position(|v| *v == 9), None);
        tabs.update_where(|v| *v == 1, |t| t.on_title_changed(Some("One".into())));
        assert_eq!(tabs.get(1).unwrap().title(), "One");
    }

    #[test]
    fn test_title_truncation() {
        let mut tab = Tab::new(());
        tab.on_title_changed(Some("A".repeat(25)));
        assert_eq!(tab.display_title(), "A".repeat(25));
        tab.on_title_changed(Some("B".repeat(26)));
        assert_eq!(tab.display_title(), format!("{}...", "B".repeat(25)));
    }

    #[test]
    fn test_title_truncation_counts_chars_not_bytes() {
        let mut tab = Tab::new(());
        tab.on_title_changed(Some("é".repeat(25)));
        assert_eq!(tab.display_title(), "é".repeat(25));
    }

    #[test]
    fn test_load_lifecycle() {
        let mut tab = Tab::new(());
        tab.on_load_started();
        assert!(tab.is_loading());
        assert_eq!(tab.title(), LOADING_TITLE);
        assert_eq!(tab.progress(), 10);

        tab.on_url_changed(Url::parse("https://example.com/").unwrap());
        tab.on_load_head_parsed();
        assert_eq!(tab.progress(), 50);

        tab.on_title_changed(Some("Example Domain".into()));
        assert_eq!(tab.title(), "Example Domain");

        tab.on_load_complete();
        assert!(!tab.is_loading());
        assert_eq!(tab.progress(), 100);
        assert_eq!(tab.title(), "Example Domain");
    }

    #[test]
    fn test_untitled_page_falls_back_to_url() {
        let mut tab = Tab::new(());
        tab.on_load_started();
        tab.on_url_changed(Url::parse("https://example.com/raw.txt").unwrap());
        tab.on_title_changed(None);
        assert_eq!(tab.title(), LOADING_TITLE, "still loading");
        tab.on_load_complete();
        assert_eq!(tab.title(), "https://example.com/raw.txt");
    }

    #[test]
    fn test_blank_title_treated_as_missing() {
        let mut tab = Tab::new(());
        tab.on_url_changed(Url::parse("about:blank").unwrap());
        tab.on_title_changed(Some("   ".into()));
        assert_eq!(tab.title(), "about:blank");
    }

    #[test]
    fn test_update_background_tab_reports_inactive() {
        let mut tabs = strip(3);
        tabs.select(0);
        let url = Url::parse("https://background.example/").unwrap();
        assert_eq!(tabs.update_where(|&v| v == 2, |t| t.on_url_changed(url.clone())), Some(false));
        assert_eq!(tabs.get(2).unwrap().url(), Some(&url));
        assert!(tabs.active().unwrap().url().is_none());
    }

    #[test]
    fn test_update_active_tab_reports_active() {
        let mut tabs = strip(3);
        tabs.select(1);
        assert_eq!(tabs.update_where(|&v| v == 1, |t| t.on_load_started()), Some(true));
        assert!(tabs.active().unwrap().is_loading());
    }

    #[test]
    fn test_update_unknown_view() {
        let mut tabs = strip(2);
        let mut called = false;
        assert_eq!(tabs.update_where(|&v| v == 9, |_| called = true), None);
        assert!(!called);
    }
}
