//! Glue between the engine and the browser shell.
//!
//! * [`Waker`] / [`WakerEvent`]: how engine threads wake the winit loop.
//! * `WebViewDelegate` for [`AppState`]: per-view notifications (frames,
//!   URL, title, load progress) and the navigation allow-list hook.
//!
//! Delegate callbacks run inside `servo.spin_event_loop()`, on the main
//! thread. They only take `try_borrow_mut` on shell state: if the shell is
//! already holding a borrow the update is dropped and logged rather than
//! panicking inside the engine.

use servo::{LoadStatus, NavigationRequest, WebView, WebViewDelegate};
use tracing::{debug, warn};
use url::Url;
use winit::event_loop::{EventLoop, EventLoopProxy};

use crate::browser::AppState;
use crate::sanitize::validate_url;

/// Marker sent through the winit `EventLoopProxy` when the engine has work
/// for the main thread. `user_event()` answers with `spin_event_loop()`.
#[derive(Debug)]
pub struct WakerEvent;

/// `Send + Sync` handle the engine's threads use to wake the main loop.
#[derive(Clone)]
pub struct Waker(EventLoopProxy<WakerEvent>);

impl Waker {
    pub fn new(event_loop: &EventLoop<WakerEvent>) -> Self {
        Self(event_loop.create_proxy())
    }
}

impl embedder_traits::EventLoopWaker for Waker {
    fn clone_box(&self) -> Box<dyn embedder_traits::EventLoopWaker> {
        Box::new(self.clone())
    }

    fn wake(&self) {
        if let Err(error) = self.0.send_event(WakerEvent) {
            warn!(?error, "Failed to wake the event loop");
        }
    }
}

impl WebViewDelegate for AppState {
    fn notify_new_frame_ready(&self, webview: WebView) {
        if self.is_active_view(&webview) {
            self.window.request_redraw();
        }
    }

    fn notify_url_changed(&self, webview: WebView, url: Url) {
        debug!(%url, "URL changed");
        let Some(active) = self.update_tab(&webview, |tab| tab.on_url_changed(url.clone())) else {
            return;
        };
        if active {
            match self.urlbar.try_borrow_mut() {
                Ok(mut urlbar) => urlbar.set_url(&url),
                Err(_) => debug!("URL bar busy, skipping address update"),
            }
            self.update_window_title();
        }
        self.window.request_redraw();
    }

    fn notify_page_title_changed(&self, webview: WebView, title: Option<String>) {
        if let Some(active) = self.update_tab(&webview, |tab| tab.on_title_changed(title)) {
            if active {
                self.update_window_title();
            }
            self.window.request_redraw();
        }
    }

    fn notify_load_status_changed(&self, webview: WebView, status: LoadStatus) {
        debug!(?status, "Load status changed");
        let updated = self.update_tab(&webview, |tab| match status {
            LoadStatus::Started => tab.on_load_started(),
            LoadStatus::HeadParsed => tab.on_load_head_parsed(),
            LoadStatus::Complete => tab.on_load_complete(),
        });
        if let Some(active) = updated {
            if active {
                self.update_window_title();
            }
            self.window.request_redraw();
        }
    }

    /// Every navigation, whether typed, scripted or a link click, must use an
    /// allowed scheme. Anything else is vetoed before the engine fetches it.
    fn request_navigation(&self, _webview: WebView, navigation_request: NavigationRequest) {
        match validate_url(&navigation_request.url) {
            Ok(()) => navigation_request.allow(),
            Err(error) => {
                warn!(url = %navigation_request.url, %error, "Blocked navigation");
                navigation_request.deny();
            }
        }
    }
}
