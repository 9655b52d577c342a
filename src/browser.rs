//! Window lifecycle, event routing and tab wiring.
//!
//! ## Two-phase app
//!
//! winit 0.30 only allows window creation inside `resumed()`, but the engine
//! needs a window handle for its rendering context. The app is therefore an
//! enum that starts out holding what `main` prepared and becomes the running
//! browser once the window exists:
//!
//! ```text
//! App::Initial { .. }  →  [resumed()]  →  App::Running(Rc<AppState>)
//! ```
//!
//! ## Window layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Chrome: tab strip + toolbar (GL)     │
//! ├──────────────────────────────────────┤
//! │ Active tab's view, painted offscreen │
//! │ and blitted into the remaining area  │
//! └──────────────────────────────────────┘
//! ```
//!
//! Input over the chrome is hit-tested into a [`BrowserCommand`]; keys go to
//! the shortcut table, then to the URL bar while it is focused, and otherwise
//! to the active view. Engine-bound coordinates are shifted up by the chrome
//! height.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use euclid::Scale;
use servo::{InputEvent, WheelDelta, WheelEvent, WheelMode};
use servo::{MouseButton as ServoMouseButton, MouseButtonAction, MouseButtonEvent};
use servo::{MouseLeftViewportEvent, MouseMoveEvent};
use servo::{
    OffscreenRenderingContext, RenderingContext, Servo, ServoBuilder, WebView, WebViewBuilder,
    WindowRenderingContext,
};
use tracing::{debug, error, info};
use url::Url;
use webrender_api::units::DevicePoint;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalPosition, LogicalSize};
use winit::event::{
    ElementState, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::{Window, WindowId};

use crate::chrome::{ChromeFrame, ChromeRenderer, TabLabel};
use crate::commands::{BrowserCommand, shortcut_command};
use crate::config::Config;
use crate::error::Result;
use crate::keyutils::{ConsumedKeys, keyboard_event_from_winit};
use crate::layout::{ChromeHit, ChromeLayout};
use crate::preferences::build_servo_preferences;
use crate::rendering;
use crate::resources;
use crate::security::SecurityIndicator;
use crate::servo_glue::{Waker, WakerEvent};
use crate::tabs::{CloseOutcome, Tab, Tabs};
use crate::urlbar::UrlBar;

/// Pixels scrolled per wheel "line".
const LINE_HEIGHT: f32 = 76.0;

/// State shared between the winit loop and the engine delegate.
///
/// Lives in an `Rc` because every view holds it as its delegate; everything
/// stays on the main thread.
pub struct AppState {
    pub window: Window,
    pub servo: Servo,

    /// Window surface: chrome drawing and the blit target.
    pub window_rendering_context: Rc<WindowRenderingContext>,

    /// Offscreen framebuffer shared by all views; only the active one paints.
    pub offscreen_context: Rc<OffscreenRenderingContext>,

    pub tabs: RefCell<Tabs<WebView>>,
    pub urlbar: RefCell<UrlBar>,
    pub chrome: ChromeRenderer,
    pub config: Config,

    /// Chrome element under the cursor, for hover highlighting.
    pub hovered: Cell<Option<ChromeHit>>,
    /// Cursor position in device pixels, window coordinates.
    pub cursor_position: Cell<DevicePoint>,
    pub modifiers: Cell<ModifiersState>,
    /// Keys whose press the shell handled; their release is not forwarded.
    pub consumed_keys: RefCell<ConsumedKeys>,

    /// Set when the last tab is closed; the loop exits after the event.
    pub exit_requested: Cell<bool>,
}

pub enum App {
    /// Waiting for winit to call `resumed()`.
    Initial {
        waker: Waker,
        config: Config,
        resources: PathBuf,
        initial_url: Url,
    },
    Running(Rc<AppState>),
}

impl App {
    pub fn new(
        event_loop: &EventLoop<WakerEvent>,
        config: Config,
        resources: PathBuf,
        initial_url: Url,
    ) -> Self {
        Self::Initial {
            waker: Waker::new(event_loop),
            config,
            resources,
            initial_url,
        }
    }
}

impl AppState {
    fn new(
        event_loop: &ActiveEventLoop,
        waker: Waker,
        config: Config,
        resources_dir: &Path,
    ) -> Result<Rc<Self>> {
        let display_handle = event_loop.display_handle()?;

        let window_attributes = Window::default_attributes()
            .with_title(&config.general.window_title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
            .with_position(LogicalPosition::new(config.window.x, config.window.y));
        let window = event_loop.create_window(window_attributes)?;
        let window_handle = window.window_handle()?;

        let size = window.inner_size();
        let window_rendering_context =
            rendering::create_rendering_context(display_handle, window_handle, size)?;
        let offscreen_context = rendering::create_content_context(
            &window_rendering_context,
            size,
            config.chrome.height(),
        );

        let font = resources::find_font(&config.chrome.font_path, Some(resources_dir));
        let chrome = unsafe {
            ChromeRenderer::new(
                window_rendering_context.glow_gl_api(),
                &config.chrome,
                font.as_deref(),
            )?
        };

        let servo = ServoBuilder::default()
            .preferences(build_servo_preferences(&config.engine))
            .event_loop_waker(Box::new(waker))
            .build();

        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            "Browser window ready"
        );

        Ok(Rc::new(Self {
            window,
            servo,
            window_rendering_context,
            offscreen_context,
            tabs: RefCell::new(Tabs::new()),
            urlbar: RefCell::new(UrlBar::new()),
            chrome,
            config,
            hovered: Cell::new(None),
            cursor_position: Cell::new(DevicePoint::zero()),
            modifiers: Cell::new(ModifiersState::default()),
            consumed_keys: RefCell::new(ConsumedKeys::default()),
            exit_requested: Cell::new(false),
        }))
    }

    fn chrome_height(&self) -> f32 {
        self.config.chrome.height() as f32
    }

    fn layout(&self) -> ChromeLayout {
        ChromeLayout::compute(
            self.window.inner_size().width,
            self.tabs.borrow().len(),
            &self.config.chrome,
        )
    }

    /// Handle to the active view, cloned so no borrow is held while the
    /// engine runs.
    fn active_view(&self) -> Option<WebView> {
        self.tabs.borrow().active().map(|tab| tab.view.clone())
    }

    pub(crate) fn is_active_view(&self, webview: &WebView) -> bool {
        self.tabs
            .try_borrow()
            .ok()
            .and_then(|tabs| tabs.active().map(|tab| tab.view.id() == webview.id()))
            .unwrap_or(false)
    }

    /// Applies `update` to the tab owning `webview`. Returns whether that tab
    /// is the active one, or `None` if it is unknown or the list is busy.
    pub(crate) fn update_tab(
        &self,
        webview: &WebView,
        update: impl FnOnce(&mut Tab<WebView>),
    ) -> Option<bool> {
        let Ok(mut tabs) = self.tabs.try_borrow_mut() else {
            debug!("Tab list busy, dropping engine notification");
            return None;
        };
        let id = webview.id();
        tabs.update_where(|view| view.id() == id, update)
    }

    pub(crate) fn update_window_title(&self) {
        let Ok(tabs) = self.tabs.try_borrow() else {
            return;
        };
        let base = &self.config.general.window_title;
        match tabs.active() {
            Some(tab) => self.window.set_title(&format!("{} - {base}", tab.title())),
            None => self.window.set_title(base),
        }
    }

    /// The configured home page, `about:blank` if it is not navigable.
    fn home_url(&self) -> Option<Url> {
        self.config
            .home_url_or_blank()
            .inspect_err(|error| error!(%error, "No fallback page"))
            .ok()
    }

    // ── Tabs ─────────────────────────────────────────────────────────────

    /// Creates a view for `url` in a new tab at the end of the strip and
    /// activates it.
    pub fn open_tab(self: &Rc<Self>, url: Url) {
        let webview = WebViewBuilder::new(
            &self.servo,
            self.offscreen_context.clone() as Rc<dyn RenderingContext>,
        )
        .url(url.clone())
        .hidpi_scale_factor(Scale::new(self.window.scale_factor() as f32))
        .delegate(self.clone())
        .build();

        let index = self.tabs.borrow_mut().push(Tab::new(webview));
        info!(index, %url, "Opened tab");
        self.sync_active_tab();
    }

    fn close_tab(&self, index: usize) {
        let outcome = self.tabs.borrow_mut().close(index);
        match outcome {
            CloseOutcome::Closed(tab) => {
                info!(index, url = ?tab.url().map(Url::as_str), "Closed tab");
                // Dropping the last handle closes the view in the engine.
                drop(tab);
                self.sync_active_tab();
            }
            CloseOutcome::LastTab => {
                info!("Last tab closed, exiting");
                self.exit_requested.set(true);
            }
            CloseOutcome::OutOfRange => debug!(index, "No tab to close"),
        }
    }

    /// Brings the URL bar, window title and keyboard focus in line with the
    /// active tab.
    fn sync_active_tab(&self) {
        let Some((view, url)) = self
            .tabs
            .borrow()
            .active()
            .map(|tab| (tab.view.clone(), tab.url().cloned()))
        else {
            return;
        };
        self.urlbar.borrow_mut().replace_url(url.as_ref());
        view.focus();
        self.update_window_title();
        self.window.request_redraw();
    }

    fn navigate(&self, url: Url) {
        let Some(view) = self.active_view() else {
            return;
        };
        info!(%url, "Navigating");
        self.urlbar.borrow_mut().set_url(&url);
        view.load(url);
        self.window.request_redraw();
    }

    // ── Commands ─────────────────────────────────────────────────────────

    pub fn execute(self: &Rc<Self>, command: BrowserCommand) {
        debug!(?command, "Executing command");
        match command {
            BrowserCommand::Back => {
                if let Some(view) = self.active_view() {
                    view.go_back(1);
                }
            }
            BrowserCommand::Forward => {
                if let Some(view) = self.active_view() {
                    view.go_forward(1);
                }
            }
            BrowserCommand::Reload => {
                if let Some(view) = self.active_view() {
                    view.reload();
                }
            }
            BrowserCommand::Stop => {
                // No direct stop call on the view; the page stops itself.
                if let Some(view) = self.active_view() {
                    view.evaluate_javascript("window.stop()", |_| {});
                }
            }
            BrowserCommand::Home => {
                if let Some(url) = self.home_url() {
                    self.navigate(url);
                }
            }
            BrowserCommand::NewTab => {
                if let Some(url) = self.home_url() {
                    self.open_tab(url);
                }
            }
            BrowserCommand::CloseTab(index) => self.close_tab(index),
            BrowserCommand::CloseActiveTab => {
                let index = self.tabs.borrow().active_index();
                self.close_tab(index);
            }
            BrowserCommand::SelectTab(index) => {
                if self.tabs.borrow_mut().select(index) {
                    self.sync_active_tab();
                }
            }
            BrowserCommand::SelectLastTab => {
                let changed = {
                    let mut tabs = self.tabs.borrow_mut();
                    let last = tabs.len().saturating_sub(1);
                    tabs.select(last)
                };
                if changed {
                    self.sync_active_tab();
                }
            }
            BrowserCommand::NextTab => {
                if self.tabs.borrow_mut().select_next() {
                    self.sync_active_tab();
                }
            }
            BrowserCommand::PreviousTab => {
                if self.tabs.borrow_mut().select_previous() {
                    self.sync_active_tab();
                }
            }
            BrowserCommand::MoveTabLeft => {
                if self.tabs.borrow_mut().move_active(-1) {
                    self.window.request_redraw();
                }
            }
            BrowserCommand::MoveTabRight => {
                if self.tabs.borrow_mut().move_active(1) {
                    self.window.request_redraw();
                }
            }
            BrowserCommand::FocusUrlBar => {
                self.urlbar.borrow_mut().focus();
                self.window.request_redraw();
            }
            BrowserCommand::Navigate(url) => self.navigate(url),
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    fn redraw(&self) {
        let size = self.window.inner_size();

        if let Some(view) = self.active_view() {
            view.paint();
        }

        self.window_rendering_context.prepare_for_rendering();

        if let Some(blit) = self.offscreen_context.render_to_parent_callback() {
            let gl = self.window_rendering_context.glow_gl_api();
            // GL origin is bottom-left: the content area starts at y = 0.
            let content = rendering::content_size(size, self.config.chrome.height());
            let target_rect = euclid::default::Rect::new(
                euclid::default::Point2D::new(0, 0),
                euclid::default::Size2D::new(content.width as i32, content.height as i32),
            );
            blit(&gl, target_rect);
        }

        let layout = self.layout();
        let tabs = self.tabs.borrow();
        let urlbar = self.urlbar.borrow();
        let labels: Vec<TabLabel> = tabs
            .iter()
            .map(|tab| TabLabel {
                title: tab.display_title(),
                loading: tab.is_loading(),
            })
            .collect();
        let active = tabs.active();
        let frame = ChromeFrame {
            layout: &layout,
            tabs: &labels,
            active_tab: tabs.active_index(),
            hovered: self.hovered.get(),
            url_text: urlbar.display_text(),
            url_focused: urlbar.is_focused(),
            cursor: urlbar.is_focused().then(|| urlbar.cursor_char_offset()),
            security: SecurityIndicator::for_url(active.and_then(Tab::url)),
            progress: active
                .filter(|tab| tab.is_loading())
                .map(Tab::progress),
        };
        unsafe {
            self.chrome.draw(size.width, size.height, &frame);
        }

        self.window_rendering_context.present();
    }

    // ── Input ────────────────────────────────────────────────────────────

    /// Cursor position translated into the content area, if it is there.
    fn content_point(&self, point: DevicePoint) -> Option<DevicePoint> {
        let chrome_height = self.chrome_height();
        (point.y >= chrome_height).then(|| DevicePoint::new(point.x, point.y - chrome_height))
    }

    fn on_cursor_moved(&self, point: DevicePoint) {
        self.cursor_position.set(point);

        let content = self.content_point(point);
        let hovered = match content {
            Some(_) => None,
            None => self.layout().hit_test(point.x, point.y),
        };
        if self.hovered.replace(hovered) != hovered {
            self.window.request_redraw();
        }

        if let Some(content) = content
            && let Some(view) = self.active_view()
        {
            view.notify_input_event(InputEvent::MouseMove(MouseMoveEvent::new(content.into())));
        }
    }

    fn on_mouse_input(self: &Rc<Self>, button_state: ElementState, button: WinitMouseButton) {
        let point = self.cursor_position.get();
        let url_bar_focused = self.urlbar.borrow().is_focused();

        let Some(content) = self.content_point(point) else {
            if button_state != ElementState::Pressed {
                return;
            }
            let hit = self.layout().hit_test(point.x, point.y);
            if url_bar_focused && hit != Some(ChromeHit::UrlBar) {
                self.urlbar.borrow_mut().unfocus();
                self.window.request_redraw();
            }
            let loading = self.tabs.borrow().active().is_some_and(Tab::is_loading);
            let command = match (button, hit) {
                // A click inside the field being edited must not reselect.
                (WinitMouseButton::Left, Some(ChromeHit::UrlBar)) if url_bar_focused => None,
                (WinitMouseButton::Left, Some(hit)) => hit.click_command(loading),
                (WinitMouseButton::Middle, Some(hit)) => hit.middle_click_command(),
                _ => None,
            };
            if let Some(command) = command {
                self.execute(command);
            }
            return;
        };

        if button_state == ElementState::Pressed && url_bar_focused {
            self.urlbar.borrow_mut().unfocus();
            self.window.request_redraw();
        }

        if let Some(view) = self.active_view() {
            let action = match button_state {
                ElementState::Pressed => MouseButtonAction::Down,
                ElementState::Released => MouseButtonAction::Up,
            };
            view.notify_input_event(InputEvent::MouseButton(MouseButtonEvent::new(
                action,
                servo_mouse_button(button),
                content.into(),
            )));
        }
    }

    fn on_mouse_wheel(&self, delta: MouseScrollDelta) {
        let Some(content) = self.content_point(self.cursor_position.get()) else {
            return;
        };
        let Some(view) = self.active_view() else {
            return;
        };
        let (x, y, mode) = match delta {
            MouseScrollDelta::LineDelta(dx, dy) => (
                (dx * LINE_HEIGHT) as f64,
                (dy * LINE_HEIGHT) as f64,
                WheelMode::DeltaLine,
            ),
            MouseScrollDelta::PixelDelta(delta) => (delta.x, delta.y, WheelMode::DeltaPixel),
        };
        view.notify_input_event(InputEvent::Wheel(WheelEvent::new(
            WheelDelta { x, y, z: 0.0, mode },
            content.into(),
        )));
    }

    fn on_keyboard_input(self: &Rc<Self>, event: KeyEvent) {
        let mods = self.modifiers.get();
        let url_bar_focused = self.urlbar.borrow().is_focused();

        if event.state == ElementState::Pressed {
            if let Some(command) = shortcut_command(&event.logical_key, mods, url_bar_focused) {
                self.consumed_keys.borrow_mut().consume(event.physical_key);
                self.execute(command);
                return;
            }
            if url_bar_focused {
                self.consumed_keys.borrow_mut().consume(event.physical_key);
                self.edit_url_bar(&event.logical_key, mods);
                return;
            }
        } else if self.consumed_keys.borrow_mut().release(event.physical_key) || url_bar_focused {
            return;
        }

        if let Some(view) = self.active_view() {
            view.notify_input_event(InputEvent::Keyboard(keyboard_event_from_winit(&event, mods)));
        }
    }

    fn edit_url_bar(self: &Rc<Self>, key: &Key, mods: ModifiersState) {
        let mut urlbar = self.urlbar.borrow_mut();
        match key {
            Key::Named(NamedKey::Enter) => {
                let submitted = urlbar.submit(&self.config.search.engine_url);
                drop(urlbar);
                match submitted {
                    Ok(url) => self.execute(BrowserCommand::Navigate(url)),
                    Err(error) => debug!(%error, "URL bar input rejected"),
                }
            }
            Key::Named(NamedKey::Escape) => urlbar.unfocus(),
            Key::Named(NamedKey::Backspace) => urlbar.backspace(),
            Key::Named(NamedKey::Delete) => urlbar.delete(),
            Key::Named(NamedKey::ArrowLeft) => urlbar.move_cursor_left(),
            Key::Named(NamedKey::ArrowRight) => urlbar.move_cursor_right(),
            Key::Named(NamedKey::Home) => urlbar.home(),
            Key::Named(NamedKey::End) => urlbar.end(),
            Key::Named(NamedKey::Space) if !mods.control_key() && !mods.alt_key() => {
                urlbar.insert_char(' ')
            }
            Key::Character(c) if mods.control_key() && c.eq_ignore_ascii_case("a") => {
                urlbar.select_all()
            }
            Key::Character(c) if !mods.control_key() && !mods.alt_key() => {
                c.chars().for_each(|ch| urlbar.insert_char(ch))
            }
            _ => {}
        }
        self.window.request_redraw();
    }
}

fn servo_mouse_button(button: WinitMouseButton) -> ServoMouseButton {
    match button {
        WinitMouseButton::Left => ServoMouseButton::Left,
        WinitMouseButton::Right => ServoMouseButton::Right,
        WinitMouseButton::Middle => ServoMouseButton::Middle,
        WinitMouseButton::Back => ServoMouseButton::Back,
        WinitMouseButton::Forward => ServoMouseButton::Forward,
        WinitMouseButton::Other(id) => ServoMouseButton::Other(id),
    }
}

impl ApplicationHandler<WakerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Self::Initial {
            waker,
            config,
            resources,
            initial_url,
        } = self
        else {
            return;
        };

        match AppState::new(event_loop, waker.clone(), config.clone(), resources.as_path()) {
            Ok(state) => {
                state.open_tab(initial_url.clone());
                *self = Self::Running(state);
            }
            Err(error) => {
                error!(%error, "Failed to start the browser");
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, _event: WakerEvent) {
        if let Self::Running(state) = self {
            state.servo.spin_event_loop();
            if state.exit_requested.get() {
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Self::Running(state) = self else {
            return;
        };
        state.servo.spin_event_loop();

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => state.redraw(),
            WindowEvent::Resized(new_size) => {
                state.window_rendering_context.resize(new_size);
                state
                    .offscreen_context
                    .resize(rendering::content_size(new_size, state.config.chrome.height()));
                state.window.request_redraw();
            }
            WindowEvent::ModifiersChanged(modifiers) => state.modifiers.set(modifiers.state()),
            WindowEvent::CursorMoved { position, .. } => {
                state.on_cursor_moved(DevicePoint::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                if state.hovered.take().is_some() {
                    state.window.request_redraw();
                }
                if let Some(view) = state.active_view() {
                    view.notify_input_event(InputEvent::MouseLeftViewport(
                        MouseLeftViewportEvent::default(),
                    ));
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => state.on_mouse_input(button_state, button),
            WindowEvent::MouseWheel { delta, .. } => state.on_mouse_wheel(delta),
            WindowEvent::KeyboardInput { event, .. } => state.on_keyboard_input(event),
            _ => (),
        }

        if state.exit_requested.get() {
            event_loop.exit();
        }
    }
}
