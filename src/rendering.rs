//! GPU rendering context setup.
//!
//! One window-backed context draws the chrome and receives the blit of the
//! offscreen framebuffer the engine paints web content into. All tabs share
//! the offscreen context; only the active tab paints.

use std::rc::Rc;

use servo::{OffscreenRenderingContext, RenderingContext, WindowRenderingContext};
use winit::dpi::PhysicalSize;
use winit::raw_window_handle::{DisplayHandle, WindowHandle};

use crate::error::{BrowserError, Result};

/// Creates a hardware-accelerated context bound to the winit window and
/// makes it current, as `WebViewBuilder` requires.
pub fn create_rendering_context(
    display_handle: DisplayHandle<'_>,
    window_handle: WindowHandle<'_>,
    size: PhysicalSize<u32>,
) -> Result<Rc<WindowRenderingContext>> {
    let context = WindowRenderingContext::new(display_handle, window_handle, size)
        .map_err(|e| BrowserError::Rendering(format!("{e:?}")))?;
    context
        .make_current()
        .map_err(|e| BrowserError::Rendering(format!("make_current: {e:?}")))?;
    Ok(Rc::new(context))
}

/// Creates the offscreen framebuffer for web content, sized to the area
/// below the chrome.
pub fn create_content_context(
    window_context: &WindowRenderingContext,
    window_size: PhysicalSize<u32>,
    chrome_height: u32,
) -> Rc<OffscreenRenderingContext> {
    Rc::new(window_context.offscreen_context(content_size(window_size, chrome_height)))
}

/// Window size minus the chrome.
pub fn content_size(window_size: PhysicalSize<u32>, chrome_height: u32) -> PhysicalSize<u32> {
    PhysicalSize::new(
        window_size.width,
        window_size.height.saturating_sub(chrome_height).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_size_subtracts_chrome() {
        assert_eq!(
            content_size(PhysicalSize::new(1400, 900), 86),
            PhysicalSize::new(1400, 814)
        );
    }

    #[test]
    fn test_content_size_never_zero() {
        assert_eq!(content_size(PhysicalSize::new(300, 50), 86), PhysicalSize::new(300, 1));
    }
}
