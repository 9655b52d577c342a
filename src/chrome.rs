//! GPU rendering of the browser chrome (tab strip, toolbar, URL field).
//!
//! `glow` issues the GL calls, `fontdue` rasterizes glyphs on the CPU. The
//! glyphs are packed into a single-channel atlas texture at startup and drawn
//! as textured quads; everything else is flat-coloured quads. Geometry comes
//! from [`crate::layout::ChromeLayout`], so this module only paints.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glow::HasContext;
use tracing::{info, warn};

use crate::config::{ChromeColors, ChromeConfig};
use crate::error::{BrowserError, Result};
use crate::layout::{ChromeHit, ChromeLayout, Rect};
use crate::security::SecurityIndicator;

const VERTEX_SHADER: &str = r#"#version 300 es
precision mediump float;
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;
uniform mat4 u_projection;
out vec2 v_uv;
void main() {
    gl_Position = u_projection * vec4(a_position, 0.0, 1.0);
    v_uv = a_uv;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
in vec2 v_uv;
uniform sampler2D u_texture;
uniform vec4 u_color;
uniform bool u_use_texture;
out vec4 fragColor;
void main() {
    if (u_use_texture) {
        float alpha = texture(u_texture, v_uv).r;
        fragColor = vec4(u_color.rgb, u_color.a * alpha);
    } else {
        fragColor = u_color;
    }
}
"#;

const URL_PLACEHOLDER: &str = "Enter URL or search...";

/// Non-ASCII glyphs used by the chrome itself; kept only if the font has them.
const SYMBOLS: &[char] = &['◀', '▶', '↻', '⌂', '×', '⚠', 'ℹ', '🔒', '…'];

const ATLAS_WIDTH: u32 = 512;

struct GlyphInfo {
    atlas_x: u32,
    atlas_y: u32,
    width: u32,
    height: u32,
    advance_x: f32,
    offset_x: f32,
    /// Bottom edge relative to the baseline (positive = up).
    offset_y: f32,
}

/// Pre-rasterized glyphs packed row by row into one texture.
struct GlyphAtlas {
    width: u32,
    height: u32,
    glyphs: HashMap<char, GlyphInfo>,
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    fn charset(font: &fontdue::Font) -> Vec<char> {
        let printable_ascii = (0x20u8..=0x7e).map(char::from);
        let latin1 = (0xa1u8..=0xff).map(char::from);
        printable_ascii
            .chain(latin1.chain(SYMBOLS.iter().copied()).filter(|&c| font.lookup_glyph_index(c) != 0))
            .collect()
    }

    fn build(font: &fontdue::Font, font_size: f32) -> Self {
        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = Self::charset(font)
            .into_iter()
            .map(|c| {
                let (metrics, bitmap) = font.rasterize(c, font_size);
                (c, metrics, bitmap)
            })
            .collect();

        let mut glyphs = HashMap::with_capacity(rasterized.len());
        let (mut x, mut y, mut row_height) = (0u32, 0u32, 0u32);

        for (c, metrics, _) in &rasterized {
            let (w, h) = (metrics.width as u32, metrics.height as u32);
            if x + w > ATLAS_WIDTH {
                x = 0;
                y += row_height + 1;
                row_height = 0;
            }
            row_height = row_height.max(h);
            glyphs.insert(
                *c,
                GlyphInfo {
                    atlas_x: x,
                    atlas_y: y,
                    width: w,
                    height: h,
                    advance_x: metrics.advance_width,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                },
            );
            x += w + 1;
        }

        let height = (y + row_height + 1).next_power_of_two().max(64);
        let mut pixels = vec![0u8; (ATLAS_WIDTH * height) as usize];
        for (c, _, bitmap) in &rasterized {
            let info = &glyphs[c];
            for row in 0..info.height {
                let src = (row * info.width) as usize;
                let dst = ((info.atlas_y + row) * ATLAS_WIDTH + info.atlas_x) as usize;
                let len = info.width as usize;
                if src + len <= bitmap.len() && dst + len <= pixels.len() {
                    pixels[dst..dst + len].copy_from_slice(&bitmap[src..src + len]);
                }
            }
        }

        Self {
            width: ATLAS_WIDTH,
            height,
            glyphs,
            pixels,
        }
    }

    /// `preferred` if the font has it, otherwise `fallback`.
    fn pick(&self, preferred: char, fallback: char) -> char {
        if self.glyphs.contains_key(&preferred) {
            preferred
        } else {
            fallback
        }
    }

    fn advance(&self, c: char, font_size: f32) -> f32 {
        self.glyphs
            .get(&c)
            .or_else(|| self.glyphs.get(&' '))
            .map_or(font_size * 0.5, |g| g.advance_x)
    }

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|c| self.advance(c, font_size)).sum()
    }
}

/// Per-tab data the renderer needs.
pub struct TabLabel {
    pub title: String,
    pub loading: bool,
}

/// Everything that varies between two chrome frames.
pub struct ChromeFrame<'a> {
    pub layout: &'a ChromeLayout,
    pub tabs: &'a [TabLabel],
    pub active_tab: usize,
    pub hovered: Option<ChromeHit>,
    pub url_text: &'a str,
    pub url_focused: bool,
    /// Characters before the cursor, when the URL field is focused.
    pub cursor: Option<usize>,
    pub security: SecurityIndicator,
    /// Active tab load progress, 0–100, `None` when idle.
    pub progress: Option<u8>,
}

struct Uniforms {
    projection: glow::UniformLocation,
    color: glow::UniformLocation,
    use_texture: glow::UniformLocation,
    texture: glow::UniformLocation,
}

/// OpenGL renderer for the chrome area at the top of the window.
pub struct ChromeRenderer {
    gl: Arc<glow::Context>,
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    uniforms: Uniforms,
    /// `None` when no usable font was found: shapes only.
    text: Option<(GlyphAtlas, glow::Texture)>,
    colors: ChromeColors,
    font_size: f32,
}

fn load_font(path: &Path) -> Result<fontdue::Font> {
    let bytes = std::fs::read(path).map_err(|e| BrowserError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).map_err(|reason| {
        BrowserError::Font {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    })
}

#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn compile_shader(gl: &glow::Context, kind: u32, source: &str) -> Result<glow::Shader> {
    let shader = gl.create_shader(kind).map_err(BrowserError::Rendering)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(BrowserError::Rendering(format!("shader compile error: {log}")));
    }
    Ok(shader)
}

fn uniform(gl: &glow::Context, program: glow::Program, name: &str) -> Result<glow::UniformLocation> {
    unsafe { gl.get_uniform_location(program, name) }
        .ok_or_else(|| BrowserError::Rendering(format!("missing uniform {name}")))
}

#[allow(unsafe_op_in_unsafe_fn)]
impl ChromeRenderer {
    /// Compiles the shaders and uploads the glyph atlas.
    ///
    /// # Safety
    /// A GL context must be current.
    pub unsafe fn new(
        gl: Arc<glow::Context>,
        config: &ChromeConfig,
        font_path: Option<&Path>,
    ) -> Result<Self> {
        let vs = compile_shader(&gl, glow::VERTEX_SHADER, VERTEX_SHADER)?;
        let fs = compile_shader(&gl, glow::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = gl.create_program().map_err(BrowserError::Rendering)?;
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        if !gl.get_program_link_status(program) {
            return Err(BrowserError::Rendering(format!(
                "shader link error: {}",
                gl.get_program_info_log(program)
            )));
        }

        let uniforms = Uniforms {
            projection: uniform(&gl, program, "u_projection")?,
            color: uniform(&gl, program, "u_color")?,
            use_texture: uniform(&gl, program, "u_use_texture")?,
            texture: uniform(&gl, program, "u_texture")?,
        };

        // [x, y, u, v] per vertex, 6 vertices per quad.
        let vao = gl.create_vertex_array().map_err(BrowserError::Rendering)?;
        gl.bind_vertex_array(Some(vao));
        let vbo = gl.create_buffer().map_err(BrowserError::Rendering)?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        let float = std::mem::size_of::<f32>() as i32;
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 4 * float, 0);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 4 * float, 2 * float);
        gl.enable_vertex_attrib_array(1);
        gl.bind_vertex_array(None);

        let text = match font_path.map(load_font) {
            Some(Ok(font)) => {
                let atlas = GlyphAtlas::build(&font, config.font_size);
                let texture = Self::upload_atlas(&gl, &atlas)?;
                info!(glyphs = atlas.glyphs.len(), height = atlas.height, "Glyph atlas ready");
                Some((atlas, texture))
            }
            Some(Err(e)) => {
                warn!(error = %e, "Chrome text disabled");
                None
            }
            None => {
                warn!("No font found for the chrome; set chrome.font_path in config.toml");
                None
            }
        };

        Ok(Self {
            gl,
            program,
            vao,
            vbo,
            uniforms,
            text,
            colors: config.colors.clone(),
            font_size: config.font_size,
        })
    }

    unsafe fn upload_atlas(gl: &glow::Context, atlas: &GlyphAtlas) -> Result<glow::Texture> {
        let texture = gl.create_texture().map_err(BrowserError::Rendering)?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        for (param, value) in [
            (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
            (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
            (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
            (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
        ] {
            gl.tex_parameter_i32(glow::TEXTURE_2D, param, value as i32);
        }
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::R8 as i32,
            atlas.width as i32,
            atlas.height as i32,
            0,
            glow::RED,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&atlas.pixels)),
        );
        Ok(texture)
    }

    /// Paints the whole chrome for one frame.
    ///
    /// # Safety
    /// A GL context must be current.
    pub unsafe fn draw(&self, window_width: u32, window_height: u32, frame: &ChromeFrame<'_>) {
        let gl = &self.gl;
        let (w, h) = (window_width as f32, window_height as f32);
        let c = &self.colors;
        let layout = frame.layout;

        let prev_blend = gl.is_enabled(glow::BLEND);
        let prev_depth = gl.is_enabled(glow::DEPTH_TEST);
        let prev_scissor = gl.is_enabled(glow::SCISSOR_TEST);

        gl.viewport(0, 0, window_width as i32, window_height as i32);
        gl.disable(glow::DEPTH_TEST);
        gl.disable(glow::SCISSOR_TEST);
        gl.enable(glow::BLEND);
        gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        gl.use_program(Some(self.program));

        // Top-left origin orthographic projection.
        #[rustfmt::skip]
        let projection: [f32; 16] = [
            2.0 / w,  0.0,      0.0, 0.0,
            0.0,     -2.0 / h,  0.0, 0.0,
            0.0,      0.0,     -1.0, 0.0,
           -1.0,      1.0,      0.0, 1.0,
        ];
        gl.uniform_matrix_4_f32_slice(Some(&self.uniforms.projection), false, &projection);
        gl.uniform_1_i32(Some(&self.uniforms.texture), 0);
        gl.bind_vertex_array(Some(self.vao));
        if let Some((_, texture)) = self.text {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        }

        // ── Tab strip ────────────────────────────────────────────────────
        self.fill(layout.tab_strip, c.tab_strip);
        for (i, (rect, label)) in layout.tabs.iter().zip(frame.tabs).enumerate() {
            let active = i == frame.active_tab;
            let hovered = matches!(frame.hovered, Some(ChromeHit::Tab(j) | ChromeHit::CloseTab(j)) if j == i);
            let bg = match (active, hovered) {
                (true, _) => c.tab_active,
                (false, true) => c.tab_hover,
                (false, false) => c.tab,
            };
            self.fill(rect.tab, bg);
            if active {
                self.fill(Rect::new(rect.tab.x, rect.tab.bottom() - 3.0, rect.tab.w, 3.0), c.accent);
            }
            let text_color = if active { c.tab_active_text } else { c.tab_text };
            let title_color = if label.loading { c.tab_text } else { text_color };
            self.text_in(
                Rect::new(rect.tab.x + 12.0, rect.tab.y, rect.close.x - rect.tab.x - 16.0, rect.tab.h),
                &label.title,
                title_color,
            );
            if frame.hovered == Some(ChromeHit::CloseTab(i)) {
                self.fill(rect.close, c.tab_hover);
            }
            self.glyph_centered(rect.close, ('×', 'x'), text_color);
        }
        self.fill(
            Rect::new(0.0, layout.tab_strip.bottom() - 1.0, layout.width, 1.0),
            c.border,
        );

        // ── Toolbar ──────────────────────────────────────────────────────
        self.fill(layout.toolbar, c.toolbar);
        let loading = frame.progress.is_some();
        for (button, rect) in &layout.buttons {
            let hovered = frame.hovered == Some(ChromeHit::Button(*button));
            self.button(*rect, hovered, button.glyphs(loading));
        }
        let new_tab_hovered = frame.hovered == Some(ChromeHit::NewTab);
        self.button(layout.new_tab, new_tab_hovered, ('+', '+'));

        // URL field
        let field = layout.url_field;
        let border = if frame.url_focused { c.accent } else { c.border };
        self.fill(field, border);
        let inner = Rect::new(field.x + 2.0, field.y + 2.0, field.w - 4.0, field.h - 4.0);
        self.fill(inner, if frame.url_focused { c.url_field_focused } else { c.url_field });
        let text_rect = Rect::new(inner.x + 14.0, inner.y, inner.w - 28.0, inner.h);
        if frame.url_text.is_empty() && !frame.url_focused {
            self.text_in(text_rect, URL_PLACEHOLDER, c.tab_text);
        } else {
            let end_x = self.text_in(text_rect, frame.url_text, c.url_text);
            if let Some(offset) = frame.cursor {
                let cursor_x = text_rect.x + self.prefix_width(frame.url_text, offset);
                let cursor_h = self.font_size + 4.0;
                if cursor_x <= end_x.max(text_rect.x) + 1.0 {
                    self.fill(
                        Rect::new(cursor_x, field.y + (field.h - cursor_h) / 2.0, 2.0, cursor_h),
                        c.url_text,
                    );
                }
            }
        }

        // Security indicator
        let security_color = frame.security.color(c);
        if frame.hovered == Some(ChromeHit::Security) {
            let mut tint = security_color;
            tint[3] = 0.2;
            self.fill(layout.security, tint);
        }
        self.glyph_centered(layout.security, frame.security.glyphs(), security_color);

        // Load progress under the toolbar
        self.fill(
            Rect::new(0.0, layout.toolbar.bottom() - 2.0, layout.width, 2.0),
            c.border,
        );
        if let Some(progress) = frame.progress {
            let pw = layout.width * f32::from(progress.min(100)) / 100.0;
            self.fill(Rect::new(0.0, layout.toolbar.bottom() - 2.0, pw, 2.0), c.accent);
        }

        gl.bind_vertex_array(None);
        gl.use_program(None);
        if prev_depth {
            gl.enable(glow::DEPTH_TEST);
        }
        if !prev_blend {
            gl.disable(glow::BLEND);
        }
        if prev_scissor {
            gl.enable(glow::SCISSOR_TEST);
        }
    }

    unsafe fn button(&self, rect: Rect, hovered: bool, glyphs: (char, char)) {
        let c = &self.colors;
        if hovered {
            self.fill(rect, c.accent);
            self.fill(Rect::new(rect.x + 2.0, rect.y + 2.0, rect.w - 4.0, rect.h - 4.0), c.tab_hover);
        } else {
            self.fill(rect, c.button);
        }
        self.glyph_centered(rect, glyphs, c.button_text);
    }

    fn prefix_width(&self, text: &str, chars: usize) -> f32 {
        match self.text {
            Some((ref atlas, _)) => text
                .chars()
                .take(chars)
                .map(|ch| atlas.advance(ch, self.font_size))
                .sum(),
            None => 0.0,
        }
    }

    unsafe fn glyph_centered(&self, rect: Rect, (preferred, fallback): (char, char), color: [f32; 4]) {
        let Some((ref atlas, _)) = self.text else {
            return;
        };
        let ch = atlas.pick(preferred, fallback);
        let mut buf = [0u8; 4];
        let s: &str = ch.encode_utf8(&mut buf);
        let width = atlas.text_width(s, self.font_size);
        let area = Rect::new(rect.x + (rect.w - width) / 2.0, rect.y, width + 1.0, rect.h);
        self.text_in(area, s, color);
    }

    /// Draws `text` vertically centred in `area`, clipped at its right edge.
    /// Returns the pen position after the last drawn glyph.
    unsafe fn text_in(&self, area: Rect, text: &str, color: [f32; 4]) -> f32 {
        let Some((ref atlas, _)) = self.text else {
            return area.x;
        };
        let baseline = area.y + area.h / 2.0 + self.font_size / 3.0;
        let max_x = area.right();
        let mut pen_x = area.x;

        for ch in text.chars() {
            let advance = atlas.advance(ch, self.font_size);
            if pen_x + advance > max_x {
                break;
            }
            if let Some(g) = atlas.glyphs.get(&ch)
                && g.width > 0
                && g.height > 0
            {
                let gx = pen_x + g.offset_x;
                let gy = baseline - g.offset_y - g.height as f32;
                self.textured_quad(atlas, Rect::new(gx, gy, g.width as f32, g.height as f32), g, color);
            }
            pen_x += advance;
        }
        pen_x
    }

    unsafe fn fill(&self, r: Rect, color: [f32; 4]) {
        if r.w <= 0.0 || r.h <= 0.0 {
            return;
        }
        self.gl.uniform_1_i32(Some(&self.uniforms.use_texture), 0);
        self.gl.uniform_4_f32_slice(Some(&self.uniforms.color), &color);
        self.quad(r, [0.0, 0.0, 0.0, 0.0]);
    }

    unsafe fn textured_quad(&self, atlas: &GlyphAtlas, r: Rect, g: &GlyphInfo, color: [f32; 4]) {
        self.gl.uniform_1_i32(Some(&self.uniforms.use_texture), 1);
        self.gl.uniform_4_f32_slice(Some(&self.uniforms.color), &color);
        let (aw, ah) = (atlas.width as f32, atlas.height as f32);
        self.quad(
            r,
            [
                g.atlas_x as f32 / aw,
                g.atlas_y as f32 / ah,
                (g.atlas_x + g.width) as f32 / aw,
                (g.atlas_y + g.height) as f32 / ah,
            ],
        );
    }

    /// Two triangles covering `r`, with `[u0, v0, u1, v1]` texture coords.
    unsafe fn quad(&self, r: Rect, [u0, v0, u1, v1]: [f32; 4]) {
        let (x0, y0, x1, y1) = (r.x, r.y, r.right(), r.bottom());
        #[rustfmt::skip]
        let vertices: [f32; 24] = [
            x0, y0, u0, v0,
            x1, y0, u1, v0,
            x1, y1, u1, v1,
            x0, y0, u0, v0,
            x1, y1, u1, v1,
            x0, y1, u0, v1,
        ];
        self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        self.gl
            .buffer_data_u8_slice(glow::ARRAY_BUFFER, f32_bytes(&vertices), glow::DYNAMIC_DRAW);
        self.gl.draw_arrays(glow::TRIANGLES, 0, 6);
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        unsafe {
            if let Some((_, texture)) = self.text {
                self.gl.delete_texture(texture);
            }
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_program(self.program);
        }
    }
}

/// `[f32]` viewed as bytes for the GL upload.
fn f32_bytes(data: &[f32]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data)) }
}
