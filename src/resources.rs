//! Servo resource reader and on-disk resource lookup.
//!
//! Servo needs a directory of support files (preferences, certificates,
//! public suffix list, ...). The embedder resolves that directory once and
//! registers a `ResourceReaderMethods` implementation through
//! `servo::resources::set()` before building the engine.
//!
//! Lookup order for `resources/`:
//! 1. `SERVO_RESOURCES_PATH` environment variable
//! 2. Next to the executable (`<exe_dir>/resources/`)
//! 3. Project root when running from `target/{debug,release}/`
//! 4. Current working directory (`./resources/`)
//!
//! The same directory also holds `fonts/`, searched by the chrome renderer.

use std::path::{Path, PathBuf};
use std::{env, fs};

use servo::resources::{self, Resource};
use tracing::{debug, info};

use crate::error::{BrowserError, Result};

/// System fonts tried when neither the config nor `resources/fonts/`
/// provides one.
const SYSTEM_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

/// Resolves the resources directory and registers the Servo reader.
///
/// Must run before `ServoBuilder::build()`.
pub fn init() -> Result<PathBuf> {
    let dir = resources_dir().ok_or(BrowserError::ResourcesNotFound)?;
    let dir = dir.canonicalize()?;
    info!(path = %dir.display(), "Servo resources directory");
    resources::set(Box::new(ResourceReader { dir: dir.clone() }));
    Ok(dir)
}

struct ResourceReader {
    /// Canonical path.
    dir: PathBuf,
}

impl resources::ResourceReaderMethods for ResourceReader {
    fn read(&self, file: Resource) -> Vec<u8> {
        let path = contained_path(&self.dir, file.filename()).unwrap_or_else(|| {
            panic!(
                "Resource '{}' is missing or escapes {}",
                file.filename(),
                self.dir.display()
            )
        });
        fs::read(&path)
            .unwrap_or_else(|e| panic!("Cannot read Servo resource {}: {e}", path.display()))
    }

    fn sandbox_access_files_dirs(&self) -> Vec<PathBuf> {
        vec![self.dir.clone()]
    }

    fn sandbox_access_files(&self) -> Vec<PathBuf> {
        vec![]
    }
}

/// Joins `name` onto `base` and returns the canonical result only if it
/// exists and stays inside `base` (no `..` or symlink escape).
fn contained_path(base: &Path, name: &str) -> Option<PathBuf> {
    let canonical = base.join(name).canonicalize().ok()?;
    canonical.starts_with(base).then_some(canonical)
}

fn resources_dir() -> Option<PathBuf> {
    if let Ok(path) = env::var("SERVO_RESOURCES_PATH") {
        let path = PathBuf::from(path);
        if path.is_dir() {
            return Some(path);
        }
    }

    if let Ok(exe) = env::current_exe()
        && let Ok(exe) = exe.canonicalize()
        && let Some(exe_dir) = exe.parent()
    {
        let path = exe_dir.join("resources");
        if path.is_dir() {
            return Some(path);
        }

        // Running from target/{debug,release}/ during development.
        if let Some(target_dir) = exe_dir.parent()
            && target_dir.file_name().is_some_and(|n| n == "target")
            && let Some(project_root) = target_dir.parent()
        {
            let path = project_root.join("resources");
            if path.is_dir() {
                return Some(path);
            }
        }
    }

    let path = env::current_dir().ok()?.join("resources");
    path.is_dir().then_some(path)
}

/// Finds a font for the chrome: explicit path, then the first `.ttf`/`.otf`
/// in `<resources>/fonts/`, then well-known system fonts.
pub fn find_font(configured: &str, resources: Option<&Path>) -> Option<PathBuf> {
    if !configured.is_empty() {
        let path = PathBuf::from(configured);
        if path.is_file() {
            return Some(path);
        }
        debug!(path = configured, "Configured font not found");
    }

    if let Some(dir) = resources
        && let Ok(entries) = fs::read_dir(dir.join("fonts"))
    {
        let mut fonts: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
            })
            .collect();
        fonts.sort();
        if let Some(font) = fonts.into_iter().next() {
            return Some(font);
        }
    }

    SYSTEM_FONTS.iter().map(PathBuf::from).find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("kali-browser-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir.canonicalize().unwrap()
    }

    #[test]
    fn test_contained_path_accepts_files_inside() {
        let dir = scratch_dir("inside");
        fs::write(dir.join("prefs.json"), "{}").unwrap();
        assert_eq!(contained_path(&dir, "prefs.json"), Some(dir.join("prefs.json")));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_contained_path_rejects_traversal() {
        let dir = scratch_dir("traversal");
        let sub = dir.join("res");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.join("secret.txt"), "x").unwrap();
        assert_eq!(contained_path(&sub, "../secret.txt"), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_contained_path_rejects_missing() {
        let dir = scratch_dir("missing");
        assert_eq!(contained_path(&dir, "nope.txt"), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_find_font_prefers_configured_path() {
        let dir = scratch_dir("font-configured");
        let font = dir.join("Mine.ttf");
        fs::write(&font, b"not really a font").unwrap();
        let found = find_font(font.to_str().unwrap(), None);
        assert_eq!(found, Some(font));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_find_font_in_resources() {
        let dir = scratch_dir("font-resources");
        fs::create_dir_all(dir.join("fonts")).unwrap();
        fs::write(dir.join("fonts").join("readme.txt"), "").unwrap();
        fs::write(dir.join("fonts").join("B.otf"), "").unwrap();
        fs::write(dir.join("fonts").join("A.TTF"), "").unwrap();
        let found = find_font("", Some(&dir));
        assert_eq!(found, Some(dir.join("fonts").join("A.TTF")));
        fs::remove_dir_all(&dir).unwrap();
    }
}
