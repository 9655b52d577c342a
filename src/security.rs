//! Connection security indicator shown next to the URL field.

use url::Url;

use crate::config::ChromeColors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityIndicator {
    /// `https://`
    Secure,
    /// `http://`
    Insecure,
    /// Everything else (`about:`, `file://`, no page yet).
    Neutral,
}

impl SecurityIndicator {
    pub fn for_url(url: Option<&Url>) -> Self {
        match url.map(Url::scheme) {
            Some("https") => Self::Secure,
            Some("http") => Self::Insecure,
            _ => Self::Neutral,
        }
    }

    /// Preferred glyph, then an ASCII fallback for fonts without it.
    pub fn glyphs(self) -> (char, char) {
        match self {
            Self::Secure => ('🔒', 'S'),
            Self::Insecure => ('⚠', '!'),
            Self::Neutral => ('ℹ', 'i'),
        }
    }

    pub fn color(self, colors: &ChromeColors) -> [f32; 4] {
        match self {
            Self::Secure => colors.secure,
            Self::Insecure => colors.insecure,
            Self::Neutral => colors.neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(s: &str) -> SecurityIndicator {
        SecurityIndicator::for_url(Some(&Url::parse(s).unwrap()))
    }

    #[test]
    fn test_indicator_by_scheme() {
        assert_eq!(indicator("https://example.com"), SecurityIndicator::Secure);
        assert_eq!(indicator("http://example.com"), SecurityIndicator::Insecure);
        assert_eq!(indicator("about:blank"), SecurityIndicator::Neutral);
        assert_eq!(indicator("file:///tmp/a.html"), SecurityIndicator::Neutral);
        assert_eq!(SecurityIndicator::for_url(None), SecurityIndicator::Neutral);
    }

    #[test]
    fn test_indicator_colors() {
        let colors = ChromeColors::default();
        assert_eq!(SecurityIndicator::Secure.color(&colors), colors.secure);
        assert_eq!(SecurityIndicator::Insecure.color(&colors), colors.insecure);
        assert_eq!(SecurityIndicator::Neutral.color(&colors), colors.neutral);
    }
}
