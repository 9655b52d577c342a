//! URL sanitization and the navigation allow-list.
//!
//! Turns whatever the user typed into something the engine may load:
//!
//! ```text
//! "  example.com "   → https://example.com/
//! "localhost"        → https://localhost/
//! "hello world"      → <search prefix>hello+world
//! "about:blank"      → about:blank           (passed through)
//! "file:///tmp/a"    → file:///tmp/a         (passed through)
//! "ftp://x"          → rejected (scheme)
//! ""                 → rejected (empty)
//! ```
//!
//! No DNS lookups, no prefetching: this is string work only. The same scheme
//! allow-list is applied again by the engine delegate to every navigation the
//! page itself triggers (links, redirects, `window.location`).

use tracing::debug;
use url::Url;

use crate::error::UrlError;

/// Schemes the engine is allowed to navigate to.
pub const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "file", "about"];

/// Prefixes handed to the engine without any rewriting.
const PASSTHROUGH_PREFIXES: [&str; 2] = ["about:", "file://"];

/// Returns `true` if `scheme` is on the allow-list (case-insensitive).
pub fn is_allowed_scheme(scheme: &str) -> bool {
    ALLOWED_SCHEMES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
}

/// Sanitizes raw URL bar input.
///
/// `search_prefix` is the search engine query URL the free-text case is
/// appended to (e.g. `https://www.google.com/search?q=`).
pub fn sanitize_url(input: &str, search_prefix: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    if PASSTHROUGH_PREFIXES.iter().any(|p| input.starts_with(p)) {
        return parse(input);
    }

    let candidate = if has_scheme_prefix(input) {
        input.to_owned()
    } else if input.contains('.') || input == "localhost" {
        format!("https://{input}")
    } else {
        search_url(search_prefix, input)
    };

    let url = parse(&candidate)?;
    validate_url(&url)?;
    Ok(url)
}

/// The navigation-hook check: only the scheme allow-list applies here.
pub fn validate_url(url: &Url) -> Result<(), UrlError> {
    if is_allowed_scheme(url.scheme()) {
        Ok(())
    } else {
        debug!(url = %url, "scheme not on allow-list");
        Err(UrlError::SchemeNotAllowed(url.scheme().to_owned()))
    }
}

/// Builds a search query URL from free text.
pub fn search_url(search_prefix: &str, query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{search_prefix}{encoded}")
}

/// `^[A-Za-z]+://`
fn has_scheme_prefix(input: &str) -> bool {
    match input.split_once("://") {
        Some((scheme, _)) => !scheme.is_empty() && scheme.bytes().all(|b| b.is_ascii_alphabetic()),
        None => false,
    }
}

fn parse(candidate: &str) -> Result<Url, UrlError> {
    Url::parse(candidate).map_err(|source| UrlError::Unparseable {
        input: candidate.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const GOOGLE: &str = "https://www.google.com/search?q=";

    #[rstest]
    #[case("example.com", "https://example.com/")]
    #[case("  example.com  ", "https://example.com/")]
    #[case("sub.domain.co.uk/path?x=1", "https://sub.domain.co.uk/path?x=1")]
    #[case("localhost", "https://localhost/")]
    #[case("127.0.0.1:8080", "https://127.0.0.1:8080/")]
    #[case("http://example.com", "http://example.com/")]
    #[case("HTTPS://Example.com", "https://example.com/")]
    fn test_hosts_and_explicit_schemes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_url(input, GOOGLE).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("about:blank")]
    #[case("about:config")]
    #[case("file:///tmp/index.html")]
    fn test_passthrough_prefixes(#[case] input: &str) {
        assert_eq!(sanitize_url(input, GOOGLE).unwrap().as_str(), input);
    }

    #[rstest]
    #[case("hello world", "https://www.google.com/search?q=hello+world")]
    #[case("rust", "https://www.google.com/search?q=rust")]
    #[case("localhost:3000", "https://www.google.com/search?q=localhost%3A3000")]
    #[case("javascript:alert(1)", "https://www.google.com/search?q=javascript%3Aalert%281%29")]
    #[case("c++ & rust", "https://www.google.com/search?q=c%2B%2B+%26+rust")]
    fn test_free_text_becomes_search(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_url(input, GOOGLE).unwrap().as_str(), expected);
    }

    #[test]
    fn test_search_prefix_is_configurable() {
        let url = sanitize_url("hello world", "https://duckduckgo.com/?q=").unwrap();
        assert_eq!(url.as_str(), "https://duckduckgo.com/?q=hello+world");
    }

    #[rstest]
    #[case("ftp://x")]
    #[case("ws://example.com/socket")]
    #[case("chrome://settings")]
    fn test_disallowed_schemes_rejected(#[case] input: &str) {
        assert!(matches!(
            sanitize_url(input, GOOGLE),
            Err(UrlError::SchemeNotAllowed(_))
        ));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_empty_rejected(#[case] input: &str) {
        assert_eq!(sanitize_url(input, GOOGLE), Err(UrlError::Empty));
    }

    #[test]
    fn test_unparseable_rejected() {
        // A bare host with an invalid port cannot be parsed.
        assert!(matches!(
            sanitize_url("example.com:99999999", GOOGLE),
            Err(UrlError::Unparseable { .. })
        ));
        assert!(matches!(
            sanitize_url("http://", GOOGLE),
            Err(UrlError::Unparseable { .. })
        ));
    }

    #[test]
    fn test_scheme_prefix_detection() {
        assert!(has_scheme_prefix("https://x"));
        assert!(has_scheme_prefix("ftp://x"));
        assert!(!has_scheme_prefix("://x"));
        assert!(!has_scheme_prefix("h1tp://x"));
        assert!(!has_scheme_prefix("example.com"));
        assert!(!has_scheme_prefix("mailto:someone@example.com"));
    }

    #[test]
    fn test_validate_url() {
        for ok in ["https://a.b/", "http://a.b/", "file:///etc/hosts", "about:blank"] {
            assert!(validate_url(&Url::parse(ok).unwrap()).is_ok(), "{ok}");
        }
        for bad in ["ftp://a.b/", "data:text/html,hi", "javascript:void(0)"] {
            assert!(validate_url(&Url::parse(bad).unwrap()).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_is_allowed_scheme_case_insensitive() {
        assert!(is_allowed_scheme("HTTPS"));
        assert!(is_allowed_scheme("About"));
        assert!(!is_allowed_scheme("ftp"));
    }
}
