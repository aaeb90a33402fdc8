//! Avatar URL normalization

use tracing::debug;
use url::Url;

/// Base that relative avatar paths are resolved against
pub const DEFAULT_BASE: &str = "https://www.v2ex.com/";

const SMALL_SUFFIXES: [&str; 2] = ["_mini.", "_normal."];

/// Rewrite an avatar URL into an absolute URL for the large image.
///
/// - `//cdn...` gets an `https:` scheme
/// - relative paths are joined onto `base`
/// - `_mini` / `_normal` size suffixes become `_large`
///
/// Empty input stays empty. Input that cannot be parsed as a URL is
/// returned trimmed but otherwise untouched.
pub fn normalize(raw: &str, base: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let candidate = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };

    let mut url = match Url::parse(&candidate) {
        Ok(u) => u,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match Url::parse(base).and_then(|b| b.join(&candidate)) {
                Ok(u) => u,
                Err(e) => {
                    debug!(avatar = %candidate, base, error = %e, "cannot resolve avatar URL");
                    return candidate;
                }
            }
        }
        Err(e) => {
            debug!(avatar = %candidate, error = %e, "cannot parse avatar URL");
            return candidate;
        }
    };

    if let Some(path) = enlarge(url.path()) {
        url.set_path(&path);
    }
    url.to_string()
}

fn enlarge(path: &str) -> Option<String> {
    SMALL_SUFFIXES.iter().find_map(|suffix| {
        path.rfind(suffix).map(|i| {
            format!("{}_large.{}", &path[..i], &path[i + suffix.len()..])
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            normalize("//cdn.v2ex.com/avatar/c4ca/4238/1_normal.png?m=1", DEFAULT_BASE),
            "https://cdn.v2ex.com/avatar/c4ca/4238/1_large.png?m=1"
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            normalize("/static/img/avatar_mini.png", DEFAULT_BASE),
            "https://www.v2ex.com/static/img/avatar_large.png"
        );
    }

    #[test]
    fn test_absolute_untouched() {
        assert_eq!(
            normalize("https://cdn.v2ex.com/avatar/1_large.png", DEFAULT_BASE),
            "https://cdn.v2ex.com/avatar/1_large.png"
        );
        assert_eq!(
            normalize("https://example.com/me.png", DEFAULT_BASE),
            "https://example.com/me.png"
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize("", DEFAULT_BASE), "");
        assert_eq!(normalize("   ", DEFAULT_BASE), "");
    }
}
