//! Utility functions shared across the crate

use regex::Regex;
use std::sync::LazyLock;

/// Runs of separators in record keys (`implementation_details`, `data-schema`)
static KEY_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\-\s]+").unwrap());

/// camelCase word boundaries (`dataSchema`)
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Id fragment derived from a display name: lowercase, spaces become `-`
///
/// # Examples
///
/// ```rust
/// use alignviz_core::utils::slugify;
///
/// assert_eq!(slugify("Reward Modeling"), "reward-modeling");
/// ```
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Display label for a record key
///
/// # Examples
///
/// ```rust
/// use alignviz_core::utils::humanize_key;
///
/// assert_eq!(humanize_key("implementation_details"), "Implementation Details");
/// assert_eq!(humanize_key("dataSchema"), "Data Schema");
/// ```
pub fn humanize_key(key: &str) -> String {
    let spaced = CAMEL_BOUNDARY.replace_all(key, "$1 $2");
    KEY_SEPARATORS
        .split(&spaced)
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// URL schemes allowed in rendered links; scheme-less URLs are relative
const SAFE_URL_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Whether `url` may be used as a link target
///
/// Browsers drop ASCII whitespace and control characters inside a scheme, so
/// those are ignored before the scheme is read.
///
/// # Examples
///
/// ```rust
/// use alignviz_core::utils::is_safe_url;
///
/// assert!(is_safe_url("https://example.org"));
/// assert!(is_safe_url("docs/standards.html#iso"));
/// assert!(!is_safe_url("javascript:alert(1)"));
/// ```
pub fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace() && !ch.is_ascii_control())
        .collect();
    let scheme_end = cleaned.find(|ch: char| matches!(ch, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(end) if cleaned[end..].starts_with(':') => {
            let scheme = cleaned[..end].to_ascii_lowercase();
            SAFE_URL_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}
