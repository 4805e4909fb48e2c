//! Text normalization shared by the moderation filter, slug generation and
//! input sanitising.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("static regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("static regex"));

/// Lower-cases, strips diacritical marks and trims.
///
/// Case folding happens before decomposition so that marks introduced by
/// lower-casing (e.g. `İ`) are stripped too, which keeps the function
/// idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            'ß' => out.push_str("ss"),
            'ø' => out.push('o'),
            'ł' => out.push('l'),
            'đ' => out.push('d'),
            other => out.push(other),
        }
    }
    out.trim().to_string()
}

/// URL-safe token derived from `text`. May be empty, in which case the
/// caller has no valid identifier.
pub fn slugify(text: &str) -> String {
    let normalized = normalize(text);
    let mut slug = String::with_capacity(normalized.len());
    let mut pending_separator = false;

    for c in normalized.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_separator = true;
        }
        // anything else is dropped without acting as a separator
    }

    slug
}

/// Identifier sanitising for template ids: lower-case ASCII alphanumerics,
/// dashes and underscores only.
pub fn sanitize_key(text: &str) -> String {
    text.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_')
        .collect()
}

/// Removes `<script>`/`<style>` blocks with their content, then every
/// remaining tag, then trims.
pub fn strip_tags(text: &str) -> String {
    let without_blocks = SCRIPT_OR_STYLE.replace_all(text, "");
    TAG.replace_all(&without_blocks, "").trim().to_string()
}

/// Collapses every whitespace run into one space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Permissive address check: `local@domain.tld`, no whitespace, one `@`.
pub fn is_email(text: &str) -> bool {
    EMAIL.is_match(text)
}
