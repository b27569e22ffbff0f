//! Rich-text sanitization seam.
//!
//! # Responsibility
//! - Define the sanitizer contract consulted when projecting record content
//!   into chart items.
//! - Provide a conservative default implementation for embedders without
//!   their own sanitizer.
//!
//! # Invariants
//! - Sanitization happens exactly once, at projection time; stored content
//!   is never rewritten.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid script regex"));
static STYLE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("valid style regex"));
static ORPHAN_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:script|style)\b[^>]*>").expect("valid orphan tag regex"));
static EVENT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("valid event attribute regex")
});
static JS_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*(['"])\s*javascript:[^'"]*(['"])"#)
        .expect("valid javascript url regex")
});

/// Sanitizer contract for record content rendered inside the chart.
pub trait RichTextSanitizer {
    /// Returns a safe rendition of the given HTML fragment.
    fn sanitize(&self, html: &str) -> String;
}

/// Regex-based default sanitizer.
///
/// Removes script/style blocks, strips inline event-handler attributes, and
/// neutralizes `javascript:` URLs. Markup that carries no active content is
/// left untouched.
pub struct BasicHtmlSanitizer;

impl RichTextSanitizer for BasicHtmlSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let without_scripts = SCRIPT_BLOCK_RE.replace_all(html, "");
        let without_styles = STYLE_BLOCK_RE.replace_all(&without_scripts, "");
        let without_orphans = ORPHAN_TAG_RE.replace_all(&without_styles, "");
        let without_handlers = EVENT_ATTR_RE.replace_all(&without_orphans, "");
        JS_URL_RE
            .replace_all(&without_handlers, "$1=$2#$3")
            .into_owned()
    }
}
