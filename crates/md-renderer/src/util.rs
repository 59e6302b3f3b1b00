//! Shared utility functions for markdown rendering.

use std::collections::HashMap;

use pulldown_cmark::HeadingLevel;

/// Escape HTML special characters.
///
/// # Examples
///
/// ```
/// use md_renderer::escape_html;
///
/// assert_eq!(escape_html("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Generates unique heading IDs within one render.
///
/// Repeated slugs get a numeric suffix: `faq`, `faq-1`, `faq-2`.
#[derive(Debug, Default)]
pub(crate) struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub(crate) fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        match self.seen.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{base}-{count}")
            }
            None => {
                self.seen.insert(base.clone(), 0);
                base
            }
        }
    }
}

/// Lowercase, keep alphanumerics, turn whitespace and hyphens into `-`.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.trim().chars() {
        if ch.is_alphanumeric() || ch == '_' {
            slug.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            slug.push('-');
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("it's"), "it&#39;s");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_heading_level_to_num() {
        assert_eq!(heading_level_to_num(HeadingLevel::H1), 1);
        assert_eq!(heading_level_to_num(HeadingLevel::H6), 6);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Install `npm`!"), "install-npm");
        assert_eq!(slugify("  Trimmed  "), "trimmed");
        assert_eq!(slugify("snake_case-name"), "snake_case-name");
    }

    #[test]
    fn test_slugger_duplicates() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("FAQ"), "faq");
        assert_eq!(slugger.slug("FAQ"), "faq-1");
        assert_eq!(slugger.slug("FAQ"), "faq-2");
        assert_eq!(slugger.slug("Other"), "other");
    }
}
