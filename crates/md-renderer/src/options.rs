//! Per-render options bundle.

use std::fmt;

use pulldown_cmark::Options;

/// Highlight hook: `(code, lang) -> replacement`.
///
/// Returning `None` (or the code unchanged) keeps the original code, which is
/// then escaped by the code rule.
pub type HighlightFn<'a> = dyn FnMut(&str, Option<&str>) -> Option<String> + 'a;

/// Sanitizer applied to raw HTML found in the markdown source.
pub type SanitizerFn<'a> = dyn Fn(&str) -> String + 'a;

/// Options controlling a single [`parse`](crate::parse) call.
///
/// All flags default to `false`, which matches plain GFM rendering.
#[derive(Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderOptions<'a> {
    /// Render soft line breaks as `<br>`.
    pub breaks: bool,
    /// Disable GFM extensions (tables, strikethrough, task lists).
    pub pedantic: bool,
    /// Escape raw HTML, or pass it through [`sanitizer`](Self::sanitizer).
    pub sanitize: bool,
    /// Custom sanitizer, only used when `sanitize` is set.
    pub sanitizer: Option<&'a SanitizerFn<'a>>,
    /// Typographic quotes and dashes.
    pub smartypants: bool,
    /// Syntax highlighting hook for code blocks.
    pub highlight: Option<&'a mut HighlightFn<'a>>,
}

impl RenderOptions<'_> {
    /// Parser options derived from the flags.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if !self.pedantic {
            options |= Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS;
        }
        if self.smartypants {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }
}

impl fmt::Debug for RenderOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("breaks", &self.breaks)
            .field("pedantic", &self.pedantic)
            .field("sanitize", &self.sanitize)
            .field("sanitizer", &self.sanitizer.is_some())
            .field("smartypants", &self.smartypants)
            .field("highlight", &self.highlight.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_gfm() {
        let options = RenderOptions::default().parser_options();
        assert!(options.contains(Options::ENABLE_TABLES));
        assert!(options.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(options.contains(Options::ENABLE_TASKLISTS));
        assert!(!options.contains(Options::ENABLE_SMART_PUNCTUATION));
    }

    #[test]
    fn test_pedantic_disables_gfm() {
        let options = RenderOptions {
            pedantic: true,
            ..Default::default()
        }
        .parser_options();
        assert!(!options.contains(Options::ENABLE_TABLES));
        assert!(!options.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(!options.contains(Options::ENABLE_TASKLISTS));
    }

    #[test]
    fn test_smartypants() {
        let options = RenderOptions {
            smartypants: true,
            ..Default::default()
        }
        .parser_options();
        assert!(options.contains(Options::ENABLE_SMART_PUNCTUATION));
    }
}
