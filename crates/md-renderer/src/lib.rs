//! Markdown to HTML rendering with overridable rules.
//!
//! This crate wraps pulldown-cmark behind a single [`parse`] function taking
//! the markdown text, an [`HtmlRules`] instance, a [`RenderOptions`] bundle and
//! an optional completion callback.
//!
//! # Architecture
//!
//! - [`HtmlRules`]: one boxed closure per construct (code, links, headings, ...).
//!   Callers mutate a fresh instance to customize output.
//! - [`RenderOptions`]: line breaks, pedantic mode, sanitization, smart
//!   punctuation and the syntax highlighting hook.
//! - [`MarkdownRenderer`]: stack-based event walker that drives the rules.
//!
//! # Example
//!
//! ```
//! use md_renderer::{HtmlRules, RenderOptions, parse};
//!
//! let options = RenderOptions {
//!     sanitize: true,
//!     ..Default::default()
//! };
//! let html = parse("**Bold** <b>raw</b>", &HtmlRules::new(), options, None);
//! assert_eq!(html, "<p><strong>Bold</strong> &lt;b&gt;raw&lt;/b&gt;</p>");
//! ```

mod options;
mod renderer;
mod rules;
mod util;

pub use options::{HighlightFn, RenderOptions, SanitizerFn};
pub use renderer::{MarkdownRenderer, parse};
pub use rules::{
    Alignment, CheckboxRule, CodeRule, HeadingRule, HtmlRules, LinkRule, ListRule, TableCell,
    TableCellRule, TableRule, VoidRule, WrapRule,
};
pub use util::escape_html;
