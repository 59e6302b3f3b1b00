//! Overridable HTML rules.
//!
//! [`HtmlRules`] is the renderer instance handed to a caller-supplied mutator
//! before each render. Every construct is produced by one boxed closure, so a
//! caller can replace e.g. link or code block formatting in place:
//!
//! ```
//! use md_renderer::{HtmlRules, RenderOptions, parse};
//!
//! let mut rules = HtmlRules::new();
//! rules.link = Box::new(|href, _title, text| format!(r#"<a href="{href}" rel="nofollow">{text}</a>"#));
//!
//! let html = parse("[docs](https://example.com)", &rules, RenderOptions::default(), None);
//! assert!(html.contains(r#"rel="nofollow""#));
//! ```

use std::fmt;

pub use pulldown_cmark::Alignment;

use crate::util::escape_html;

/// Fenced or indented code block: `(code, lang, escaped)`.
///
/// `escaped` is true when `code` was produced by a highlighter and must not be
/// escaped again.
pub type CodeRule = Box<dyn Fn(&str, Option<&str>, bool) -> String>;

/// Wraps already-rendered inner HTML.
pub type WrapRule = Box<dyn Fn(&str) -> String>;

/// Heading: `(inner_html, level, id)`.
pub type HeadingRule = Box<dyn Fn(&str, u8, &str) -> String>;

/// List: `(body, start)`. `start` is `Some` for ordered lists.
pub type ListRule = Box<dyn Fn(&str, Option<u64>) -> String>;

/// Task list checkbox: `(checked)`.
pub type CheckboxRule = Box<dyn Fn(bool) -> String>;

/// Table: `(header_row, body_rows)`.
pub type TableRule = Box<dyn Fn(&str, &str) -> String>;

/// Table cell: `(content, cell)`.
pub type TableCellRule = Box<dyn Fn(&str, TableCell) -> String>;

/// Link or image: `(href, title, text)`. For images `text` is the alt text.
pub type LinkRule = Box<dyn Fn(&str, Option<&str>, &str) -> String>;

/// Void elements (`<hr>`, `<br>`).
pub type VoidRule = Box<dyn Fn() -> String>;

/// Position information passed to [`HtmlRules::tablecell`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableCell {
    /// Whether the cell belongs to the header row.
    pub header: bool,
    /// Column alignment.
    pub align: Alignment,
}

/// Rule set used to turn markdown constructs into HTML.
///
/// Inline content (`text`, `codespan`) receives already-escaped text.
pub struct HtmlRules {
    pub code: CodeRule,
    pub blockquote: WrapRule,
    pub heading: HeadingRule,
    pub hr: VoidRule,
    pub list: ListRule,
    pub listitem: WrapRule,
    pub checkbox: CheckboxRule,
    pub paragraph: WrapRule,
    pub table: TableRule,
    pub tablerow: WrapRule,
    pub tablecell: TableCellRule,
    pub strong: WrapRule,
    pub em: WrapRule,
    pub codespan: WrapRule,
    pub br: VoidRule,
    pub del: WrapRule,
    pub link: LinkRule,
    pub image: LinkRule,
    pub text: WrapRule,
}

impl HtmlRules {
    /// Create the default HTML5 rule set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            code: Box::new(code),
            blockquote: Box::new(|quote| format!("<blockquote>{quote}</blockquote>")),
            heading: Box::new(|text, level, id| {
                format!(r#"<h{level} id="{}">{}</h{level}>"#, escape_html(id), text.trim())
            }),
            hr: Box::new(|| "<hr>".to_owned()),
            list: Box::new(list),
            listitem: Box::new(|text| format!("<li>{text}</li>")),
            checkbox: Box::new(|checked| {
                if checked {
                    r#"<input type="checkbox" checked disabled>"#.to_owned()
                } else {
                    r#"<input type="checkbox" disabled>"#.to_owned()
                }
            }),
            paragraph: Box::new(|text| format!("<p>{text}</p>")),
            table: Box::new(|header, body| {
                format!("<table><thead>{header}</thead><tbody>{body}</tbody></table>")
            }),
            tablerow: Box::new(|content| format!("<tr>{content}</tr>")),
            tablecell: Box::new(tablecell),
            strong: Box::new(|text| format!("<strong>{text}</strong>")),
            em: Box::new(|text| format!("<em>{text}</em>")),
            codespan: Box::new(|text| format!("<code>{text}</code>")),
            br: Box::new(|| "<br>".to_owned()),
            del: Box::new(|text| format!("<del>{text}</del>")),
            link: Box::new(link),
            image: Box::new(image),
            text: Box::new(str::to_owned),
        }
    }
}

impl Default for HtmlRules {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HtmlRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlRules").finish_non_exhaustive()
    }
}

fn code(code: &str, lang: Option<&str>, escaped: bool) -> String {
    let body = if escaped {
        code.to_owned()
    } else {
        escape_html(code)
    };
    match lang {
        Some(lang) => format!(
            r#"<pre><code class="language-{}">{body}</code></pre>"#,
            escape_html(lang)
        ),
        None => format!("<pre><code>{body}</code></pre>"),
    }
}

fn list(body: &str, start: Option<u64>) -> String {
    match start {
        Some(1) => format!("<ol>{body}</ol>"),
        Some(n) => format!(r#"<ol start="{n}">{body}</ol>"#),
        None => format!("<ul>{body}</ul>"),
    }
}

fn tablecell(content: &str, cell: TableCell) -> String {
    let tag = if cell.header { "th" } else { "td" };
    let align = match cell.align {
        Alignment::None => "",
        Alignment::Left => r#" style="text-align: left""#,
        Alignment::Center => r#" style="text-align: center""#,
        Alignment::Right => r#" style="text-align: right""#,
    };
    format!("<{tag}{align}>{content}</{tag}>")
}

fn title_attr(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => format!(r#" title="{}""#, escape_html(title)),
        _ => String::new(),
    }
}

fn link(href: &str, title: Option<&str>, text: &str) -> String {
    format!(
        r#"<a href="{}"{}>{text}</a>"#,
        escape_html(href),
        title_attr(title)
    )
}

fn image(src: &str, title: Option<&str>, alt: &str) -> String {
    format!(
        r#"<img src="{}"{} alt="{}">"#,
        escape_html(src),
        title_attr(title),
        escape_html(alt)
    )
}
