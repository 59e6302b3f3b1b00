//! Markdown renderer driven by an [`HtmlRules`] instance.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Parser, Tag, TagEnd};
use tracing::debug;

use crate::options::RenderOptions;
use crate::rules::{HtmlRules, TableCell};
use crate::util::{Slugger, escape_html, heading_level_to_num};

/// Render markdown to HTML.
///
/// Walks the pulldown-cmark event stream, hands every construct to the
/// matching rule in `rules`, and calls `callback` with the final HTML before
/// returning it.
///
/// # Example
///
/// ```
/// use md_renderer::{HtmlRules, RenderOptions, parse};
///
/// let html = parse("# Hi", &HtmlRules::new(), RenderOptions::default(), None);
/// assert_eq!(html, r#"<h1 id="hi">Hi</h1>"#);
/// ```
pub fn parse(
    markdown: &str,
    rules: &HtmlRules,
    options: RenderOptions<'_>,
    callback: Option<&dyn Fn(&str)>,
) -> String {
    let html = MarkdownRenderer::new(rules, options).render_markdown(markdown);
    if let Some(callback) = callback {
        callback(&html);
    }
    html
}

/// Construct currently being rendered.
#[derive(Debug)]
enum Frame {
    Root,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock(Option<String>),
    List(Option<u64>),
    Item,
    Table { head: String },
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { href: String, title: String },
    Image { src: String, title: String },
    /// Raw HTML block, cleaned as a whole on close.
    HtmlBlock,
    /// Plain wrapper tag without a dedicated rule.
    Wrap(&'static str),
    /// Content kept, markup dropped.
    Transparent,
}

/// Output buffer for one open construct.
#[derive(Debug)]
struct Node {
    frame: Frame,
    /// Rendered inner HTML.
    html: String,
    /// Raw text content, used for heading slugs, image alt text and code.
    text: String,
}

impl Node {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            html: String::new(),
            text: String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell_index: usize,
}

/// Stack-based markdown renderer.
///
/// Each start tag opens a [`Node`]; the matching end tag closes it, runs the
/// rule for that construct over the inner HTML, and appends the result to the
/// parent. Renderers are single-use: [`render`](Self::render) consumes them.
pub struct MarkdownRenderer<'r, 'o> {
    rules: &'r HtmlRules,
    options: RenderOptions<'o>,
    stack: Vec<Node>,
    table: TableState,
    slugger: Slugger,
}

impl<'r, 'o> MarkdownRenderer<'r, 'o> {
    #[must_use]
    pub fn new(rules: &'r HtmlRules, options: RenderOptions<'o>) -> Self {
        Self {
            rules,
            options,
            stack: vec![Node::new(Frame::Root)],
            table: TableState::default(),
            slugger: Slugger::default(),
        }
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'m>(&self, markdown: &'m str) -> Parser<'m> {
        Parser::new_ext(markdown, self.options.parser_options())
    }

    /// Render markdown text using the configured parser options.
    pub fn render_markdown(self, markdown: &str) -> String {
        let parser = self.create_parser(markdown);
        self.render(parser)
    }

    /// Render markdown events and return the HTML.
    pub fn render<'e, I>(mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'e>>,
    {
        for event in events {
            self.process_event(event);
        }

        // Unbalanced streams cannot come from pulldown-cmark, but a caller may
        // feed a truncated iterator.
        while self.stack.len() > 1 {
            self.close();
        }

        let root = self.stack.pop().map(|node| node.html).unwrap_or_default();
        debug!(output_len = root.len(), "Rendered markdown");
        root
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.block_html(&html),
            Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => {
                let br = (self.rules.br)();
                self.push_html(&br);
            }
            Event::Rule => {
                let hr = (self.rules.hr)();
                self.push_html(&hr);
            }
            Event::TaskListMarker(checked) => {
                let checkbox = (self.rules.checkbox)(checked);
                self.push_html(&checkbox);
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph,
            Tag::Heading { level, .. } => Frame::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => Frame::BlockQuote,
            Tag::CodeBlock(kind) => Frame::CodeBlock(fence_language(&kind)),
            Tag::List(start) => Frame::List(start),
            Tag::Item => Frame::Item,
            Tag::Table(alignments) => {
                self.table.alignments = alignments;
                Frame::Table {
                    head: String::new(),
                }
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell_index = 0;
                Frame::TableHead
            }
            Tag::TableRow => {
                self.table.cell_index = 0;
                Frame::TableRow
            }
            Tag::TableCell => Frame::TableCell,
            Tag::Emphasis => Frame::Emphasis,
            Tag::Strong => Frame::Strong,
            Tag::Strikethrough => Frame::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => Frame::Link {
                href: dest_url.to_string(),
                title: title.to_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                src: dest_url.to_string(),
                title: title.to_string(),
            },
            Tag::DefinitionList => Frame::Wrap("dl"),
            Tag::DefinitionListTitle => Frame::Wrap("dt"),
            Tag::DefinitionListDefinition => Frame::Wrap("dd"),
            Tag::Superscript => Frame::Wrap("sup"),
            Tag::Subscript => Frame::Wrap("sub"),
            Tag::HtmlBlock => Frame::HtmlBlock,
            Tag::FootnoteDefinition(_) | Tag::MetadataBlock(_) => {
                Frame::Transparent
            }
        };
        self.stack.push(Node::new(frame));
    }

    fn end_tag(&mut self, tag: TagEnd) {
        if matches!(tag, TagEnd::TableHead) {
            self.table.in_head = false;
        }
        self.close();
    }

    /// Pop the innermost node, render it and append the result to its parent.
    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(node) = self.stack.pop() else {
            return;
        };
        let rules = self.rules;
        let html = match node.frame {
            Frame::Root => String::new(),
            Frame::Paragraph => (rules.paragraph)(&node.html),
            Frame::Heading(level) => {
                let id = self.slugger.slug(&node.text);
                (rules.heading)(&node.html, level, &id)
            }
            Frame::BlockQuote => (rules.blockquote)(&node.html),
            Frame::CodeBlock(lang) => self.code_block(&node.text, lang.as_deref()),
            Frame::List(start) => (rules.list)(&node.html, start),
            Frame::Item => (rules.listitem)(&node.html),
            Frame::Table { head } => (rules.table)(&head, &node.html),
            Frame::TableHead => {
                let row = (rules.tablerow)(&node.html);
                if let Some(Node {
                    frame: Frame::Table { head },
                    ..
                }) = self.stack.last_mut()
                {
                    *head = row;
                }
                String::new()
            }
            Frame::TableRow => (rules.tablerow)(&node.html),
            Frame::TableCell => {
                let align = self
                    .table
                    .alignments
                    .get(self.table.cell_index)
                    .copied()
                    .unwrap_or(Alignment::None);
                self.table.cell_index += 1;
                let cell = TableCell {
                    header: self.table.in_head,
                    align,
                };
                (rules.tablecell)(&node.html, cell)
            }
            Frame::Emphasis => (rules.em)(&node.html),
            Frame::Strong => (rules.strong)(&node.html),
            Frame::Strikethrough => (rules.del)(&node.html),
            Frame::Link { ref href, ref title } => {
                (rules.link)(href, non_empty(title), &node.html)
            }
            Frame::Image { ref src, ref title } => {
                (rules.image)(src, non_empty(title), &node.text)
            }
            Frame::HtmlBlock => self.clean_html(&node.html),
            Frame::Wrap(tag) => format!("<{tag}>{}</{tag}>", node.html),
            Frame::Transparent => node.html,
        };

        if let Some(parent) = self.stack.last_mut() {
            parent.html.push_str(&html);
            parent.text.push_str(&node.text);
        }
    }

    fn code_block(&mut self, code: &str, lang: Option<&str>) -> String {
        let highlighted = self
            .options
            .highlight
            .as_deref_mut()
            .and_then(|highlight| highlight(code, lang))
            .filter(|out| out != code);

        match highlighted {
            Some(out) => (self.rules.code)(&out, lang, true),
            None => (self.rules.code)(code, lang, false),
        }
    }

    fn push_html(&mut self, html: &str) {
        if let Some(node) = self.stack.last_mut() {
            node.html.push_str(html);
        }
    }

    fn text(&mut self, text: &str) {
        let rendered = (self.rules.text)(&escape_html(text));
        if let Some(node) = self.stack.last_mut() {
            node.text.push_str(text);
            node.html.push_str(&rendered);
        }
    }

    fn inline_code(&mut self, code: &str) {
        let rendered = (self.rules.codespan)(&escape_html(code));
        if let Some(node) = self.stack.last_mut() {
            node.text.push_str(code);
            node.html.push_str(&rendered);
        }
    }

    /// Buffer a line of block HTML until its block closes.
    fn block_html(&mut self, html: &str) {
        match self.stack.last_mut() {
            Some(node) if matches!(node.frame, Frame::HtmlBlock) => node.html.push_str(html),
            _ => self.raw_html(html),
        }
    }

    fn raw_html(&mut self, html: &str) {
        let cleaned = self.clean_html(html);
        self.push_html(&cleaned);
    }

    /// Apply `sanitize`: run the sanitizer, or escape when there is none.
    fn clean_html(&self, html: &str) -> String {
        if !self.options.sanitize {
            return html.to_owned();
        }
        match self.options.sanitizer {
            Some(sanitizer) => sanitizer(html),
            None => escape_html(html),
        }
    }

    fn soft_break(&mut self) {
        if self.options.breaks {
            let br = (self.rules.br)();
            self.push_html(&br);
        } else {
            self.push_html("\n");
        }
        if let Some(node) = self.stack.last_mut() {
            node.text.push(' ');
        }
    }
}

/// First word of a fence info string, if any.
fn fence_language(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split_whitespace()
            .next()
            .map(str::to_owned),
        CodeBlockKind::Indented => None,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}
