//! The markdown element.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use md_renderer::{HtmlRules, RenderOptions};
use tracing::{debug, info, warn};

use crate::event::{Event, FetchEvent, HighlightDetail, Listeners, is_success_status};
use crate::fetch::{Completion, Fetcher, ReadyState};
use crate::node::{OutputNode, SourceNode};
use crate::transport::{HttpTransport, Transport};
use crate::unindent::unindent;

/// Markdown shown when a remote fetch fails and nobody handled the error.
pub const FAILURE_TEXT: &str = "Failed loading markdown source";

/// Custom sanitizer for raw HTML.
pub type Sanitizer = Rc<dyn Fn(&str) -> String>;

/// Mutates the fresh [`HtmlRules`] before each render.
pub type RendererMutator = Rc<dyn Fn(&mut HtmlRules)>;

/// Called with the rendered HTML after each parse.
pub type RenderCallback = Rc<dyn Fn(&str)>;

/// Rendering configuration.
///
/// `None` means "use the parser default".
#[derive(Clone, Default)]
pub struct ElementOptions {
    /// Render soft line breaks as `<br>`.
    pub breaks: Option<bool>,
    /// Disable GFM extensions.
    pub pedantic: Option<bool>,
    /// Escape raw HTML in the markdown.
    pub sanitize: Option<bool>,
    pub sanitizer: Option<Sanitizer>,
    pub renderer: Option<RendererMutator>,
    /// Smart punctuation.
    pub smartypants: Option<bool>,
    pub callback: Option<RenderCallback>,
    /// Keep `sanitize` untouched when remote content arrives.
    pub disable_remote_sanitization: Option<bool>,
}

impl fmt::Debug for ElementOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementOptions")
            .field("breaks", &self.breaks)
            .field("pedantic", &self.pedantic)
            .field("sanitize", &self.sanitize)
            .field("sanitizer", &self.sanitizer.is_some())
            .field("renderer", &self.renderer.is_some())
            .field("smartypants", &self.smartypants)
            .field("callback", &self.callback.is_some())
            .field(
                "disable_remote_sanitization",
                &self.disable_remote_sanitization,
            )
            .finish()
    }
}

/// Element rendering markdown into an output node.
///
/// Markdown comes from [`set_markdown`](Self::set_markdown), from the first
/// [`SourceNode`] (inline text and/or a remote `src`), in that priority.
/// Every setter re-renders immediately while the element is connected; while
/// disconnected, changes only mark the element dirty and
/// [`connect`](Self::connect) renders once with the latest values.
///
/// Remote fetches run on a worker thread. Their results are applied when the
/// host calls [`poll`](Self::poll) or [`wait_for_fetch`](Self::wait_for_fetch).
///
/// # Example
///
/// ```
/// use md_element::MarkdownElement;
///
/// let mut element = MarkdownElement::new();
/// element.set_markdown("# Hi");
/// element.connect();
/// assert_eq!(element.output_target().content(), r#"<h1 id="hi">Hi</h1>"#);
/// ```
pub struct MarkdownElement {
    markdown: Option<String>,
    options: ElementOptions,
    sources: Vec<SourceNode>,
    slot: Option<OutputNode>,
    fallback: OutputNode,
    listeners: Listeners,
    fetcher: Fetcher,
    connected: bool,
    initialized: bool,
    dirty: bool,
}

impl MarkdownElement {
    /// Create a disconnected element using [`HttpTransport`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(Arc::new(HttpTransport::default()))
    }

    /// Create a disconnected element using the given transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            markdown: None,
            options: ElementOptions::default(),
            sources: Vec::new(),
            slot: None,
            fallback: OutputNode::new(),
            listeners: Listeners::default(),
            fetcher: Fetcher::new(transport),
            connected: false,
            initialized: false,
            dirty: false,
        }
    }

    // Inputs

    #[must_use]
    pub fn markdown(&self) -> Option<&str> {
        self.markdown.as_deref()
    }

    pub fn set_markdown(&mut self, markdown: impl Into<String>) {
        self.markdown = Some(markdown.into());
        self.invalidate();
    }

    pub fn clear_markdown(&mut self) {
        self.markdown = None;
        self.invalidate();
    }

    #[must_use]
    pub fn options(&self) -> &ElementOptions {
        &self.options
    }

    /// Replace the whole configuration, rendering at most once.
    pub fn apply_options(&mut self, options: ElementOptions) {
        self.options = options;
        self.invalidate();
    }

    pub fn set_breaks(&mut self, breaks: bool) {
        self.options.breaks = Some(breaks);
        self.invalidate();
    }

    pub fn set_pedantic(&mut self, pedantic: bool) {
        self.options.pedantic = Some(pedantic);
        self.invalidate();
    }

    pub fn set_sanitize(&mut self, sanitize: bool) {
        self.options.sanitize = Some(sanitize);
        self.invalidate();
    }

    pub fn set_sanitizer(&mut self, sanitizer: Option<Sanitizer>) {
        self.options.sanitizer = sanitizer;
        self.invalidate();
    }

    pub fn set_renderer(&mut self, renderer: Option<RendererMutator>) {
        self.options.renderer = renderer;
        self.invalidate();
    }

    pub fn set_smartypants(&mut self, smartypants: bool) {
        self.options.smartypants = Some(smartypants);
        self.invalidate();
    }

    pub fn set_callback(&mut self, callback: Option<RenderCallback>) {
        self.options.callback = callback;
        self.invalidate();
    }

    /// Only consulted when a fetch completes; does not re-render.
    pub fn set_disable_remote_sanitization(&mut self, disable: bool) {
        self.options.disable_remote_sanitization = Some(disable);
    }

    // Nodes

    /// Add a markdown source child. Only the first one is used.
    pub fn append_source(&mut self, node: SourceNode) {
        self.sources.push(node);
    }

    #[must_use]
    pub fn source(&self) -> Option<&SourceNode> {
        self.sources.first()
    }

    /// Change the remote location of the source node.
    ///
    /// Once the element has been connected, a new location restarts the
    /// fetch. Without a source node this does nothing.
    pub fn set_source_location(&mut self, src: Option<String>) {
        let Some(source) = self.sources.first_mut() else {
            return;
        };
        if source.src == src {
            return;
        }
        source.src.clone_from(&src);
        if self.initialized
            && let Some(url) = src
        {
            self.request(&url);
        }
    }

    /// Assign the slotted output node, or fall back to the internal one.
    ///
    /// The new target receives the current render.
    pub fn set_output(&mut self, node: Option<OutputNode>) {
        self.slot = node;
        self.invalidate();
    }

    /// Node receiving the rendered HTML.
    #[must_use]
    pub fn output_target(&self) -> &OutputNode {
        self.slot.as_ref().unwrap_or(&self.fallback)
    }

    // Lifecycle

    /// Attach the element and render once.
    ///
    /// The first connect also acquires markdown from the source node.
    pub fn connect(&mut self) {
        if !self.initialized {
            self.initialized = true;
            self.acquire_source();
        }
        self.connected = true;
        self.render();
    }

    /// Detach the element. Later changes are held until the next connect.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether changes are waiting for the next connect.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn invalidate(&mut self) {
        if self.connected {
            self.render();
        } else {
            self.dirty = true;
        }
    }

    fn acquire_source(&mut self) {
        if self.markdown.as_deref().is_some_and(|m| !m.is_empty()) {
            return;
        }
        let Some(source) = self.sources.first() else {
            return;
        };
        let src = source.src.clone();
        let text = source.has_text().then(|| unindent(&source.text));

        if let Some(url) = src {
            self.request(&url);
        }
        if let Some(text) = text {
            self.markdown = Some(text);
            self.invalidate();
        }
    }

    // Rendering

    /// Render the current markdown into the output target.
    ///
    /// Does nothing but mark the element dirty while disconnected.
    pub fn render(&mut self) {
        if !self.connected {
            self.dirty = true;
            return;
        }
        self.dirty = false;

        let target = self.output_target().clone();
        let Some(markdown) = self.markdown.as_deref().filter(|m| !m.is_empty()) else {
            target.clear();
            return;
        };

        let mut rules = HtmlRules::new();
        if let Some(mutate) = &self.options.renderer {
            mutate(&mut rules);
        }

        let listeners = &mut self.listeners;
        let mut highlight =
            |code: &str, lang: Option<&str>| -> Option<String> { listeners.highlight(code, lang) };
        let options = RenderOptions {
            breaks: self.options.breaks.unwrap_or(false),
            pedantic: self.options.pedantic.unwrap_or(false),
            sanitize: self.options.sanitize.unwrap_or(false),
            sanitizer: self.options.sanitizer.as_deref(),
            smartypants: self.options.smartypants.unwrap_or(false),
            highlight: Some(&mut highlight),
        };
        debug!(len = markdown.len(), ?options, "Rendering markdown");

        let html = md_renderer::parse(markdown, &rules, options, self.options.callback.as_deref());
        target.set_content(html);

        self.listeners.render_complete();
    }

    // Remote fetch

    /// Fetch markdown from `url`.
    ///
    /// Returns `false` if another fetch is still in flight; that fetch keeps
    /// running and no new request is made.
    pub fn request(&mut self, url: &str) -> bool {
        self.fetcher.start(url)
    }

    /// State of the current fetch carrier.
    #[must_use]
    pub fn fetch_state(&self) -> ReadyState {
        self.fetcher.state()
    }

    /// Apply a finished fetch, if any, without blocking.
    ///
    /// Returns `true` if a completion was processed.
    pub fn poll(&mut self) -> bool {
        match self.fetcher.try_complete() {
            Some(completion) => {
                self.complete_fetch(completion);
                true
            }
            None => false,
        }
    }

    /// Block until the in-flight fetch finishes and apply it.
    ///
    /// Returns `false` if nothing was in flight.
    pub fn wait_for_fetch(&mut self) -> bool {
        match self.fetcher.wait() {
            Some(completion) => {
                self.complete_fetch(completion);
                true
            }
            None => false,
        }
    }

    fn complete_fetch(&mut self, completion: Completion) {
        let Completion { url, result } = completion;
        let (event, body) = match result {
            Ok(response) => (
                FetchEvent {
                    url,
                    status: Some(response.status),
                    error: None,
                },
                Some(response.body),
            ),
            Err(e) => (
                FetchEvent {
                    url,
                    status: None,
                    error: Some(e.to_string()),
                },
                None,
            ),
        };

        match body {
            Some(body) if event.status.is_some_and(is_success_status) => {
                info!(url = %event.url, status = ?event.status, "Loaded markdown source");
                if !self.options.disable_remote_sanitization.unwrap_or(false) {
                    self.options.sanitize = Some(true);
                }
                self.markdown = Some(body);
                self.invalidate();
            }
            _ => self.fail_fetch(event.clone()),
        }

        self.listeners.load_end(event);
    }

    fn fail_fetch(&mut self, event: FetchEvent) {
        warn!(
            url = %event.url,
            status = ?event.status,
            error = event.error.as_deref().unwrap_or_default(),
            "Failed loading markdown source"
        );
        if !self.listeners.request_error(event) {
            self.set_markdown(FAILURE_TEXT);
        }
    }

    // Listeners

    /// Called after every render that produced output.
    pub fn on_render_complete(&mut self, listener: impl FnMut(&mut Event<()>) + 'static) {
        self.listeners.render_complete.push(listener);
    }

    /// Called for each fenced code block during a render.
    ///
    /// Set `detail_mut().code` to highlighted HTML to replace the block body.
    pub fn on_syntax_highlight(
        &mut self,
        listener: impl FnMut(&mut Event<HighlightDetail>) + 'static,
    ) {
        self.listeners.syntax_highlight.push(listener);
    }

    /// Called when a fetch finishes, whatever the outcome.
    pub fn on_load_end(&mut self, listener: impl FnMut(&mut Event<FetchEvent>) + 'static) {
        self.listeners.load_end.push(listener);
    }

    /// Called when a fetch fails. Cancel to keep the current markdown.
    pub fn on_request_error(&mut self, listener: impl FnMut(&mut Event<FetchEvent>) + 'static) {
        self.listeners.request_error.push(listener);
    }
}

impl Default for MarkdownElement {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MarkdownElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownElement")
            .field("markdown", &self.markdown)
            .field("options", &self.options)
            .field("sources", &self.sources)
            .field("connected", &self.connected)
            .field("dirty", &self.dirty)
            .field("fetch_state", &self.fetcher.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};

    const README_URL: &str = "https://example.com/readme.md";

    fn element_with(transport: MockTransport) -> (MarkdownElement, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let element =
            MarkdownElement::with_transport(Arc::clone(&transport) as Arc<dyn Transport>);
        (element, transport)
    }

    fn count_renders(element: &mut MarkdownElement) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        element.on_render_complete(move |_| sink.set(sink.get() + 1));
        count
    }

    #[test]
    fn test_heading_with_default_config() {
        let mut element = MarkdownElement::new();
        element.set_markdown("# Hi");
        element.connect();
        assert_eq!(
            element.output_target().content(),
            r#"<h1 id="hi">Hi</h1>"#
        );
    }

    #[test]
    fn test_empty_markdown_clears_output() {
        let mut element = MarkdownElement::new();
        element.connect();
        element.set_markdown("*text*");
        assert!(!element.output_target().is_empty());

        element.set_markdown("");
        assert!(element.output_target().is_empty());

        element.set_markdown("*again*");
        element.clear_markdown();
        assert!(element.output_target().is_empty());
    }

    #[test]
    fn test_empty_render_emits_no_event() {
        let mut element = MarkdownElement::new();
        let renders = count_renders(&mut element);
        element.connect();
        assert_eq!(renders.get(), 0);
        element.set_markdown("x");
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_setters_render_while_connected() {
        let mut element = MarkdownElement::new();
        let renders = count_renders(&mut element);
        element.set_markdown("one\ntwo");
        element.connect();
        assert_eq!(element.output_target().content(), "<p>one\ntwo</p>");

        element.set_breaks(true);
        assert_eq!(element.output_target().content(), "<p>one<br>two</p>");
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_disconnected_changes_render_once_on_connect() {
        let mut element = MarkdownElement::new();
        let renders = count_renders(&mut element);
        let output = element.output_target().clone();

        element.set_markdown("first");
        element.set_breaks(true);
        element.set_pedantic(true);
        element.set_sanitize(true);
        element.set_smartypants(true);
        element.set_markdown("\"latest\"");

        assert!(element.is_dirty());
        assert!(output.is_empty());
        assert_eq!(renders.get(), 0);

        element.connect();
        assert_eq!(renders.get(), 1);
        assert!(!element.is_dirty());
        assert_eq!(output.content(), "<p>\u{201c}latest\u{201d}</p>");
    }

    #[test]
    fn test_disconnect_suppresses_renders() {
        let mut element = MarkdownElement::new();
        element.set_markdown("a");
        element.connect();
        element.disconnect();

        element.set_markdown("b");
        element.set_markdown("c");
        assert_eq!(element.output_target().content(), "<p>a</p>");

        element.connect();
        assert_eq!(element.output_target().content(), "<p>c</p>");
    }

    #[test]
    fn test_apply_options_renders_once() {
        let mut element = MarkdownElement::new();
        let renders = count_renders(&mut element);
        element.set_markdown("a <b>b</b>");
        element.connect();

        element.apply_options(ElementOptions {
            sanitize: Some(true),
            breaks: Some(true),
            ..Default::default()
        });
        assert_eq!(renders.get(), 2);
        assert_eq!(
            element.output_target().content(),
            "<p>a &lt;b&gt;b&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn test_slotted_output_preferred() {
        let mut element = MarkdownElement::new();
        let slot = OutputNode::new();
        element.set_output(Some(slot.clone()));
        element.set_markdown("x");
        element.connect();

        assert_eq!(slot.content(), "<p>x</p>");
        assert!(element.output_target().same_node(&slot));

        element.set_output(None);
        element.set_markdown("y");
        assert_eq!(slot.content(), "<p>x</p>");
        assert_eq!(element.output_target().content(), "<p>y</p>");
    }

    #[test]
    fn test_assigned_slot_receives_current_render() {
        let mut element = MarkdownElement::new();
        let renders = count_renders(&mut element);
        element.set_markdown("*now*");
        element.connect();

        let slot = OutputNode::new();
        element.set_output(Some(slot.clone()));
        assert_eq!(slot.content(), "<p><em>now</em></p>");
        assert_eq!(renders.get(), 2);

        element.disconnect();
        let later = OutputNode::new();
        element.set_output(Some(later.clone()));
        assert!(later.is_empty());
        assert!(element.is_dirty());

        element.connect();
        assert_eq!(later.content(), "<p><em>now</em></p>");
    }

    #[test]
    fn test_renderer_mutator() {
        let mut element = MarkdownElement::new();
        element.set_renderer(Some(Rc::new(|rules: &mut HtmlRules| {
            rules.link = Box::new(|href, _title, text| {
                format!(r#"<a href="{href}" target="_blank">{text}</a>"#)
            });
        })));
        element.set_markdown("[docs](https://example.com)");
        element.connect();
        assert_eq!(
            element.output_target().content(),
            r#"<p><a href="https://example.com" target="_blank">docs</a></p>"#
        );
    }

    #[test]
    fn test_sanitizer_and_callback() {
        let captured = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&captured);

        let mut element = MarkdownElement::new();
        element.set_sanitize(true);
        element.set_sanitizer(Some(Rc::new(|_html: &str| String::new())));
        element.set_callback(Some(Rc::new(move |html: &str| {
            sink.borrow_mut().push(html.to_owned());
        })));
        element.set_markdown("a <i>b</i>");
        element.connect();

        assert_eq!(element.output_target().content(), "<p>a b</p>");
        assert_eq!(*captured.borrow(), vec!["<p>a b</p>".to_owned()]);
    }

    #[test]
    fn test_syntax_highlight_event() {
        let mut element = MarkdownElement::new();
        element.on_syntax_highlight(|event| {
            let detail = event.detail_mut();
            if detail.lang.as_deref() == Some("rust") {
                detail.code = format!("<span class=\"hl\">{}</span>", detail.code.trim());
            }
        });
        element.set_markdown("```rust\nlet x = 1;\n```\n\n```\n<raw>\n```");
        element.connect();

        let html = element.output_target().content();
        assert!(html.contains(r#"<code class="language-rust"><span class="hl">let x = 1;</span></code>"#));
        assert!(html.contains("<pre><code>&lt;raw&gt;\n</code></pre>"));
    }

    #[test]
    fn test_attribute_wins_over_source() {
        let (mut element, transport) =
            element_with(MockTransport::new().with_response(README_URL, 200, "remote"));
        element.set_markdown("attribute");
        element.append_source(SourceNode::inline("inline").with_src(README_URL));
        element.connect();

        assert_eq!(element.output_target().content(), "<p>attribute</p>");
        assert_eq!(element.fetch_state(), ReadyState::Unsent);
        assert!(!element.wait_for_fetch());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_inline_source_unindented() {
        let mut element = MarkdownElement::new();
        element.append_source(SourceNode::inline(
            "\n      # Title\n\n          code block\n    ",
        ));
        element.connect();

        assert_eq!(element.markdown(), Some("\n# Title\n\n    code block\n"));
        assert_eq!(
            element.output_target().content(),
            "<h1 id=\"title\">Title</h1><pre><code>code block\n</code></pre>"
        );
    }

    #[test]
    fn test_no_source_leaves_markdown_empty() {
        let mut element = MarkdownElement::new();
        element.connect();
        assert_eq!(element.markdown(), None);
        assert!(element.output_target().is_empty());
    }

    #[test]
    fn test_blank_inline_source_ignored() {
        let mut element = MarkdownElement::new();
        element.append_source(SourceNode::inline("   \n  "));
        element.connect();
        assert_eq!(element.markdown(), None);
    }

    #[test]
    fn test_only_first_source_used() {
        let mut element = MarkdownElement::new();
        element.append_source(SourceNode::inline("first"));
        element.append_source(SourceNode::inline("second"));
        element.connect();
        assert_eq!(element.output_target().content(), "<p>first</p>");
    }

    #[test]
    fn test_remote_fetch_forces_sanitize() {
        let (mut element, transport) = element_with(
            MockTransport::new().with_response(README_URL, 200, "*hi* <b>x</b>"),
        );
        element.append_source(SourceNode::remote(README_URL));
        element.connect();
        assert_eq!(element.fetch_state(), ReadyState::Opened);
        assert!(element.output_target().is_empty());

        assert!(element.wait_for_fetch());
        assert_eq!(element.fetch_state(), ReadyState::Done);
        assert_eq!(element.options().sanitize, Some(true));
        assert_eq!(
            element.output_target().content(),
            "<p><em>hi</em> &lt;b&gt;x&lt;/b&gt;</p>"
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, README_URL);
        assert_eq!(requests[0].header("Accept"), Some("text/markdown"));
    }

    #[test]
    fn test_disable_remote_sanitization() {
        let (mut element, _) =
            element_with(MockTransport::new().with_response(README_URL, 200, "<b>x</b>"));
        element.set_disable_remote_sanitization(true);
        element.append_source(SourceNode::remote(README_URL));
        element.connect();
        element.wait_for_fetch();

        assert_eq!(element.options().sanitize, None);
        assert_eq!(element.output_target().content(), "<p><b>x</b></p>");
    }

    #[test]
    fn test_inline_placeholder_then_remote() {
        let (mut element, _) =
            element_with(MockTransport::new().with_response(README_URL, 200, "remote"));
        element.append_source(SourceNode::inline("  placeholder").with_src(README_URL));
        element.connect();
        assert_eq!(element.output_target().content(), "<p>placeholder</p>");

        element.wait_for_fetch();
        assert_eq!(element.output_target().content(), "<p>remote</p>");
    }

    #[test]
    fn test_status_zero_is_success() {
        let (mut element, _) =
            element_with(MockTransport::new().with_response("local.md", 0, "# Local"));
        element.append_source(SourceNode::remote("local.md"));
        element.connect();
        element.wait_for_fetch();
        assert_eq!(
            element.output_target().content(),
            r#"<h1 id="local">Local</h1>"#
        );
    }

    #[test]
    fn test_fetch_404_falls_back_to_failure_text() {
        let (mut element, _) = element_with(MockTransport::new());
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        element.on_request_error(move |event| {
            assert!(event.is_cancelable());
            sink.borrow_mut().push(event.detail().clone());
        });
        element.append_source(SourceNode::remote(README_URL));
        element.connect();
        element.wait_for_fetch();

        let errors = errors.borrow();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].url, README_URL);
        assert_eq!(errors[0].status, Some(404));
        assert_eq!(element.markdown(), Some(FAILURE_TEXT));
        assert_eq!(
            element.output_target().content(),
            "<p>Failed loading markdown source</p>"
        );
        // Failure path does not touch sanitize.
        assert_eq!(element.options().sanitize, None);
    }

    #[test]
    fn test_cancelled_error_keeps_markdown() {
        let (mut element, _) = element_with(MockTransport::new());
        element.on_request_error(|event| event.prevent_default());
        element.append_source(SourceNode::inline("kept").with_src(README_URL));
        element.connect();
        element.wait_for_fetch();

        assert_eq!(element.markdown(), Some("kept"));
        assert_eq!(element.output_target().content(), "<p>kept</p>");
    }

    #[test]
    fn test_transport_failure_is_request_error() {
        let (mut element, _) = element_with(MockTransport::new().with_failure(README_URL));
        let failed = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&failed);
        element.on_request_error(move |event| *sink.borrow_mut() = Some(event.detail().clone()));
        element.append_source(SourceNode::remote(README_URL));
        element.connect();
        element.wait_for_fetch();

        let failed = failed.borrow().clone().unwrap();
        assert_eq!(failed.status, None);
        assert!(failed.error.unwrap().contains("connection refused"));
        assert_eq!(element.markdown(), Some(FAILURE_TEXT));
    }

    #[test]
    fn test_load_end_always_fires_after_outcome() {
        let (mut element, _) = element_with(
            MockTransport::new()
                .with_response(README_URL, 200, "ok")
                .with_response("https://example.com/gone.md", 410, "gone"),
        );
        let loads = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&loads);
        element.on_load_end(move |event| sink.borrow_mut().push(event.detail().status));
        element.connect();

        element.request(README_URL);
        element.wait_for_fetch();
        assert_eq!(element.markdown(), Some("ok"));

        element.request("https://example.com/gone.md");
        element.wait_for_fetch();
        assert_eq!(element.markdown(), Some(FAILURE_TEXT));

        assert_eq!(*loads.borrow(), vec![Some(200), Some(410)]);
    }

    #[test]
    fn test_source_location_change_restarts_fetch() {
        let (mut element, transport) = element_with(
            MockTransport::new()
                .with_response(README_URL, 200, "first")
                .with_response("https://example.com/other.md", 200, "second"),
        );
        element.append_source(SourceNode::remote(README_URL));
        element.connect();
        element.wait_for_fetch();
        assert_eq!(element.output_target().content(), "<p>first</p>");

        element.set_source_location(Some("https://example.com/other.md".to_owned()));
        element.wait_for_fetch();
        assert_eq!(element.output_target().content(), "<p>second</p>");
        assert_eq!(transport.requests().len(), 2);

        // Same location and removal do not fetch.
        element.set_source_location(Some("https://example.com/other.md".to_owned()));
        element.set_source_location(None);
        assert!(!element.wait_for_fetch());
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_source_location_before_connect_is_used_on_connect() {
        let (mut element, transport) =
            element_with(MockTransport::new().with_response(README_URL, 200, "late"));
        element.append_source(SourceNode::inline("x"));
        element.set_source_location(Some(README_URL.to_owned()));
        assert!(transport.requests().is_empty());

        element.connect();
        element.wait_for_fetch();
        assert_eq!(element.output_target().content(), "<p>late</p>");
    }

    #[test]
    fn test_source_location_without_source_node() {
        let (mut element, transport) = element_with(MockTransport::new());
        element.connect();
        element.set_source_location(Some(README_URL.to_owned()));
        assert!(element.source().is_none());
        assert!(!element.wait_for_fetch());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_remote_completion_while_disconnected() {
        let (mut element, _) =
            element_with(MockTransport::new().with_response(README_URL, 200, "remote"));
        element.append_source(SourceNode::remote(README_URL));
        element.connect();
        element.disconnect();

        element.wait_for_fetch();
        assert!(element.output_target().is_empty());
        assert!(element.is_dirty());

        element.connect();
        assert_eq!(element.output_target().content(), "<p>remote</p>");
    }

    #[test]
    fn test_poll_without_fetch() {
        let mut element = MarkdownElement::new();
        assert!(!element.poll());
    }

    #[test]
    fn test_poll_applies_completion() {
        let (mut element, _) =
            element_with(MockTransport::new().with_response(README_URL, 200, "polled"));
        element.connect();
        assert!(element.request(README_URL));
        while !element.poll() {
            std::thread::yield_now();
        }
        assert_eq!(element.output_target().content(), "<p>polled</p>");
    }
}
