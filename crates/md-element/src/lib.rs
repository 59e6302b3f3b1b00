//! Markdown element for hosts that embed rendered markdown.
//!
//! A [`MarkdownElement`] takes markdown from a direct value or from its first
//! [`SourceNode`] child (inline text, a remote `src`, or both) and renders it
//! into an [`OutputNode`] with [`md_renderer`].
//!
//! # Architecture
//!
//! - [`MarkdownElement`]: lifecycle, property setters and the render pipeline.
//!   Renders happen synchronously on every change while connected.
//! - [`Transport`]: one blocking GET with `Accept: text/markdown`.
//!   [`HttpTransport`] uses ureq for `http(s)://` and reads local files.
//!   [`MockTransport`] is available behind the `mock` feature.
//! - [`unindent`]: strips the indentation inline sources inherit from the
//!   surrounding markup.
//! - [`Event`]: notifications (`marked-render-complete`, `syntax-highlight`,
//!   `marked-loadend`, `marked-request-error`) delivered to closures.
//!
//! Remote fetches run on a worker thread; the host applies the result with
//! [`MarkdownElement::poll`] or [`MarkdownElement::wait_for_fetch`].
//!
//! # Example
//!
//! ```
//! use md_element::{MarkdownElement, SourceNode};
//!
//! let mut element = MarkdownElement::new();
//! element.append_source(SourceNode::inline("\n    # Title\n\n    Some *text*.\n  "));
//! element.connect();
//! assert_eq!(
//!     element.output_target().content(),
//!     r#"<h1 id="title">Title</h1><p>Some <em>text</em>.</p>"#
//! );
//! ```

mod element;
mod event;
mod fetch;
mod node;
mod transport;
mod unindent;

pub use element::{
    ElementOptions, FAILURE_TEXT, MarkdownElement, RenderCallback, RendererMutator, Sanitizer,
};
pub use event::{Event, EventKind, FetchEvent, HighlightDetail};
pub use fetch::ReadyState;
pub use md_renderer::HtmlRules;
pub use node::{OutputNode, SourceNode};
#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
pub use transport::{
    DEFAULT_TIMEOUT, FetchRequest, FetchResponse, HttpTransport, MARKDOWN_MEDIA_TYPE, Transport,
    TransportError,
};
pub use unindent::unindent;
