//! Notifications emitted by the element.
//!
//! Listeners are plain closures called synchronously in registration order.
//! Cancelable events can be cancelled with [`Event::prevent_default`], which
//! suppresses the element's default action.

use std::fmt;

use tracing::debug;

/// Kind of element event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Output target was updated by a render.
    RenderComplete,
    /// A fenced code block asks for highlighting.
    SyntaxHighlight,
    /// A remote fetch finished, successfully or not.
    LoadEnd,
    /// A remote fetch failed.
    RequestError,
}

impl EventKind {
    /// Event name as seen by hosts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RenderComplete => "marked-render-complete",
            Self::SyntaxHighlight => "syntax-highlight",
            Self::LoadEnd => "marked-loadend",
            Self::RequestError => "marked-request-error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to listeners.
#[derive(Clone, Debug)]
pub struct Event<D> {
    kind: EventKind,
    detail: D,
    cancelable: bool,
    bubbles: bool,
    composed: bool,
    default_prevented: bool,
}

impl<D> Event<D> {
    pub(crate) fn new(kind: EventKind, detail: D) -> Self {
        Self {
            kind,
            detail,
            cancelable: false,
            bubbles: false,
            composed: false,
            default_prevented: false,
        }
    }

    #[must_use]
    pub(crate) fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    #[must_use]
    pub(crate) fn bubbling(mut self) -> Self {
        self.bubbles = true;
        self
    }

    #[must_use]
    pub(crate) fn composed(mut self) -> Self {
        self.composed = true;
        self
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub fn detail(&self) -> &D {
        &self.detail
    }

    /// Mutable payload, used by listeners to hand results back.
    pub fn detail_mut(&mut self) -> &mut D {
        &mut self.detail
    }

    pub(crate) fn into_detail(self) -> D {
        self.detail
    }

    #[must_use]
    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event crosses shadow boundaries.
    #[must_use]
    pub fn is_composed(&self) -> bool {
        self.composed
    }

    /// Cancel the default action. No effect on non-cancelable events.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Payload of [`EventKind::SyntaxHighlight`].
///
/// Listeners replace `code` with highlighted HTML; leaving it untouched (or
/// emptying it) keeps the original code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightDetail {
    pub code: String,
    pub lang: Option<String>,
}

/// Raw transport event carried by [`EventKind::LoadEnd`] and
/// [`EventKind::RequestError`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchEvent {
    /// Requested location.
    pub url: String,
    /// Response status; `None` when no response was received.
    pub status: Option<u16>,
    /// Transport error message, if the request itself failed.
    pub error: Option<String>,
}

impl FetchEvent {
    /// Whether the fetch counts as successful (status 0 or 2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(is_success_status)
    }
}

/// Status 0 (file access) or any 2xx status.
pub(crate) fn is_success_status(status: u16) -> bool {
    status == 0 || (200..300).contains(&status)
}

type Listener<D> = Box<dyn FnMut(&mut Event<D>)>;

/// Listeners for one event kind.
pub(crate) struct ListenerList<D> {
    listeners: Vec<Listener<D>>,
}

impl<D> Default for ListenerList<D> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<D> ListenerList<D> {
    pub(crate) fn push(&mut self, listener: impl FnMut(&mut Event<D>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn dispatch(&mut self, event: &mut Event<D>) {
        debug!(
            event = %event.kind,
            listeners = self.listeners.len(),
            "Dispatching event"
        );
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

/// All listener lists of an element.
#[derive(Default)]
pub(crate) struct Listeners {
    pub(crate) render_complete: ListenerList<()>,
    pub(crate) syntax_highlight: ListenerList<HighlightDetail>,
    pub(crate) load_end: ListenerList<FetchEvent>,
    pub(crate) request_error: ListenerList<FetchEvent>,
}

impl Listeners {
    /// Fire `syntax-highlight` and return the listener's replacement, if any.
    pub(crate) fn highlight(&mut self, code: &str, lang: Option<&str>) -> Option<String> {
        let detail = HighlightDetail {
            code: code.to_owned(),
            lang: lang.map(str::to_owned),
        };
        let mut event = Event::new(EventKind::SyntaxHighlight, detail)
            .cancelable()
            .composed();
        self.syntax_highlight.dispatch(&mut event);

        let detail = event.into_detail();
        if detail.code.is_empty() {
            None
        } else {
            Some(detail.code)
        }
    }

    pub(crate) fn render_complete(&mut self) {
        let mut event = Event::new(EventKind::RenderComplete, ())
            .bubbling()
            .composed();
        self.render_complete.dispatch(&mut event);
    }

    pub(crate) fn load_end(&mut self, fetch: FetchEvent) {
        let mut event = Event::new(EventKind::LoadEnd, fetch);
        self.load_end.dispatch(&mut event);
    }

    /// Fire `marked-request-error`; returns `true` if a listener cancelled it.
    pub(crate) fn request_error(&mut self, fetch: FetchEvent) -> bool {
        let mut event = Event::new(EventKind::RequestError, fetch).cancelable();
        self.request_error.dispatch(&mut event);
        event.default_prevented()
    }
}
