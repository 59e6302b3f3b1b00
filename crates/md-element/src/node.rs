//! Host nodes the element reads from and writes into.

use std::cell::RefCell;
use std::rc::Rc;

/// Node whose content is replaced by rendered HTML.
///
/// Cloning yields another handle to the same node, so the host keeps a handle
/// and observes what the element writes.
#[derive(Clone, Debug, Default)]
pub struct OutputNode {
    content: Rc<RefCell<String>>,
}

impl OutputNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current HTML content.
    ///
    /// # Panics
    ///
    /// Panics if the content is being written at the same time.
    #[must_use]
    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    /// Whether the node has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.borrow().is_empty()
    }

    /// Replace the content.
    pub fn set_content(&self, html: String) {
        *self.content.borrow_mut() = html;
    }

    pub fn clear(&self) {
        self.content.borrow_mut().clear();
    }

    /// Whether both handles point at the same node.
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.content, &other.content)
    }
}

/// Child node carrying markdown, either inline or via a remote `src`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceNode {
    /// Inline text, usually indented to match the surrounding markup.
    pub text: String,
    /// Remote location to fetch markdown from.
    pub src: Option<String>,
}

impl SourceNode {
    /// Inline source with the given text.
    #[must_use]
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            src: None,
        }
    }

    /// Remote source without inline text.
    #[must_use]
    pub fn remote(src: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            src: Some(src.into()),
        }
    }

    /// Set the remote location.
    #[must_use]
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Whether the inline text contains anything but whitespace.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
