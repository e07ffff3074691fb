//! Document nodes as the layout core sees them.
//!
//! The document tree itself lives outside this crate. A box only needs an
//! identity to point back at, a tag name to recognise the root element, and
//! one slot on the node to record which box it generated.

use std::cell::Cell;
use std::rc::Rc;

use crate::arena::BoxId;

/// A content node that can generate a box.
#[derive(Debug)]
pub struct Node {
    tag_name: String,
    layout_box: Cell<Option<BoxId>>,
}

impl Node {
    /// A node with the given (lower-case) tag name.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            tag_name: tag_name.into(),
            layout_box: Cell::new(None),
        })
    }

    /// Element tag name.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/semantics.html#the-html-element)
    ///
    /// Whether this node is the document element, whose box is the root box.
    #[must_use]
    pub fn is_root_element(&self) -> bool {
        self.tag_name.eq_ignore_ascii_case("html")
    }

    /// The box this node currently generates, if any.
    #[must_use]
    pub fn layout_box(&self) -> Option<BoxId> {
        self.layout_box.get()
    }

    pub(crate) fn set_layout_box(&self, id: Option<BoxId>) {
        self.layout_box.set(id);
    }

    /// Clear the slot only if it still points at `id`.
    pub(crate) fn clear_layout_box(&self, id: BoxId) {
        if self.layout_box.get() == Some(id) {
            self.layout_box.set(None);
        }
    }
}
