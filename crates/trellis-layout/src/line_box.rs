//! Line boxes.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "The rectangular area that contains the boxes that form a line is called
//! a line box."
//!
//! Every line box has exactly one owner box. Creating a line box registers
//! it with the owner (a list slot for text, inline and block boxes, a single
//! slot for atomic inlines) and with its parent line; destroying it removes
//! both registrations before its own children are torn down.

use serde::Serialize;

use crate::arena::{BoxId, LineId};
use crate::box_model::Rect;
use crate::error::TreeError;
use crate::layout_box::BoxKindTag;
use crate::tree::BoxTree;

/// What a line box records.
#[derive(Debug, Clone, PartialEq)]
pub enum LineBoxKind {
    /// A run of text from a text box.
    Text {
        /// The text placed on this line (already white-space processed).
        text: String,
    },
    /// The placement of one atomic inline (replaced element, inline-block,
    /// inline-table, inline-flex).
    Replaced,
    /// The part of an inline box that falls on one line.
    Flow {
        /// Nested line boxes, in visual order.
        children: Vec<LineId>,
    },
    /// One visual line of a block container.
    Root {
        /// Top-level line boxes on this line, in visual order.
        children: Vec<LineId>,
    },
}

/// Field-less mirror of [`LineBoxKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineBoxKindTag {
    /// [`LineBoxKind::Text`]
    Text,
    /// [`LineBoxKind::Replaced`]
    Replaced,
    /// [`LineBoxKind::Flow`]
    Flow,
    /// [`LineBoxKind::Root`]
    Root,
}

/// A line box.
#[derive(Debug, Clone)]
pub struct LineBox {
    pub(crate) owner: BoxId,
    pub(crate) parent: Option<LineId>,
    /// Relative to the border box of the block container that laid out the line.
    pub(crate) rect: Rect,
    pub(crate) kind: LineBoxKind,
}

impl LineBox {
    /// The box this line box belongs to.
    #[must_use]
    pub const fn owner(&self) -> BoxId {
        self.owner
    }

    /// The enclosing line box; `None` for root lines.
    #[must_use]
    pub const fn parent(&self) -> Option<LineId> {
        self.parent
    }

    /// Geometry, relative to the border box of the block container.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// Kind and payload.
    #[must_use]
    pub const fn kind(&self) -> &LineBoxKind {
        &self.kind
    }

    /// Field-less kind tag.
    #[must_use]
    pub const fn tag(&self) -> LineBoxKindTag {
        match self.kind {
            LineBoxKind::Text { .. } => LineBoxKindTag::Text,
            LineBoxKind::Replaced => LineBoxKindTag::Replaced,
            LineBoxKind::Flow { .. } => LineBoxKindTag::Flow,
            LineBoxKind::Root { .. } => LineBoxKindTag::Root,
        }
    }

    /// Nested line boxes of flow and root lines.
    #[must_use]
    pub fn children(&self) -> &[LineId] {
        match &self.kind {
            LineBoxKind::Flow { children } | LineBoxKind::Root { children } => children,
            LineBoxKind::Text { .. } | LineBoxKind::Replaced => &[],
        }
    }

    /// The text of a text line box.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            LineBoxKind::Text { text } => Some(text),
            _ => None,
        }
    }
}

impl BoxTree {
    /// Create a line box and register it with its owner and parent line.
    ///
    /// Root lines must have no parent; every other kind must have one.
    ///
    /// # Errors
    /// Fails if the owner is stale or has no slot for this kind of line box.
    pub(crate) fn create_line(
        &mut self,
        owner: BoxId,
        parent: Option<LineId>,
        rect: Rect,
        kind: LineBoxKind,
    ) -> Result<LineId, TreeError> {
        debug_assert_eq!(
            parent.is_none(),
            matches!(kind, LineBoxKind::Root { .. }),
            "only root lines are parentless"
        );
        let is_replaced = matches!(kind, LineBoxKind::Replaced);
        // Validate the owner slot before allocating so a failure leaves
        // nothing behind.
        let tag = self.tag(owner)?;
        let has_slot = match kind {
            LineBoxKind::Text { .. } => tag == BoxKindTag::Text,
            LineBoxKind::Flow { .. } => tag.is_inline_box(),
            LineBoxKind::Root { .. } => tag.is_block_flow(),
            LineBoxKind::Replaced => true,
        };
        if !has_slot {
            return Err(TreeError::Corrupt(owner, "line box owner has no slot for this line"));
        }

        if is_replaced {
            if let Some(old) = self.get(owner)?.line {
                self.destroy_line(old);
            }
        }

        let id = self.lines.allocate(LineBox {
            owner,
            parent,
            rect,
            kind,
        });

        let node = self.get_mut(owner)?;
        if is_replaced {
            node.line = Some(id);
        } else if let Some(slot) = node.kind.lines_mut() {
            slot.push(id);
        }

        if let Some(parent) = parent {
            if let Some(parent_line) = self.lines.get_mut(parent) {
                match &mut parent_line.kind {
                    LineBoxKind::Flow { children } | LineBoxKind::Root { children } => {
                        children.push(id);
                    }
                    LineBoxKind::Text { .. } | LineBoxKind::Replaced => {}
                }
            }
        }
        Ok(id)
    }

    /// Destroy a line box and everything nested in it, deregistering each
    /// from its owner and parent.
    pub(crate) fn destroy_line(&mut self, id: LineId) {
        let Some(line) = self.lines.get(id) else {
            return;
        };
        let owner = line.owner;
        let parent = line.parent;
        let children = line.children().to_vec();

        // Unlink first, then tear down children.
        if let Some(node) = self.boxes.get_mut(owner) {
            if node.line == Some(id) {
                node.line = None;
            }
            if let Some(slot) = node.kind.lines_mut() {
                slot.retain(|&l| l != id);
            }
        }
        if let Some(parent) = parent {
            if let Some(parent_line) = self.lines.get_mut(parent) {
                if let LineBoxKind::Flow { children } | LineBoxKind::Root { children } =
                    &mut parent_line.kind
                {
                    children.retain(|&l| l != id);
                }
            }
        }
        let _ = self.lines.deallocate(id);

        for child in children {
            self.destroy_line(child);
        }
    }

    /// Destroy every root line of a block container.
    pub(crate) fn clear_lines(&mut self, block: BoxId) {
        let roots: Vec<LineId> = self
            .boxes
            .get(block)
            .and_then(|b| b.kind.block_flow())
            .map(|flow| flow.lines.clone())
            .unwrap_or_default();
        for root in roots {
            self.destroy_line(root);
        }
    }

    /// Move a line box and its nested line boxes.
    pub(crate) fn translate_line(&mut self, id: LineId, dx: f32, dy: f32) {
        let Some(line) = self.lines.get_mut(id) else {
            return;
        };
        line.rect = line.rect.translate(dx, dy);
        let children = line.children().to_vec();
        for child in children {
            self.translate_line(child, dx, dy);
        }
    }

    /// Destroy every line box owned by a box: its list slot and its single
    /// atomic slot.
    pub(crate) fn destroy_owned_lines(&mut self, owner: BoxId) {
        let owned = self.boxes.get(owner).map(|b| b.lines()).unwrap_or_default();
        for line in owned {
            self.destroy_line(line);
        }
    }
}
