//! The box tree: owner of every box and line box of a layout pass.

use std::rc::Rc;

use trellis_style::Style;

use crate::arena::{Arena, BoxId, LineId};
use crate::error::TreeError;
use crate::layout_box::{BoxKindTag, LayoutBox};
use crate::line_box::LineBox;
use crate::stacking::Layer;

/// Arena-backed box tree.
///
/// Boxes refer to each other by [`BoxId`]; the tree owns them all. Dropping
/// the tree, or calling [`BoxTree::release`], frees every box and line box at
/// once and clears the box slot of every node that still points here.
#[derive(Default)]
pub struct BoxTree {
    pub(crate) boxes: Arena<BoxId, LayoutBox>,
    pub(crate) lines: Arena<LineId, LineBox>,
    pub(crate) root: Option<BoxId>,
    pub(crate) layers: Vec<Layer>,
}

impl BoxTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a box.
    ///
    /// # Errors
    /// Returns [`TreeError::StaleBox`] if `id` was destroyed or released.
    pub fn get(&self, id: BoxId) -> Result<&LayoutBox, TreeError> {
        self.boxes.get(id).ok_or(TreeError::StaleBox(id))
    }

    pub(crate) fn get_mut(&mut self, id: BoxId) -> Result<&mut LayoutBox, TreeError> {
        self.boxes.get_mut(id).ok_or(TreeError::StaleBox(id))
    }

    /// Borrow a line box.
    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&LineBox> {
        self.lines.get(id)
    }

    /// Whether `id` refers to a live box.
    #[must_use]
    pub fn contains(&self, id: BoxId) -> bool {
        self.boxes.contains(id)
    }

    /// Number of live boxes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the tree holds no boxes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Number of live line boxes.
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The root box.
    #[must_use]
    pub const fn root(&self) -> Option<BoxId> {
        self.root
    }

    /// Make `id` the root box. The root must not have a parent.
    ///
    /// # Errors
    /// Fails if `id` is stale or already linked under a parent.
    pub fn set_root(&mut self, id: BoxId) -> Result<(), TreeError> {
        if self.get(id)?.parent.is_some() {
            return Err(TreeError::AlreadyParented(id));
        }
        if let Some(old) = self.root {
            if let Some(old_box) = self.boxes.get_mut(old) {
                old_box.flags.root = false;
            }
        }
        self.get_mut(id)?.flags.root = true;
        self.root = Some(id);
        Ok(())
    }

    pub(crate) fn tag(&self, id: BoxId) -> Result<BoxKindTag, TreeError> {
        Ok(self.get(id)?.kind.tag())
    }

    pub(crate) fn style(&self, id: BoxId) -> Result<Rc<Style>, TreeError> {
        Ok(Rc::clone(&self.get(id)?.style))
    }

    /// Parent of `id`.
    ///
    /// # Errors
    /// Returns [`TreeError::StaleBox`] if `id` is not alive.
    pub fn parent(&self, id: BoxId) -> Result<Option<BoxId>, TreeError> {
        Ok(self.get(id)?.parent)
    }

    /// Ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut current = self.boxes.get(id).and_then(|b| b.parent);
        while let Some(ancestor) = current {
            out.push(ancestor);
            current = self.boxes.get(ancestor).and_then(|b| b.parent);
        }
        out
    }

    /// `id` and all of its descendants, in pre-order.
    #[must_use]
    pub fn subtree(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.boxes.contains(current) {
                continue;
            }
            out.push(current);
            let mut children = self.child_ids(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// The nearest ancestor that is not an inline box. Box frames are
    /// relative to it.
    #[must_use]
    pub fn offset_parent(&self, id: BoxId) -> Option<BoxId> {
        let mut current = self.boxes.get(id)?.parent;
        while let Some(ancestor) = current {
            let node = self.boxes.get(ancestor)?;
            if !node.kind.tag().is_inline_box() {
                return Some(ancestor);
            }
            current = node.parent;
        }
        None
    }

    /// The nearest ancestor block container (the containing block of
    /// in-flow content).
    #[must_use]
    pub fn containing_block(&self, id: BoxId) -> Option<BoxId> {
        self.ancestors(id).into_iter().find(|&ancestor| {
            self.boxes
                .get(ancestor)
                .is_some_and(|b| !b.kind.tag().is_inline_box())
        })
    }

    /// Position of the border box of `id` relative to the border box of
    /// `ancestor`, summing frames along the offset-parent chain.
    #[must_use]
    pub fn offset_from(&self, id: BoxId, ancestor: BoxId) -> (f32, f32) {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut current = id;
        while current != ancestor {
            let Some(node) = self.boxes.get(current) else {
                break;
            };
            x += node.frame.x;
            y += node.frame.y;
            match self.offset_parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        (x, y)
    }

    /// Walk the whole tree from the root and check every child list and the
    /// structural rules the builder maintains.
    ///
    /// # Errors
    /// Returns [`TreeError::Corrupt`] at the first broken link or invalid
    /// nesting.
    pub fn verify(&self) -> Result<(), TreeError> {
        let Some(root) = self.root else {
            return Ok(());
        };
        for id in self.subtree(root) {
            self.verify_list(id)?;
            let node = self.get(id)?;
            let parent_tag = match node.parent {
                Some(parent) => Some(self.tag(parent)?),
                None => None,
            };
            let tag = node.kind.tag();
            match tag {
                BoxKindTag::TableCell if parent_tag != Some(BoxKindTag::TableRow) => {
                    return Err(TreeError::Corrupt(id, "table cell outside a table row"));
                }
                BoxKindTag::TableRow if parent_tag != Some(BoxKindTag::TableSection) => {
                    return Err(TreeError::Corrupt(id, "table row outside a table section"));
                }
                BoxKindTag::TableSection | BoxKindTag::TableCaption
                    if parent_tag != Some(BoxKindTag::Table) =>
                {
                    return Err(TreeError::Corrupt(id, "table part outside a table"));
                }
                _ => {}
            }
            if parent_tag.is_some_and(BoxKindTag::is_inline_box)
                && !node.flags.inline
                && !node.is_out_of_flow()
                && tag != BoxKindTag::Text
            {
                return Err(TreeError::Corrupt(id, "block-level box inside an inline box"));
            }
        }
        Ok(())
    }

    /// Free every box and line box. Nodes that still point at a box of this
    /// tree have their slot cleared.
    pub fn release(&mut self) {
        for (id, node) in self.boxes.iter() {
            if let Some(dom) = node.node() {
                dom.clear_layout_box(id);
            }
        }
        self.boxes.clear();
        self.lines.clear();
        self.layers.clear();
        self.root = None;
    }

    /// Clear the preferred width cache of `id` and every ancestor.
    pub(crate) fn invalidate_preferred_widths(&self, id: BoxId) {
        let mut current = Some(id);
        while let Some(box_id) = current {
            let Some(node) = self.boxes.get(box_id) else {
                break;
            };
            node.preferred.set(None);
            current = node.parent;
        }
    }
}

impl Drop for BoxTree {
    fn drop(&mut self) {
        self.release();
    }
}
