//! Intrusive sibling lists.
//!
//! A [`BoxList`] only stores the ends of the list; the links live in the
//! boxes themselves (`prev`, `next`, `parent`). Every mutation goes through
//! [`BoxTree`] so both ends and the boxes are updated together.

use crate::arena::BoxId;
use crate::error::TreeError;
use crate::tree::BoxTree;

/// The children of one box, as the two ends of a doubly-linked list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxList {
    pub(crate) first: Option<BoxId>,
    pub(crate) last: Option<BoxId>,
}

impl BoxList {
    /// First child.
    #[must_use]
    pub const fn first(&self) -> Option<BoxId> {
        self.first
    }

    /// Last child.
    #[must_use]
    pub const fn last(&self) -> Option<BoxId> {
        self.last
    }

    /// Whether the list has no children.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first.is_none()
    }
}

/// Forward iterator over a child list.
pub struct Children<'a> {
    tree: &'a BoxTree,
    next: Option<BoxId>,
}

impl Iterator for Children<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let current = self.next?;
        self.next = self.tree.boxes.get(current).and_then(|b| b.next);
        Some(current)
    }
}

impl BoxTree {
    fn list(&self, parent: BoxId) -> Result<BoxList, TreeError> {
        self.get(parent)?
            .kind
            .children()
            .copied()
            .ok_or(TreeError::NoChildList(parent))
    }

    fn list_mut(&mut self, parent: BoxId) -> Result<&mut BoxList, TreeError> {
        self.get_mut(parent)?
            .kind
            .children_mut()
            .ok_or(TreeError::NoChildList(parent))
    }

    /// Iterate over the children of `parent`. Kinds without a child list and
    /// stale handles yield nothing.
    #[must_use]
    pub fn children(&self, parent: BoxId) -> Children<'_> {
        let first = self
            .boxes
            .get(parent)
            .and_then(|b| b.kind.children())
            .and_then(|list| list.first);
        Children {
            tree: self,
            next: first,
        }
    }

    /// The children of `parent`, collected.
    #[must_use]
    pub fn child_ids(&self, parent: BoxId) -> Vec<BoxId> {
        self.children(parent).collect()
    }

    /// Link `child` at the end of `parent`'s child list.
    ///
    /// # Errors
    /// Fails if either handle is stale, `parent` has no child list, or
    /// `child` is already linked somewhere.
    pub(crate) fn append_child(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        self.insert_child_before(parent, child, None)
    }

    /// Link `child` into `parent`'s child list before `before` (or at the end).
    pub(crate) fn insert_child_before(
        &mut self,
        parent: BoxId,
        child: BoxId,
        before: Option<BoxId>,
    ) -> Result<(), TreeError> {
        if self.get(child)?.parent.is_some() {
            return Err(TreeError::AlreadyParented(child));
        }
        let list = self.list(parent)?;
        if let Some(before) = before {
            if self.get(before)?.parent != Some(parent) {
                return Err(TreeError::NotAChild {
                    parent,
                    child: before,
                });
            }
        }

        let prev = match before {
            Some(before) => self.get(before)?.prev,
            None => list.last,
        };

        {
            let node = self.get_mut(child)?;
            node.parent = Some(parent);
            node.prev = prev;
            node.next = before;
        }
        match prev {
            Some(prev) => self.get_mut(prev)?.next = Some(child),
            None => self.list_mut(parent)?.first = Some(child),
        }
        match before {
            Some(before) => self.get_mut(before)?.prev = Some(child),
            None => self.list_mut(parent)?.last = Some(child),
        }

        self.debug_check_list(parent);
        self.invalidate_preferred_widths(parent);
        Ok(())
    }

    /// Unlink `child` from `parent`'s child list. The child keeps its own
    /// subtree and can be linked elsewhere.
    pub(crate) fn remove_child(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        let (prev, next) = {
            let node = self.get(child)?;
            if node.parent != Some(parent) {
                return Err(TreeError::NotAChild { parent, child });
            }
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.get_mut(prev)?.next = next,
            None => self.list_mut(parent)?.first = next,
        }
        match next {
            Some(next) => self.get_mut(next)?.prev = prev,
            None => self.list_mut(parent)?.last = prev,
        }
        {
            let node = self.get_mut(child)?;
            node.parent = None;
            node.prev = None;
            node.next = None;
        }

        self.debug_check_list(parent);
        self.invalidate_preferred_widths(parent);
        Ok(())
    }

    /// Move the children of `from` that come after `after` (all of them when
    /// `after` is `None`) to the end of `to`, preserving order.
    pub(crate) fn move_children_after(
        &mut self,
        from: BoxId,
        to: BoxId,
        after: Option<BoxId>,
    ) -> Result<(), TreeError> {
        let mut current = match after {
            Some(after) => self.get(after)?.next,
            None => self.list(from)?.first,
        };
        while let Some(child) = current {
            current = self.get(child)?.next;
            self.remove_child(from, child)?;
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Check that the ends of `parent`'s list agree with a forward and a
    /// backward walk and that every child points back at `parent`.
    ///
    /// # Errors
    /// Returns [`TreeError::Corrupt`] at the first disagreement.
    pub fn verify_list(&self, parent: BoxId) -> Result<(), TreeError> {
        let Some(list) = self.get(parent)?.kind.children().copied() else {
            return Ok(());
        };

        let mut forward = Vec::new();
        let mut prev = None;
        let mut current = list.first;
        while let Some(child) = current {
            let node = self.get(child)?;
            if node.parent != Some(parent) {
                return Err(TreeError::Corrupt(child, "parent link differs from list owner"));
            }
            if node.prev != prev {
                return Err(TreeError::Corrupt(child, "prev link differs from forward walk"));
            }
            if forward.len() > self.boxes.len() {
                return Err(TreeError::Corrupt(child, "cycle in sibling list"));
            }
            forward.push(child);
            prev = Some(child);
            current = node.next;
        }
        if list.last != prev {
            return Err(TreeError::Corrupt(parent, "last child differs from forward walk"));
        }

        let mut backward = Vec::with_capacity(forward.len());
        let mut current = list.last;
        while let Some(child) = current {
            if backward.len() > forward.len() {
                return Err(TreeError::Corrupt(child, "backward walk is longer"));
            }
            backward.push(child);
            current = self.get(child)?.prev;
        }
        backward.reverse();
        if backward != forward {
            return Err(TreeError::Corrupt(parent, "backward walk differs from forward walk"));
        }
        Ok(())
    }

    fn debug_check_list(&self, parent: BoxId) {
        debug_assert!(
            self.verify_list(parent).is_ok(),
            "box list of {parent:?} is inconsistent"
        );
    }
}
