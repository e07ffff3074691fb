//! Errors raised by box tree mutation and layout.
//!
//! These are broken contracts between the tree builder and the layout core,
//! not bad documents: degenerate input is handled with fallbacks and at most a
//! [`warn_once`](trellis_common::warning::warn_once).

use thiserror::Error;

use crate::arena::BoxId;

/// A violated box tree invariant. The current pass is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The handle refers to a box that was destroyed or released.
    #[error("box {0:?} is not alive in this tree")]
    StaleBox(BoxId),
    /// The child is already linked under another parent.
    #[error("box {0:?} already has a parent")]
    AlreadyParented(BoxId),
    /// The box kind has no child list.
    #[error("box {0:?} cannot have children")]
    NoChildList(BoxId),
    /// `child` is not linked under `parent`.
    #[error("box {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent.
        parent: BoxId,
        /// The box that was not found in its child list.
        child: BoxId,
    },
    /// `display: none` reached box creation.
    #[error("display '{0}' does not generate a box")]
    NoBoxForDisplay(&'static str),
    /// An inline box received block-level content but has no containing block.
    #[error("inline box {0:?} has no containing block to split")]
    DetachedInline(BoxId),
    /// Layout was requested on a tree without a root box.
    #[error("the box tree has no root")]
    NoRoot,
    /// A linked list or parent pointer disagrees with its neighbours.
    #[error("box list corrupted at {0:?}: {1}")]
    Corrupt(BoxId, &'static str),
}
