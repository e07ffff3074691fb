//! Resolved style values for the Trellis layout core.
//!
//! The cascade that produces these values lives outside this workspace. What
//! lives here is the query surface layout depends on: display kinds, the
//! positioning and float keywords, lengths that resolve against a container
//! dimension, and the [`Style`] record that carries them.
//!
//! # Relevant Specifications
//!
//! - [CSS Display Module Level 3](https://www.w3.org/TR/css-display-3/)
//! - [CSS 2.1 Visual Formatting Model](https://www.w3.org/TR/CSS2/visuren.html)
//! - [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)

pub mod display;
pub mod edges;
pub mod error;
pub mod length;
pub mod properties;
pub mod style;

pub use display::Display;
pub use edges::Edges;
pub use error::StyleError;
pub use length::Length;
pub use properties::{
    BoxSizing, Clear, Direction, Float, FlexDirection, ListStylePosition, Overflow, Position,
    PseudoType, TableLayoutMode, TextAlign, VerticalAlign, WhiteSpace,
};
pub use style::{DEFAULT_BORDER_SPACING, DEFAULT_FONT_SIZE, Style};
