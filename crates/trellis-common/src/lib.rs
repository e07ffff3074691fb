//! Common utilities for the Trellis layout core.
//!
//! This crate provides shared infrastructure used by the style and layout crates:
//! - **Warning System** - colored, deduplicated terminal output for degenerate input
//! - **Layout Tracing** - depth-indented enter/exit tracing behind the `layout-trace` feature

pub mod trace;
pub mod warning;
