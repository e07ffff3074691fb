//! Depth-indented layout tracing.
//!
//! With the `layout-trace` feature enabled, every [`enter`] prints one line to
//! stderr indented by the current nesting depth, and the returned guard
//! decrements the depth when it goes out of scope. Without the feature the
//! functions do nothing and the detail closure is never called.

#[cfg(feature = "layout-trace")]
use std::cell::Cell;

#[cfg(feature = "layout-trace")]
thread_local! {
    static LAYOUT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Guard struct that closes a trace scope on all return paths.
#[must_use = "the trace scope ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TraceScope {
    _private: (),
}

/// Open a trace scope named `label`.
///
/// `detail` is only evaluated when tracing is compiled in.
pub fn enter(label: &str, detail: impl FnOnce() -> String) -> TraceScope {
    #[cfg(feature = "layout-trace")]
    {
        let depth = LAYOUT_DEPTH.with(|d| {
            let current = d.get();
            d.set(current + 1);
            current
        });
        eprintln!(
            "{:indent$}[LAYOUT] {label} {}",
            "",
            detail(),
            indent = depth * 2
        );
    }
    #[cfg(not(feature = "layout-trace"))]
    {
        let _ = (label, detail);
    }
    TraceScope { _private: () }
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        #[cfg(feature = "layout-trace")]
        LAYOUT_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
