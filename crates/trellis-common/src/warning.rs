//! Layout warnings with colored terminal output.
//!
//! Provides deduplication so a degenerate document does not spam the same
//! warning once per box. Used by the style and layout crates to report input
//! that was handled by a fallback instead of being rejected.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about degenerate or unsupported input (prints once per unique message)
///
/// Returns `true` if the message was printed, `false` if it had already been
/// reported since the last [`clear_warnings`].
///
/// # Example
/// ```
/// use trellis_common::warning::warn_once;
///
/// let _ = warn_once("Layout", "table column group contains a non-column child");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let should_print = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_print {
        eprintln!("{}", format!("[Trellis {component}] ⚠ {message}").yellow());
    }
    should_print
}

/// Clear all recorded warnings (call at the start of a layout pass)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_deduplicates() {
        assert!(warn_once("Test", "dedup-check message"));
        assert!(
            !warn_once("Test", "dedup-check message"),
            "the same message must only print once"
        );
        assert!(warn_once("Other", "dedup-check message"));
    }
}
