pub mod handle;
pub mod ref_count;

pub use handle::{Handle, SlotPool};
pub use ref_count::{RefCountPtr, RefCounted};

/// Marks a code path that must never run: panics when debug assertions are
/// enabled and evaluates to `$fallback` otherwise.
#[macro_export]
macro_rules! assert_no_entry {
    ($fallback:expr, $($arg:tt)+) => {{
        debug_assert!(false, $($arg)+);
        $fallback
    }};
}
