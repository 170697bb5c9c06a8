//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled, [`profile_function`] and
//! [`profile_scope`] expand to nothing.

#[cfg(feature = "profiling")]
pub use puffin::{GlobalProfiler, profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __grapple_profile_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
pub use crate::__grapple_profile_noop as profile_function;

#[cfg(not(feature = "profiling"))]
pub use crate::__grapple_profile_noop as profile_scope;

/// Turn scope collection on or off.
#[cfg(feature = "profiling")]
pub fn set_enabled(enabled: bool) {
    puffin::set_scopes_on(enabled);
}

/// Turn scope collection on or off.
#[cfg(not(feature = "profiling"))]
pub fn set_enabled(_enabled: bool) {}

/// Mark the start of a new profiling frame.
///
/// Hosts driving the kernel from a frame loop call this once per frame.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
