//! Structural self-checks for generated grid data.
//!
//! Checks run right after generation in debug builds, or in any build with
//! the `check-invariants` feature. They can always be called explicitly.

use crate::grid_error::GridError;

/// Types whose internal consistency can be verified after construction.
pub trait DebugInvariants {
    /// Returns the first violated invariant, if any.
    fn validate_invariants(&self) -> Result<(), GridError>;

    /// Panics on a violated invariant when checking is compiled in.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "debug_assert_invariants");
    }
}

/// Runs a fallible check and panics with `ctx` on failure when invariant
/// checking is compiled in; expands to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $ctx:expr) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(err) = $check {
            panic!("[invariants] {}: {}", $ctx, err);
        }
    };
}
