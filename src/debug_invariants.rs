use crate::mesh_error::MeshError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Panic on the first violated invariant.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshError>;
}

/// Check a structure's invariants after a mutation when the
/// `strict-invariants` feature is enabled; expands to nothing otherwise.
///
/// The second form runs any fallible check and panics with the given context.
#[macro_export]
macro_rules! debug_invariants {
    ($s:expr) => {{
        #[cfg(feature = "strict-invariants")]
        {
            use $crate::debug_invariants::DebugInvariants as _;
            $s.debug_assert_invariants();
        }
    }};
    ($expr:expr, $($ctx:tt)*) => {{
        #[cfg(feature = "strict-invariants")]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    }};
}
