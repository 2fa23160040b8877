//! Outcome type for property dispatch.

use crate::registry::descriptor::FuncIndex;

/// Result of translating a property id through a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The property is unmapped for this instance's class (or the class is
    /// entirely unreferenced in the current image); callers should continue
    /// up the inheritance chain rather than treat this as an error.
    NotFound,
    /// The property maps to this function index in the instance's vtable.
    Found(FuncIndex),
}

impl DispatchOutcome {
    /// True if a function index was found.
    pub fn is_found(&self) -> bool {
        matches!(self, DispatchOutcome::Found(_))
    }
}
