use core::fmt;

/// Identifier of a closure inside its compartment.
pub type ClosureId = u64;

/// Structural key naming a closure: the compartment it was loaded into and
/// its id within that compartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClosureCtx {
    pub compartment_id: usize,
    pub closure_id: ClosureId,
}

impl ClosureCtx {
    pub const fn new(compartment_id: usize, closure_id: ClosureId) -> Self {
        Self {
            compartment_id,
            closure_id,
        }
    }
}

impl fmt::Display for ClosureCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.compartment_id, self.closure_id)
    }
}
