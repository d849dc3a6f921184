use core::fmt;

use crate::Loc;

/// One frame of a [`Traceback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub closure: String,
    pub path: String,
    /// Instruction index within the closure.
    pub index: usize,
    pub loc: Option<Loc>,
}

/// Call stack snapshot, innermost frame first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traceback {
    pub entries: Vec<TraceEntry>,
    /// Frames left out because of the limit.
    pub omitted: usize,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(
                f,
                "  at {} ({}:{}:{})",
                self.closure, self.path, loc.lineno, loc.col_offset
            ),
            None => write!(f, "  at {} ({}, instruction {})", self.closure, self.path, self.index),
        }
    }
}

impl fmt::Display for Traceback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Traceback (most recent call first):")?;
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        if self.omitted > 0 {
            writeln!(f, "  ... {} more", self.omitted)?;
        }
        Ok(())
    }
}
