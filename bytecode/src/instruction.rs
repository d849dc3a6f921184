use core::fmt;

use crate::Op;

/// One decoded instruction: an opcode and two raw operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub oprd1: u64,
    pub oprd2: u64,
}

impl Instruction {
    #[inline]
    pub const fn new(op: Op, oprd1: u64, oprd2: u64) -> Self {
        Self { op, oprd1, oprd2 }
    }

    /// `oprd1` read as a two's-complement offset.
    #[inline]
    pub const fn offset(&self) -> i64 {
        self.oprd1 as i64
    }
}

impl From<Op> for Instruction {
    fn from(op: Op) -> Self {
        Self::new(op, 0, 0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Op::Jmp | Op::JmpIf | Op::JmpExc => {
                write!(f, "{} {:+}", self.op, self.offset())?;
                if self.oprd2 != 0 {
                    write!(f, " {}", self.oprd2)?;
                }
                Ok(())
            }
            op if self.oprd2 != 0 => write!(f, "{op} {} {}", self.oprd1, self.oprd2),
            op if self.oprd1 != 0 => write!(f, "{op} {}", self.oprd1),
            op => write!(f, "{op}"),
        }
    }
}
