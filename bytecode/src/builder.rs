use crate::{Instruction, Op};

/// A forward jump whose offset has not been resolved yet.
///
/// Created by [`CodeBuilder::jump`], [`CodeBuilder::jump_if`] and
/// [`CodeBuilder::jump_exc`]. Resolve it with [`CodeBuilder::bind`].
#[derive(Debug)]
#[must_use]
pub struct Label {
    /// Index of the jump instruction; offsets are relative to it.
    index: usize,
}

/// Builds the instruction vector of one closure.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    code: Vec<Instruction>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::with_capacity(capacity),
        }
    }

    /// Index the next emitted instruction will have.
    pub fn current_index(&self) -> usize {
        self.code.len()
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.code
    }

    pub fn build(self) -> Vec<Instruction> {
        self.code
    }

    // ── emit helpers ───────────────────────────────────────────────

    pub fn emit(&mut self, op: Op, oprd1: u64, oprd2: u64) -> &mut Self {
        self.code.push(Instruction::new(op, oprd1, oprd2));
        self
    }

    pub fn op(&mut self, op: Op) -> &mut Self {
        self.emit(op, 0, 0)
    }

    pub fn op1(&mut self, op: Op, oprd1: u64) -> &mut Self {
        self.emit(op, oprd1, 0)
    }

    // ── jumps ──────────────────────────────────────────────────────

    fn emit_jump_placeholder(&mut self, op: Op, oprd2: u64) -> Label {
        let index = self.code.len();
        self.emit(op, 0, oprd2);
        Label { index }
    }

    /// `JMP` forward.
    pub fn jump(&mut self) -> Label {
        self.emit_jump_placeholder(Op::Jmp, 0)
    }

    /// `JMPIF` forward, taken when the top of the evaluation stack is truthy.
    pub fn jump_if(&mut self) -> Label {
        self.emit_jump_placeholder(Op::JmpIf, 0)
    }

    /// `JMPEXC` forward, taken when an exception is stored (`when_set`) or
    /// when none is.
    pub fn jump_exc(&mut self, when_set: bool) -> Label {
        self.emit_jump_placeholder(Op::JmpExc, when_set as u64)
    }

    /// Binds a forward jump label to the current position.
    pub fn bind(&mut self, label: Label) {
        let offset = (self.code.len() as i64) - (label.index as i64);
        self.code[label.index].oprd1 = offset as u64;
    }

    /// `JMPR` to an absolute index obtained from
    /// [`current_index`](Self::current_index).
    pub fn loop_to(&mut self, target: usize) -> &mut Self {
        self.emit(Op::JmpR, target as u64, 0)
    }
}
