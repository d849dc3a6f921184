//! Activation records and the call stack.

use std::collections::HashMap;
use std::sync::Arc;

use bytecode::Instruction;
use object::{ClosureCtx, ClosureId, NativeValue, ObjectId};

use crate::{VmError, VmResult};

/// Variable key: index of the variable's name in the string literal table.
pub type VarKey = u64;

/// One call activation.
///
/// A frame executes its closure's instruction vector with a local pc. The
/// pc always points at the next instruction to fetch; while a handler runs
/// the instruction being executed is at `pc - 1`.
#[derive(Debug)]
pub struct Frame {
    ctx: ClosureCtx,
    code: Arc<[Instruction]>,
    pc: usize,
    /// Index of the caller's `INVK`; `None` for the entry frame.
    return_addr: Option<usize>,
    /// Index of this frame's context on the invocation-context stack.
    invk_ctx: usize,
    /// Call-stack index of the nearest live frame of the lexical parent.
    parent: Option<usize>,
    visible: HashMap<VarKey, ObjectId>,
    invisible: HashMap<VarKey, ObjectId>,
    eval: Vec<NativeValue>,
    exc: Option<ObjectId>,
    /// Code windows suspended by signal vectors, innermost last.
    suspended: Vec<(Arc<[Instruction]>, usize)>,
}

impl Frame {
    pub fn new(
        ctx: ClosureCtx,
        code: Arc<[Instruction]>,
        invk_ctx: usize,
        return_addr: Option<usize>,
        parent: Option<usize>,
    ) -> Self {
        Self {
            ctx,
            code,
            pc: 0,
            return_addr,
            invk_ctx,
            parent,
            visible: HashMap::new(),
            invisible: HashMap::new(),
            eval: Vec::new(),
            exc: None,
            suspended: Vec::new(),
        }
    }

    #[inline]
    pub fn closure_ctx(&self) -> ClosureCtx {
        self.ctx
    }

    #[inline]
    pub fn return_addr(&self) -> Option<usize> {
        self.return_addr
    }

    #[inline]
    pub fn invk_ctx_index(&self) -> usize {
        self.invk_ctx
    }

    #[inline]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    // ── program counter ────────────────────────────────────────────

    #[inline]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Index of the instruction being executed.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.pc.saturating_sub(1)
    }

    /// Instruction index within the closure, looking through any signal
    /// vector currently running in this frame.
    pub fn closure_index(&self) -> usize {
        match self.suspended.first() {
            Some((_, pc)) => pc.saturating_sub(1),
            None => self.current_index(),
        }
    }

    #[inline]
    pub fn can_execute(&self) -> bool {
        self.pc < self.code.len()
    }

    /// Returns the next instruction and advances the pc past it.
    #[inline]
    pub fn fetch(&mut self) -> Option<Instruction> {
        let instr = *self.code.get(self.pc)?;
        self.pc += 1;
        Some(instr)
    }

    /// Moves the pc to `addr`. `None` always succeeds and ends the frame's
    /// code window.
    pub fn set_pc(&mut self, addr: impl Into<Option<usize>>) -> VmResult<()> {
        match addr.into() {
            None => self.pc = self.code.len(),
            Some(addr) if addr < self.code.len() => self.pc = addr,
            Some(addr) => return Err(VmError::InvalidInstrAddr(addr as i64)),
        }
        Ok(())
    }

    #[inline]
    pub fn set_pc_unchecked(&mut self, addr: usize) {
        self.pc = addr;
    }

    /// Jumps `offset` instructions forward from the current instruction.
    /// Backward targets are rejected; loops go through absolute jumps.
    pub fn jump_relative(&mut self, offset: i64) -> VmResult<()> {
        let target = (self.current_index() as i64).wrapping_add(offset);
        if offset < 0 {
            return Err(VmError::InvalidInstrAddr(target));
        }
        let addr = usize::try_from(target).map_err(|_| VmError::InvalidInstrAddr(target))?;
        self.set_pc(addr)
    }

    /// Skips the next `n` instructions. Skipping exactly to the end is allowed.
    pub fn skip(&mut self, n: u64) -> VmResult<()> {
        let target = (self.pc as u64).saturating_add(n);
        if target > self.code.len() as u64 {
            return Err(VmError::InvalidInstrAddr(target as i64));
        }
        self.pc = target as usize;
        Ok(())
    }

    // ── signal vectors ─────────────────────────────────────────────

    /// Runs `code` in this frame; the current window resumes when it ends.
    pub fn interrupt(&mut self, code: Arc<[Instruction]>) {
        let saved = std::mem::replace(&mut self.code, code);
        self.suspended.push((saved, self.pc));
        self.pc = 0;
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        !self.suspended.is_empty()
    }

    /// Restores the innermost suspended window. Returns `false` if none.
    pub fn resume(&mut self) -> bool {
        match self.suspended.pop() {
            Some((code, pc)) => {
                self.code = code;
                self.pc = pc;
                true
            }
            None => false,
        }
    }

    // ── evaluation stack ───────────────────────────────────────────

    #[inline]
    pub fn push_eval(&mut self, value: NativeValue) {
        self.eval.push(value);
    }

    pub fn pop_eval(&mut self) -> VmResult<NativeValue> {
        self.eval.pop().ok_or(VmError::EvaluationStackEmpty)
    }

    pub fn top_eval(&mut self) -> VmResult<&mut NativeValue> {
        self.eval.last_mut().ok_or(VmError::EvaluationStackEmpty)
    }

    /// The two topmost values, deeper one first.
    pub fn top_two_eval(&mut self) -> VmResult<(&mut NativeValue, &mut NativeValue)> {
        match self.eval.as_mut_slice() {
            [.., a, b] => Ok((a, b)),
            _ => Err(VmError::EvaluationStackEmpty),
        }
    }

    pub fn swap_eval(&mut self) -> VmResult<()> {
        let len = self.eval.len();
        if len < 2 {
            return Err(VmError::InvalidOperation("swap needs two values"));
        }
        self.eval.swap(len - 1, len - 2);
        Ok(())
    }

    pub fn eval_stack(&self) -> &[NativeValue] {
        &self.eval
    }

    // ── variables ──────────────────────────────────────────────────

    pub fn set_visible(&mut self, key: VarKey, id: ObjectId) {
        self.visible.insert(key, id);
    }

    /// Fails with `NameNotFound("#key")`; callers that know the literal
    /// table substitute the name.
    pub fn get_visible(&self, key: VarKey) -> VmResult<ObjectId> {
        self.get_visible_fast(key).ok_or_else(|| name_not_found(key))
    }

    pub fn get_visible_fast(&self, key: VarKey) -> Option<ObjectId> {
        self.visible.get(&key).copied()
    }

    pub fn pop_visible(&mut self, key: VarKey) -> Option<ObjectId> {
        self.visible.remove(&key)
    }

    pub fn set_invisible(&mut self, key: VarKey, id: ObjectId) {
        self.invisible.insert(key, id);
    }

    pub fn get_invisible(&self, key: VarKey) -> VmResult<ObjectId> {
        self.get_invisible_fast(key).ok_or_else(|| name_not_found(key))
    }

    pub fn get_invisible_fast(&self, key: VarKey) -> Option<ObjectId> {
        self.invisible.get(&key).copied()
    }

    pub fn pop_invisible(&mut self, key: VarKey) -> Option<ObjectId> {
        self.invisible.remove(&key)
    }

    /// Every object bound in either namespace.
    pub fn variables(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.visible.values().chain(self.invisible.values()).copied()
    }

    // ── exception slot ─────────────────────────────────────────────

    pub fn set_exc(&mut self, exc: ObjectId) {
        self.exc = Some(exc);
    }

    pub fn get_exc(&self) -> Option<ObjectId> {
        self.exc
    }

    pub fn clear_exc(&mut self) {
        self.exc = None;
    }
}

fn name_not_found(key: VarKey) -> VmError {
    VmError::NameNotFound(format!("#{key}"))
}

// ── Call stack ─────────────────────────────────────────────────────────

/// Frames in call order, with a depth limit.
///
/// Lexical parents are call-stack indices: a frame is never popped before
/// the frames above it, so an index held by a live frame stays valid.
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, frame: Frame) -> VmResult<()> {
        if self.frames.len() >= self.max_depth {
            return Err(VmError::CallStackOverflow(self.max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn top(&self) -> VmResult<&Frame> {
        self.frames.last().ok_or(VmError::FrameNotFound)
    }

    pub fn top_mut(&mut self) -> VmResult<&mut Frame> {
        self.frames.last_mut().ok_or(VmError::FrameNotFound)
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Frame> + '_ {
        self.frames.iter()
    }

    /// Index of the topmost live frame running closure `parent_id` of the
    /// compartment `compartment_id`.
    pub fn find_parent(&self, compartment_id: usize, parent_id: Option<ClosureId>) -> Option<usize> {
        let want = ClosureCtx::new(compartment_id, parent_id?);
        self.frames.iter().rposition(|f| f.ctx == want)
    }

    /// Index of the `n`-th lexical ancestor of the frame at `index`
    /// (0 is the frame itself).
    pub fn ancestor(&self, index: usize, n: u64) -> VmResult<usize> {
        let mut current = index;
        self.frames.get(current).ok_or(VmError::FrameNotFound)?;
        for _ in 0..n {
            current = self.frames[current].parent.ok_or(VmError::FrameNotFound)?;
        }
        Ok(current)
    }

    /// Looks `key` up in the frame at `index`, then in its lexical parent,
    /// and so on up to the root.
    pub fn get_visible_through_ancestry(&self, index: usize, key: VarKey) -> Option<ObjectId> {
        let mut current = Some(index);
        while let Some(i) = current {
            let frame = self.frames.get(i)?;
            if let Some(id) = frame.get_visible_fast(key) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }

    /// [`get_visible_through_ancestry`](Self::get_visible_through_ancestry)
    /// failing with `NameNotFound`.
    pub fn get_visible(&self, index: usize, key: VarKey) -> VmResult<ObjectId> {
        self.frames.get(index).ok_or(VmError::FrameNotFound)?;
        self.get_visible_through_ancestry(index, key)
            .ok_or_else(|| name_not_found(key))
    }
}

#[cfg(test)]
mod tests {
    use bytecode::Op;

    use super::*;

    fn code(n: usize) -> Arc<[Instruction]> {
        (0..n).map(|_| Instruction::from(Op::New)).collect()
    }

    fn frame(closure_id: ClosureId, parent: Option<usize>) -> Frame {
        Frame::new(ClosureCtx::new(0, closure_id), code(4), 0, None, parent)
    }

    #[test]
    fn set_pc_bounds() {
        let mut f = frame(0, None);
        assert!(f.set_pc(3).is_ok());
        assert!(matches!(f.set_pc(4), Err(VmError::InvalidInstrAddr(4))));
        assert_eq!(f.pc(), 3);
        assert!(f.set_pc(None).is_ok());
        assert!(!f.can_execute());
    }

    #[test]
    fn fetch_advances_and_relative_jumps_only_go_forward() {
        let mut f = frame(0, None);
        f.fetch().unwrap();
        f.fetch().unwrap();
        assert_eq!(f.current_index(), 1);
        f.jump_relative(2).unwrap();
        assert_eq!(f.pc(), 3);
        f.fetch().unwrap();
        assert!(matches!(f.jump_relative(-4), Err(VmError::InvalidInstrAddr(-1))));
        assert!(matches!(f.jump_relative(-1), Err(VmError::InvalidInstrAddr(2))));
        assert_eq!(f.pc(), 4);
        assert!(f.skip(0).is_ok());
        assert!(f.skip(1).is_err());
    }

    #[test]
    fn eval_stack_discipline() {
        let mut f = frame(0, None);
        assert!(matches!(f.pop_eval(), Err(VmError::EvaluationStackEmpty)));
        f.push_eval(NativeValue::Int8(1));
        assert!(matches!(f.swap_eval(), Err(VmError::InvalidOperation(_))));
        f.push_eval(NativeValue::Int8(2));
        f.swap_eval().unwrap();
        assert_eq!(f.pop_eval().unwrap(), NativeValue::Int8(1));
        *f.top_eval().unwrap() = NativeValue::Bool(true);
        assert_eq!(f.eval_stack(), &[NativeValue::Bool(true)]);
    }

    #[test]
    fn interrupt_and_resume() {
        let mut f = frame(0, None);
        f.fetch().unwrap();
        f.interrupt(code(1));
        assert!(f.is_interrupted());
        assert_eq!(f.closure_index(), 0);
        f.fetch().unwrap();
        assert!(!f.can_execute());
        assert!(f.resume());
        assert_eq!(f.pc(), 1);
        assert!(!f.resume());
    }

    #[test]
    fn visible_lookup_follows_lexical_parents() {
        let mut stack = CallStack::new(8);
        let mut a = frame(0, None);
        a.set_visible(7, ObjectId::new(1, 0));
        stack.push(a).unwrap();
        stack.push(frame(5, None)).unwrap();
        let parent = stack.find_parent(0, Some(0));
        assert_eq!(parent, Some(0));
        stack.push(frame(1, parent)).unwrap();

        assert_eq!(stack.get_visible_through_ancestry(2, 7), Some(ObjectId::new(1, 0)));
        assert_eq!(stack.get_visible_through_ancestry(1, 7), None);
        assert_eq!(stack.get_visible(2, 7).unwrap(), ObjectId::new(1, 0));
        assert!(matches!(stack.get_visible(1, 7), Err(VmError::NameNotFound(n)) if n == "#7"));
        assert!(matches!(stack.get_visible(3, 7), Err(VmError::FrameNotFound)));
        assert_eq!(stack.ancestor(2, 1).unwrap(), 0);
        assert!(matches!(stack.ancestor(2, 2), Err(VmError::FrameNotFound)));
    }

    #[test]
    fn variable_namespaces_are_separate() {
        let mut f = frame(0, None);
        f.set_invisible(3, ObjectId::new(2, 0));
        assert_eq!(f.get_invisible(3).unwrap(), ObjectId::new(2, 0));
        assert!(matches!(f.get_visible(3), Err(VmError::NameNotFound(n)) if n == "#3"));
        assert_eq!(f.pop_invisible(3), Some(ObjectId::new(2, 0)));
        assert!(f.get_invisible(3).is_err());
    }

    #[test]
    fn depth_limit() {
        let mut stack = CallStack::new(1);
        stack.push(frame(0, None)).unwrap();
        assert!(matches!(
            stack.push(frame(0, None)),
            Err(VmError::CallStackOverflow(1))
        ));
    }
}
