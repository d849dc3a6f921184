use bytecode::Instruction;
use object::ObjectFlags;

use super::operand_addr;
use crate::{InvocationCtx, Process, RunOutcome, VmError, VmResult};

/// Stages an invocation of the top object. The object stays on the stack.
pub(super) fn pinvk(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.top_object()?;
    let obj = p.object(id)?;
    if obj.get_flag(ObjectFlags::NON_CALLABLE) {
        return Err(VmError::InvocationError(id));
    }
    let ctx = obj.closure_ctx().ok_or(VmError::InvocationError(id))?;
    p.resolve(ctx)?;
    p.invk_ctxs.push(InvocationCtx::new(ctx));
    Ok(())
}

pub(super) fn invk(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let index = p.staged_invk_index()?;
    let ctx = p.invk_ctxs[index].closure_ctx();
    let return_addr = p.frame()?.current_index();
    p.push_frame(ctx, index, Some(return_addr))
}

pub(super) fn rtrn(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.return_from_frame()
}

pub(super) fn jmp(p: &mut Process, i: &Instruction) -> VmResult<()> {
    p.frame_mut()?.jump_relative(i.offset())
}

/// Peeks the condition; the value stays on the evaluation stack.
pub(super) fn jmpif(p: &mut Process, i: &Instruction) -> VmResult<()> {
    if p.top_eval()?.is_truthy() {
        p.frame_mut()?.jump_relative(i.offset())?;
    }
    Ok(())
}

pub(super) fn jmpr(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let addr = operand_addr(i.oprd1)?;
    p.frame_mut()?.set_pc(addr)
}

pub(super) fn exc(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let exc = p.pop_object()?;
    p.raise(exc, i.oprd1 != 0)
}

pub(super) fn excobj(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let exc = p
        .frame()?
        .get_exc()
        .ok_or(VmError::InvalidOperation("no active exception"))?;
    p.push_object(exc);
    Ok(())
}

pub(super) fn clrexc(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.frame_mut()?.clear_exc();
    Ok(())
}

/// `oprd2 != 0` jumps when an exception is stored, `0` when none is.
pub(super) fn jmpexc(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let frame = p.frame_mut()?;
    if frame.get_exc().is_some() == (i.oprd2 != 0) {
        frame.jump_relative(i.offset())?;
    }
    Ok(())
}

pub(super) fn exit(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let status = i.oprd1 as i32;
    log::debug!("exit with status {status}");
    p.halt = Some(RunOutcome::Exited(status));
    Ok(())
}
