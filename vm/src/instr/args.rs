//! Argument passing through invocation contexts.
//!
//! `PUT*` instructions fill the context staged by `PINVK`; `GET*`
//! instructions read the context of the running frame.

use bytecode::Instruction;
use object::NativeValue;

use crate::{Process, VmResult};

pub(super) fn putarg(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let arg = p.pop_object()?;
    p.staged_invk_ctx()?.put_param(arg);
    Ok(())
}

pub(super) fn putkwarg(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let arg = p.pop_object()?;
    p.staged_invk_ctx()?.put_param_value_pair(i.oprd1, arg);
    Ok(())
}

pub(super) fn putargs(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    let args = p.handle(id)?.as_array("putargs")?.clone();
    let ctx = p.staged_invk_ctx()?;
    for arg in args {
        ctx.put_param(arg);
    }
    Ok(())
}

pub(super) fn putkwargs(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    let kwargs = p.handle(id)?.as_map("putkwargs")?.clone();
    let ctx = p.staged_invk_ctx()?;
    for (key, arg) in kwargs {
        ctx.put_param_value_pair(key, arg);
    }
    Ok(())
}

pub(super) fn getarg(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let arg = p.current_invk_ctx()?.pop_param()?;
    p.push_object(arg);
    Ok(())
}

/// Pushes keyword `oprd1` and skips the `oprd2` instructions computing its
/// default. Without the keyword, execution falls through to the default.
pub(super) fn getkwarg(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let ctx = p.current_invk_ctx()?;
    if !ctx.has_param_value_pair_with_key(i.oprd1) {
        return Ok(());
    }
    let arg = ctx.pop_param_value_pair(i.oprd1)?;
    p.push_object(arg);
    p.frame_mut()?.skip(i.oprd2)
}

pub(super) fn getargs(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let rest = p.current_invk_ctx()?.take_params();
    let id = p.new_object_with(NativeValue::Array(rest))?;
    p.push_object(id);
    Ok(())
}

pub(super) fn getkwargs(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let rest = p.current_invk_ctx()?.take_param_value_pairs();
    let id = p.new_object_with(NativeValue::Map(rest))?;
    p.push_object(id);
    Ok(())
}

pub(super) fn hasargs(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let remaining = p.current_invk_ctx()?.has_params();
    p.push_eval(NativeValue::Bool(remaining))
}
