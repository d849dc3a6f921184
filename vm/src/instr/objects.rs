use bytecode::Instruction;
use object::{ClosureCtx, NativeValue, ObjectFlags, ObjectId, attr_key};

use super::mutable_object;
use crate::{Process, VmError, VmResult};

pub(super) fn new(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.new_object()?;
    p.push_object(id);
    Ok(())
}

pub(super) fn pop(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.pop_object().map(drop)
}

pub(super) fn swap(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let len = p.object_stack.len();
    if len < 2 {
        return Err(VmError::InvalidOperation("swap needs two objects"));
    }
    p.object_stack.swap(len - 1, len - 2);
    Ok(())
}

// ── variables ──────────────────────────────────────────────────────────

/// Puts the literal name of `key` into a `NameNotFound`.
fn named<T>(p: &Process, key: u64, result: VmResult<T>) -> VmResult<T> {
    result.map_err(|e| match e {
        VmError::NameNotFound(_) => VmError::NameNotFound(p.name_of(key)),
        e => e,
    })
}

fn load_visible(p: &mut Process, key: u64) -> VmResult<()> {
    let id = visible(p, key)?;
    p.push_object(id);
    Ok(())
}

/// Resolves visible variable `key` without touching the object stack.
fn visible(p: &Process, key: u64) -> VmResult<ObjectId> {
    let index = p.frame_index()?;
    named(p, key, p.call_stack.get_visible(index, key))
}

pub(super) fn ldobj(p: &mut Process, i: &Instruction) -> VmResult<()> {
    load_visible(p, i.oprd1)
}

pub(super) fn stobj(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    p.frame_mut()?.set_visible(i.oprd1, id);
    Ok(())
}

pub(super) fn stobjn(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    let index = p.call_stack.ancestor(p.frame_index()?, i.oprd2)?;
    p.call_stack
        .get_mut(index)
        .ok_or(VmError::FrameNotFound)?
        .set_visible(i.oprd1, id);
    Ok(())
}

pub(super) fn ldobj2(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let id = named(p, i.oprd1, p.frame()?.get_invisible(i.oprd1))?;
    p.push_object(id);
    Ok(())
}

pub(super) fn stobj2(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    p.frame_mut()?.set_invisible(i.oprd1, id);
    Ok(())
}

fn check_deletable(p: &Process, id: ObjectId) -> VmResult<()> {
    if p.object(id)?.get_flag(ObjectFlags::INDELIBLE) {
        return Err(VmError::ObjectDeletionError(id));
    }
    Ok(())
}

pub(super) fn delobj(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let key = i.oprd1;
    let id = named(p, key, p.frame()?.get_visible(key))?;
    check_deletable(p, id)?;
    p.frame_mut()?.pop_visible(key);
    Ok(())
}

pub(super) fn delobj2(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let key = i.oprd1;
    let id = named(p, key, p.frame()?.get_invisible(key))?;
    check_deletable(p, id)?;
    p.frame_mut()?.pop_invisible(key);
    Ok(())
}

pub(super) fn cldobj(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let cond = p.pop_eval()?;
    load_visible(p, if cond.is_truthy() { i.oprd1 } else { i.oprd2 })
}

// ── attributes ─────────────────────────────────────────────────────────

fn literal_name(p: &Process, i: &Instruction) -> VmResult<String> {
    Ok(p.string_literal(i.oprd1)?.to_owned())
}

fn eval_name(p: &mut Process) -> VmResult<String> {
    match p.pop_eval()? {
        NativeValue::Str(name) => Ok(name),
        other => Err(object::NativeTypeError::InvalidOperand {
            op: "attribute name",
            kind: other.kind(),
        }
        .into()),
    }
}

fn get_attr(p: &mut Process, name: String) -> VmResult<()> {
    let id = p.pop_object()?;
    let attr = p
        .object(id)?
        .getattr(attr_key(&name))
        .ok_or(VmError::AttributeNotFound(name))?;
    p.push_object(attr);
    Ok(())
}

fn set_attr(p: &mut Process, name: &str) -> VmResult<()> {
    let attr = p.pop_object()?;
    let id = p.top_object()?;
    mutable_object(p, id)?.putattr(attr_key(name), attr);
    Ok(())
}

fn del_attr(p: &mut Process, name: String) -> VmResult<()> {
    let id = p.top_object()?;
    let key = attr_key(&name);
    let attr = mutable_object(p, id)?
        .getattr(key)
        .ok_or(VmError::AttributeNotFound(name))?;
    check_deletable(p, attr)?;
    p.object_mut(id)?.delattr(key);
    Ok(())
}

fn has_attr(p: &mut Process, name: &str) -> VmResult<()> {
    let id = p.top_object()?;
    let found = p.object(id)?.hasattr(attr_key(name));
    p.push_eval(NativeValue::Bool(found))
}

pub(super) fn getattr(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let name = literal_name(p, i)?;
    get_attr(p, name)
}

pub(super) fn setattr(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let name = literal_name(p, i)?;
    set_attr(p, &name)
}

pub(super) fn delattr(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let name = literal_name(p, i)?;
    del_attr(p, name)
}

pub(super) fn hasattr(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let name = literal_name(p, i)?;
    has_attr(p, &name)
}

pub(super) fn getattr2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let name = eval_name(p)?;
    get_attr(p, name)
}

pub(super) fn setattr2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let name = eval_name(p)?;
    set_attr(p, &name)
}

pub(super) fn delattr2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let name = eval_name(p)?;
    del_attr(p, name)
}

pub(super) fn hasattr2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let name = eval_name(p)?;
    has_attr(p, &name)
}

/// Every `(key, id)` entry of the map on top of the evaluation stack becomes
/// an attribute of the top object. Map keys are string literal keys, named
/// the way `SETATTR k` names its attribute.
pub(super) fn setattrs(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let pairs: Vec<(u64, ObjectId)> = p
        .top_eval()?
        .as_map("setattrs")?
        .iter()
        .map(|(k, v)| (*k, *v))
        .collect();
    let entries = pairs
        .into_iter()
        .map(|(k, attr)| Ok((attr_key(p.string_literal(k)?), attr)))
        .collect::<VmResult<Vec<_>>>()?;
    let id = p.top_object()?;
    let obj = mutable_object(p, id)?;
    for (key, attr) in entries {
        obj.putattr(key, attr);
    }
    Ok(())
}

// ── native handles ─────────────────────────────────────────────────────

pub(super) fn gethndl(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.top_object()?;
    let value = p.handle(id)?.clone();
    p.push_eval(value)
}

pub(super) fn sethndl(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let value = p.pop_eval()?;
    let id = p.top_object()?;
    mutable_object(p, id)?;
    p.set_handle(id, value)
}

pub(super) fn gethndl2(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let id = visible(p, i.oprd1)?;
    let value = p.handle(id)?.clone();
    p.push_eval(value)
}

pub(super) fn sethndl2(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let value = p.pop_eval()?;
    let id = visible(p, i.oprd1)?;
    mutable_object(p, id)?;
    p.set_handle(id, value)
}

pub(super) fn clrhndl(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.top_object()?;
    if let Some(key) = mutable_object(p, id)?.clear_ntvhndl_key() {
        p.pool.erase(key)?;
    }
    Ok(())
}

pub(super) fn cpyhndl(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let src = p.pop_object()?;
    let dst = p.top_object()?;
    let value = p.handle(src)?.clone();
    mutable_object(p, dst)?;
    p.set_handle(dst, value)
}

pub(super) fn cpyrepr(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let src = p.pop_object()?;
    let dst = p.top_object()?;
    let repr = p.handle(src)?.repr();
    mutable_object(p, dst)?;
    p.set_handle(dst, NativeValue::Str(repr))
}

/// Objects without a handle are truthy.
pub(super) fn istruthy(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.top_object()?;
    let truthy = match p.object(id)?.ntvhndl_key() {
        Some(key) => p.pool.at(key)?.is_truthy(),
        None => true,
    };
    p.push_eval(NativeValue::Bool(truthy))
}

fn identity(p: &mut Process, equal: bool) -> VmResult<()> {
    let b = p.pop_object()?;
    let a = p.pop_object()?;
    p.push_eval(NativeValue::Bool((a == b) == equal))
}

pub(super) fn objeq(p: &mut Process, _: &Instruction) -> VmResult<()> {
    identity(p, true)
}

pub(super) fn objneq(p: &mut Process, _: &Instruction) -> VmResult<()> {
    identity(p, false)
}

pub(super) fn setctx(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let compartment_id = p.frame()?.closure_ctx().compartment_id;
    let id = p.top_object()?;
    mutable_object(p, id)?.set_closure_ctx(ClosureCtx::new(compartment_id, i.oprd1));
    Ok(())
}

// ── flags ──────────────────────────────────────────────────────────────

fn set_flag(p: &mut Process, flag: ObjectFlags, on: bool) -> VmResult<()> {
    let id = p.top_object()?;
    let obj = p.object_mut(id)?;
    if on {
        obj.set_flag(flag);
    } else {
        obj.clear_flag(flag);
    }
    Ok(())
}

pub(super) fn setflgc(p: &mut Process, i: &Instruction) -> VmResult<()> {
    set_flag(p, ObjectFlags::NON_GC, i.oprd1 != 0)
}

pub(super) fn setfldel(p: &mut Process, i: &Instruction) -> VmResult<()> {
    set_flag(p, ObjectFlags::INDELIBLE, i.oprd1 != 0)
}

pub(super) fn setflcall(p: &mut Process, i: &Instruction) -> VmResult<()> {
    set_flag(p, ObjectFlags::NON_CALLABLE, i.oprd1 != 0)
}

pub(super) fn setflmute(p: &mut Process, i: &Instruction) -> VmResult<()> {
    set_flag(p, ObjectFlags::IMMUTABLE, i.oprd1 != 0)
}
