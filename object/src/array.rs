//! Array operations. Arrays hold object ids; element reads hand back ids
//! for the caller to push onto its object stack.

use crate::{NativeResult, NativeTypeError, NativeValue, ObjectId};

fn slot(len: usize, index: &NativeValue, op: &'static str) -> NativeResult<usize> {
    let index = index.as_index(op)?;
    if index < 0 || index >= len as i128 {
        return Err(NativeTypeError::IndexOutOfRange { index, len });
    }
    Ok(index as usize)
}

fn bound(len: usize, index: &NativeValue, op: &'static str) -> NativeResult<usize> {
    let index = index.as_index(op)?;
    if index < 0 || index > len as i128 {
        return Err(NativeTypeError::IndexOutOfRange { index, len });
    }
    Ok(index as usize)
}

fn empty(op: &'static str) -> NativeTypeError {
    NativeTypeError::InvalidArgument {
        op,
        reason: "array is empty",
    }
}

// ── queries ────────────────────────────────────────────────────────

pub fn len(a: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::UInt64(a.as_array("arylen")?.len() as u64))
}

pub fn is_empty(a: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::Bool(a.as_array("aryemp")?.is_empty()))
}

pub fn at(a: &NativeValue, index: &NativeValue) -> NativeResult<ObjectId> {
    let items = a.as_array("aryat")?;
    Ok(items[slot(items.len(), index, "aryat")?])
}

pub fn front(a: &NativeValue) -> NativeResult<ObjectId> {
    a.as_array("aryfrt")?.first().copied().ok_or(empty("aryfrt"))
}

pub fn back(a: &NativeValue) -> NativeResult<ObjectId> {
    a.as_array("arybak")?.last().copied().ok_or(empty("arybak"))
}

pub fn slice(a: &NativeValue, start: &NativeValue, stop: &NativeValue) -> NativeResult<NativeValue> {
    let items = a.as_array("aryslice")?;
    let start = bound(items.len(), start, "aryslice")?;
    let stop = bound(items.len(), stop, "aryslice")?;
    if start > stop {
        return Err(NativeTypeError::InvalidArgument {
            op: "aryslice",
            reason: "start is past stop",
        });
    }
    Ok(NativeValue::Array(items[start..stop].to_vec()))
}

pub fn stride(a: &NativeValue, step: &NativeValue) -> NativeResult<NativeValue> {
    let items = a.as_array("arystrd")?;
    let step = step.as_index("arystrd")?;
    if step <= 0 {
        return Err(NativeTypeError::InvalidArgument {
            op: "arystrd",
            reason: "stride must be positive",
        });
    }
    let step = usize::try_from(step).unwrap_or(usize::MAX);
    Ok(NativeValue::Array(items.iter().step_by(step).copied().collect()))
}

// ── in place ───────────────────────────────────────────────────────

pub fn put(a: &mut NativeValue, index: &NativeValue, id: ObjectId) -> NativeResult<()> {
    let items = a.as_array_mut("aryput")?;
    let i = slot(items.len(), index, "aryput")?;
    items[i] = id;
    Ok(())
}

pub fn append(a: &mut NativeValue, id: ObjectId) -> NativeResult<()> {
    a.as_array_mut("aryapnd")?.push(id);
    Ok(())
}

pub fn erase(a: &mut NativeValue, index: &NativeValue) -> NativeResult<()> {
    let items = a.as_array_mut("aryers")?;
    let i = slot(items.len(), index, "aryers")?;
    items.remove(i);
    Ok(())
}

pub fn pop(a: &mut NativeValue) -> NativeResult<ObjectId> {
    a.as_array_mut("arypop")?.pop().ok_or(empty("arypop"))
}

pub fn swap(a: &mut NativeValue, b: &mut NativeValue) -> NativeResult<()> {
    let b = b.as_array_mut("aryswp")?;
    std::mem::swap(a.as_array_mut("aryswp")?, b);
    Ok(())
}

pub fn clear(a: &mut NativeValue) -> NativeResult<()> {
    a.as_array_mut("aryclr")?.clear();
    Ok(())
}

pub fn merge(a: &mut NativeValue, b: &NativeValue) -> NativeResult<()> {
    let b = b.as_array("arymrg")?;
    a.as_array_mut("arymrg")?.extend_from_slice(b);
    Ok(())
}

pub fn reverse(a: &mut NativeValue) -> NativeResult<()> {
    a.as_array_mut("aryrev")?.reverse();
    Ok(())
}
