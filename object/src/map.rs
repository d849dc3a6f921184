//! Map operations. Maps bind `u64` keys to object ids.

use crate::{NativeResult, NativeTypeError, NativeValue, ObjectId};

pub fn len(m: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::UInt64(m.as_map("maplen")?.len() as u64))
}

pub fn is_empty(m: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::Bool(m.as_map("mapemp")?.is_empty()))
}

pub fn find(m: &NativeValue, key: &NativeValue) -> NativeResult<NativeValue> {
    let key = key.as_key("mapfind")?;
    Ok(NativeValue::Bool(m.as_map("mapfind")?.contains_key(&key)))
}

pub fn at(m: &NativeValue, key: &NativeValue) -> NativeResult<ObjectId> {
    let key = key.as_key("mapat")?;
    m.as_map("mapat")?
        .get(&key)
        .copied()
        .ok_or(NativeTypeError::KeyNotFound(key))
}

/// Values in ascending key order.
pub fn values(m: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::Array(m.as_map("mapvals")?.values().copied().collect()))
}

pub fn put(m: &mut NativeValue, key: &NativeValue, id: ObjectId) -> NativeResult<()> {
    let key = key.as_key("mapput")?;
    m.as_map_mut("mapput")?.insert(key, id);
    Ok(())
}

pub fn erase(m: &mut NativeValue, key: &NativeValue) -> NativeResult<()> {
    let key = key.as_key("mapers")?;
    m.as_map_mut("mapers")?
        .remove(&key)
        .map(|_| ())
        .ok_or(NativeTypeError::KeyNotFound(key))
}

pub fn clear(m: &mut NativeValue) -> NativeResult<()> {
    m.as_map_mut("mapclr")?.clear();
    Ok(())
}

pub fn swap(m: &mut NativeValue, n: &mut NativeValue) -> NativeResult<()> {
    let n = n.as_map_mut("mapswp")?;
    std::mem::swap(m.as_map_mut("mapswp")?, n);
    Ok(())
}

/// Entries of `n` overwrite entries of `m` with the same key.
pub fn merge(m: &mut NativeValue, n: &NativeValue) -> NativeResult<()> {
    let n = n.as_map("mapmrg")?;
    let m = m.as_map_mut("mapmrg")?;
    m.extend(n.iter().map(|(k, v)| (*k, *v)));
    Ok(())
}
