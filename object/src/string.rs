//! String operations. Positions and lengths count `char`s.

use crate::{NativeResult, NativeTypeError, NativeValue};

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `pos`-th char; `pos == len` maps to the end.
fn byte_offset(s: &str, pos: usize) -> Option<usize> {
    if pos == 0 {
        return Some(0);
    }
    s.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(s.len()))
        .nth(pos)
}

fn position(s: &str, pos: &NativeValue, op: &'static str) -> NativeResult<usize> {
    let index = pos.as_index(op)?;
    let len = char_len(s);
    if index < 0 || index > len as i128 {
        return Err(NativeTypeError::IndexOutOfRange { index, len });
    }
    Ok(index as usize)
}

fn length(len: &NativeValue, op: &'static str) -> NativeResult<usize> {
    let n = len.as_index(op)?;
    usize::try_from(n).map_err(|_| NativeTypeError::InvalidArgument {
        op,
        reason: "length must be non-negative",
    })
}

/// Byte range of `len` chars starting at char `pos`, clamped to the end.
fn byte_range(s: &str, pos: usize, len: usize) -> (usize, usize) {
    let start = byte_offset(s, pos).unwrap_or(s.len());
    let end = byte_offset(s, pos.saturating_add(len)).unwrap_or(s.len());
    (start, end)
}

fn to_char(c: &NativeValue, op: &'static str) -> NativeResult<char> {
    let code = c.as_index(op)?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or(NativeTypeError::InvalidArgument {
            op,
            reason: "not a unicode scalar value",
        })
}

fn char_index(s: &str, byte: usize) -> i64 {
    s[..byte].chars().count() as i64
}

// ── out-of-place ───────────────────────────────────────────────────

pub fn len(s: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::UInt64(char_len(s.as_str("strlen")?) as u64))
}

pub fn substr(s: &NativeValue, pos: &NativeValue) -> NativeResult<NativeValue> {
    let s = s.as_str("strsub")?;
    let pos = position(s, pos, "strsub")?;
    let (start, _) = byte_range(s, pos, 0);
    Ok(NativeValue::Str(s[start..].to_owned()))
}

pub fn substr_range(
    s: &NativeValue,
    pos: &NativeValue,
    len: &NativeValue,
) -> NativeResult<NativeValue> {
    let s = s.as_str("strsub2")?;
    let pos = position(s, pos, "strsub2")?;
    let (start, end) = byte_range(s, pos, length(len, "strsub2")?);
    Ok(NativeValue::Str(s[start..end].to_owned()))
}

pub fn find(s: &NativeValue, t: &NativeValue) -> NativeResult<NativeValue> {
    let (s, t) = (s.as_str("strfnd")?, t.as_str("strfnd")?);
    Ok(NativeValue::Int64(s.find(t).map_or(-1, |b| char_index(s, b))))
}

/// Searches for `t` starting at char `pos`.
pub fn find_from(
    s: &NativeValue,
    t: &NativeValue,
    pos: &NativeValue,
) -> NativeResult<NativeValue> {
    let (s, t) = (s.as_str("strfnd2")?, t.as_str("strfnd2")?);
    let pos = position(s, pos, "strfnd2")?;
    let (start, _) = byte_range(s, pos, 0);
    let found = s[start..].find(t).map(|b| char_index(s, start + b));
    Ok(NativeValue::Int64(found.unwrap_or(-1)))
}

pub fn rfind(s: &NativeValue, t: &NativeValue) -> NativeResult<NativeValue> {
    let (s, t) = (s.as_str("strrfnd")?, t.as_str("strrfnd")?);
    Ok(NativeValue::Int64(s.rfind(t).map_or(-1, |b| char_index(s, b))))
}

/// Last occurrence of `t` that starts at or before char `pos`.
pub fn rfind_before(
    s: &NativeValue,
    t: &NativeValue,
    pos: &NativeValue,
) -> NativeResult<NativeValue> {
    let (s, t) = (s.as_str("strrfnd2")?, t.as_str("strrfnd2")?);
    let pos = position(s, pos, "strrfnd2")?;
    let (_, end) = byte_range(s, pos, char_len(t));
    let found = s[..end].rfind(t);
    Ok(NativeValue::Int64(found.map_or(-1, |b| char_index(s, b))))
}

pub fn compare(s: &NativeValue, t: &NativeValue) -> NativeResult<NativeValue> {
    let (s, t) = (s.as_str("strcmp")?, t.as_str("strcmp")?);
    Ok(NativeValue::Int32(s.cmp(t) as i32))
}

/// Compares `len` chars of `s` starting at `pos` with `t`.
pub fn compare_range(
    s: &NativeValue,
    pos: &NativeValue,
    len: &NativeValue,
    t: &NativeValue,
) -> NativeResult<NativeValue> {
    let sub = substr_range(s, pos, len)?;
    compare(&sub, t)
}

pub fn starts_with(s: &NativeValue, t: &NativeValue) -> NativeResult<NativeValue> {
    let (s, t) = (s.as_str("strstarts")?, t.as_str("strstarts")?);
    Ok(NativeValue::Bool(s.starts_with(t)))
}

pub fn ends_with(s: &NativeValue, t: &NativeValue) -> NativeResult<NativeValue> {
    let (s, t) = (s.as_str("strends")?, t.as_str("strends")?);
    Ok(NativeValue::Bool(s.ends_with(t)))
}

// ── in place ───────────────────────────────────────────────────────

pub fn clear(s: &mut NativeValue) -> NativeResult<()> {
    s.as_string_mut("strclr")?.clear();
    Ok(())
}

pub fn append(s: &mut NativeValue, t: &NativeValue) -> NativeResult<()> {
    let t = t.as_str("strapd")?;
    s.as_string_mut("strapd")?.push_str(t);
    Ok(())
}

pub fn push_char(s: &mut NativeValue, c: &NativeValue) -> NativeResult<()> {
    let c = to_char(c, "strpsh")?;
    s.as_string_mut("strpsh")?.push(c);
    Ok(())
}

pub fn insert(s: &mut NativeValue, pos: &NativeValue, t: &NativeValue) -> NativeResult<()> {
    let t = t.as_str("strist")?;
    let s = s.as_string_mut("strist")?;
    let (at, _) = byte_range(s, position(s, pos, "strist")?, 0);
    s.insert_str(at, t);
    Ok(())
}

pub fn insert_char(s: &mut NativeValue, pos: &NativeValue, c: &NativeValue) -> NativeResult<()> {
    let c = to_char(c, "strist2")?;
    let s = s.as_string_mut("strist2")?;
    let (at, _) = byte_range(s, position(s, pos, "strist2")?, 0);
    s.insert(at, c);
    Ok(())
}

/// Drops everything from char `pos` on.
pub fn erase(s: &mut NativeValue, pos: &NativeValue) -> NativeResult<()> {
    let s = s.as_string_mut("strers")?;
    let (at, _) = byte_range(s, position(s, pos, "strers")?, 0);
    s.truncate(at);
    Ok(())
}

pub fn erase_range(s: &mut NativeValue, pos: &NativeValue, len: &NativeValue) -> NativeResult<()> {
    let len = length(len, "strers2")?;
    let s = s.as_string_mut("strers2")?;
    let (start, end) = byte_range(s, position(s, pos, "strers2")?, len);
    s.replace_range(start..end, "");
    Ok(())
}

pub fn replace(
    s: &mut NativeValue,
    pos: &NativeValue,
    len: &NativeValue,
    t: &NativeValue,
) -> NativeResult<()> {
    let t = t.as_str("strrplc")?;
    let len = length(len, "strrplc")?;
    let s = s.as_string_mut("strrplc")?;
    let (start, end) = byte_range(s, position(s, pos, "strrplc")?, len);
    s.replace_range(start..end, t);
    Ok(())
}

/// Exchanges the contents of two strings.
pub fn swap(s: &mut NativeValue, t: &mut NativeValue) -> NativeResult<()> {
    let t = t.as_string_mut("strswp")?;
    std::mem::swap(s.as_string_mut("strswp")?, t);
    Ok(())
}

fn map_str(s: &mut NativeValue, op: &'static str, f: impl FnOnce(&str) -> String) -> NativeResult<()> {
    let s = s.as_string_mut(op)?;
    let next = f(s);
    *s = next;
    Ok(())
}

pub fn reverse(s: &mut NativeValue) -> NativeResult<()> {
    map_str(s, "strrev", |s| s.chars().rev().collect())
}

pub fn to_upper(s: &mut NativeValue) -> NativeResult<()> {
    map_str(s, "strupper", str::to_uppercase)
}

pub fn to_lower(s: &mut NativeValue) -> NativeResult<()> {
    map_str(s, "strlower", str::to_lowercase)
}

pub fn trim(s: &mut NativeValue) -> NativeResult<()> {
    map_str(s, "strtrm", |s| s.trim().to_owned())
}

pub fn trim_start(s: &mut NativeValue) -> NativeResult<()> {
    map_str(s, "strtrml", |s| s.trim_start().to_owned())
}

pub fn trim_end(s: &mut NativeValue) -> NativeResult<()> {
    map_str(s, "strtrmr", |s| s.trim_end().to_owned())
}
