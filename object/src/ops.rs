//! Arithmetic, bitwise, comparison and logical operators.
//!
//! Binary operators take `lhs` (pushed first) and `rhs` (pushed last) and
//! return a fresh value. Unary operators mutate their operand in place.

use core::cmp::Ordering;

use crate::native::Num;
use crate::{Kind, NativeResult, NativeTypeError, NativeValue};

/// Kind produced by a binary arithmetic operation over `lhs` and `rhs`.
pub fn result_kind(lhs: Kind, rhs: Kind) -> Kind {
    match lhs.max(rhs) {
        Kind::Bool => Kind::Int8,
        kind => kind,
    }
}

fn invalid_pair(op: &'static str, lhs: &NativeValue, rhs: &NativeValue) -> NativeTypeError {
    NativeTypeError::InvalidOperands {
        op,
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    }
}

fn numeric_pair(
    op: &'static str,
    lhs: &NativeValue,
    rhs: &NativeValue,
) -> NativeResult<(Kind, Num, Num)> {
    if !lhs.kind().is_numeric() || !rhs.kind().is_numeric() {
        return Err(invalid_pair(op, lhs, rhs));
    }
    Ok((result_kind(lhs.kind(), rhs.kind()), lhs.num(op)?, rhs.num(op)?))
}

fn arith(
    op: &'static str,
    lhs: &NativeValue,
    rhs: &NativeValue,
    int_op: fn(i128, i128) -> NativeResult<i128>,
    float_op: fn(f64, f64) -> f64,
) -> NativeResult<NativeValue> {
    let (kind, l, r) = numeric_pair(op, lhs, rhs)?;
    let n = if kind.is_decimal() {
        Num::Float(float_op(l.to_f64(), r.to_f64()))
    } else {
        Num::Int(int_op(l.to_i128(), r.to_i128())?)
    };
    NativeValue::from_num(kind, n)
}

fn bitwise(
    op: &'static str,
    lhs: &NativeValue,
    rhs: &NativeValue,
    int_op: fn(i128, i128) -> i128,
) -> NativeResult<NativeValue> {
    if !lhs.kind().is_integral() || !rhs.kind().is_integral() {
        return Err(invalid_pair(op, lhs, rhs));
    }
    let kind = result_kind(lhs.kind(), rhs.kind());
    let n = int_op(lhs.num(op)?.to_i128(), rhs.num(op)?.to_i128());
    NativeValue::from_num(kind, Num::Int(n))
}

// ── arithmetic ─────────────────────────────────────────────────────

pub fn add(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    match (lhs, rhs) {
        (NativeValue::Str(l), NativeValue::Str(r)) => Ok(NativeValue::Str(format!("{l}{r}"))),
        (NativeValue::Array(l), NativeValue::Array(r)) => {
            Ok(NativeValue::Array(l.iter().chain(r).copied().collect()))
        }
        _ => arith("add", lhs, rhs, |l, r| Ok(l.wrapping_add(r)), |l, r| l + r),
    }
}

pub fn sub(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    arith("sub", lhs, rhs, |l, r| Ok(l.wrapping_sub(r)), |l, r| l - r)
}

pub fn mul(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    arith("mul", lhs, rhs, |l, r| Ok(l.wrapping_mul(r)), |l, r| l * r)
}

pub fn div(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    arith(
        "div",
        lhs,
        rhs,
        |l, r| l.checked_div(r).ok_or(NativeTypeError::DivisionByZero),
        |l, r| l / r,
    )
}

pub fn rem(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    arith(
        "mod",
        lhs,
        rhs,
        |l, r| l.checked_rem(r).ok_or(NativeTypeError::DivisionByZero),
        |l, r| l % r,
    )
}

pub fn pow(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    arith(
        "pow",
        lhs,
        rhs,
        |base, exp| {
            if exp < 0 {
                Ok((base as f64).powf(exp as f64) as i128)
            } else {
                Ok(base.wrapping_pow(exp.min(u32::MAX as i128) as u32))
            }
        },
        f64::powf,
    )
}

// ── bitwise ────────────────────────────────────────────────────────

pub fn bit_and(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    bitwise("band", lhs, rhs, |l, r| l & r)
}

pub fn bit_or(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    bitwise("bor", lhs, rhs, |l, r| l | r)
}

pub fn bit_xor(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    bitwise("bxor", lhs, rhs, |l, r| l ^ r)
}

pub fn shl(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    bitwise("bls", lhs, rhs, |l, r| l.wrapping_shl(r as u32))
}

pub fn shr(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    bitwise("brs", lhs, rhs, |l, r| l.wrapping_shr(r as u32))
}

// ── comparison ─────────────────────────────────────────────────────

fn ordering(
    op: &'static str,
    lhs: &NativeValue,
    rhs: &NativeValue,
) -> NativeResult<Option<Ordering>> {
    match (lhs, rhs) {
        (NativeValue::Str(l), NativeValue::Str(r)) => Ok(Some(l.cmp(r))),
        _ => {
            let (kind, l, r) = numeric_pair(op, lhs, rhs)?;
            if kind.is_decimal() {
                Ok(l.to_f64().partial_cmp(&r.to_f64()))
            } else {
                Ok(Some(l.to_i128().cmp(&r.to_i128())))
            }
        }
    }
}

fn equals(lhs: &NativeValue, rhs: &NativeValue) -> bool {
    if lhs.kind().is_numeric() && rhs.kind().is_numeric() {
        return matches!(ordering("eq", lhs, rhs), Ok(Some(Ordering::Equal)));
    }
    lhs == rhs
}

pub fn eq(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::Bool(equals(lhs, rhs)))
}

pub fn ne(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::Bool(!equals(lhs, rhs)))
}

pub fn gt(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    let ord = ordering("gt", lhs, rhs)?;
    Ok(NativeValue::Bool(ord == Some(Ordering::Greater)))
}

pub fn lt(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    let ord = ordering("lt", lhs, rhs)?;
    Ok(NativeValue::Bool(ord == Some(Ordering::Less)))
}

pub fn ge(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    let ord = ordering("gte", lhs, rhs)?;
    Ok(NativeValue::Bool(matches!(
        ord,
        Some(Ordering::Greater | Ordering::Equal)
    )))
}

pub fn le(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    let ord = ordering("lte", lhs, rhs)?;
    Ok(NativeValue::Bool(matches!(
        ord,
        Some(Ordering::Less | Ordering::Equal)
    )))
}

/// Three-way comparison: `Int32` -1, 0 or 1.
pub fn cmp(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    match ordering("cmp", lhs, rhs)? {
        Some(ord) => Ok(NativeValue::Int32(ord as i32)),
        None => Err(NativeTypeError::InvalidArgument {
            op: "cmp",
            reason: "operands are unordered",
        }),
    }
}

// ── logical ────────────────────────────────────────────────────────

pub fn logical_and(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::Bool(lhs.is_truthy() && rhs.is_truthy()))
}

pub fn logical_or(lhs: &NativeValue, rhs: &NativeValue) -> NativeResult<NativeValue> {
    Ok(NativeValue::Bool(lhs.is_truthy() || rhs.is_truthy()))
}

// ── unary, in place ────────────────────────────────────────────────

fn map_numeric(
    op: &'static str,
    value: &mut NativeValue,
    int_op: fn(i128) -> i128,
    float_op: fn(f64) -> f64,
) -> NativeResult<()> {
    let kind = value.kind();
    let n = match value.num(op)? {
        Num::Int(i) => Num::Int(int_op(i)),
        Num::Float(f) => Num::Float(float_op(f)),
    };
    *value = NativeValue::from_num(kind, n)?;
    Ok(())
}

pub fn pos(value: &mut NativeValue) -> NativeResult<()> {
    value.num("pos").map(|_| ())
}

pub fn neg(value: &mut NativeValue) -> NativeResult<()> {
    map_numeric("neg", value, |i| i.wrapping_neg(), |f| -f)
}

pub fn inc(value: &mut NativeValue) -> NativeResult<()> {
    map_numeric("inc", value, |i| i.wrapping_add(1), |f| f + 1.0)
}

pub fn dec(value: &mut NativeValue) -> NativeResult<()> {
    map_numeric("dec", value, |i| i.wrapping_sub(1), |f| f - 1.0)
}

pub fn abs(value: &mut NativeValue) -> NativeResult<()> {
    map_numeric("abs", value, |i| i.wrapping_abs(), f64::abs)
}

/// Integers become `Dec2`; decimals keep their precision.
pub fn sqrt(value: &mut NativeValue) -> NativeResult<()> {
    *value = match *value {
        NativeValue::Dec1(f) => NativeValue::Dec1(f.sqrt()),
        ref other => NativeValue::Dec2(other.num("sqrt")?.to_f64().sqrt()),
    };
    Ok(())
}

pub fn bit_not(value: &mut NativeValue) -> NativeResult<()> {
    match value {
        NativeValue::Bool(b) => {
            *b = !*b;
            Ok(())
        }
        v if v.kind().is_integral() => map_numeric("bnot", v, |i| !i, |f| f),
        v => Err(NativeTypeError::InvalidOperand {
            op: "bnot",
            kind: v.kind(),
        }),
    }
}

pub fn logical_not(value: &mut NativeValue) -> NativeResult<()> {
    *value = NativeValue::Bool(!value.is_truthy());
    Ok(())
}

pub fn truthy(value: &mut NativeValue) -> NativeResult<()> {
    *value = NativeValue::Bool(value.is_truthy());
    Ok(())
}

pub fn repr(value: &mut NativeValue) -> NativeResult<()> {
    *value = NativeValue::Str(value.repr());
    Ok(())
}

pub fn hash(value: &mut NativeValue) -> NativeResult<()> {
    *value = NativeValue::UInt64(value.hash_value());
    Ok(())
}

/// In-place conversion to `to`.
pub fn convert(value: &mut NativeValue, to: Kind) -> NativeResult<()> {
    *value = value.convert(to)?;
    Ok(())
}
