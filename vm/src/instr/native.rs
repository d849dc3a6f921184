//! Evaluation-stack instructions: constructors, conversions, unary and
//! binary operators.

use std::collections::BTreeMap;

use bytecode::Instruction;
use object::{Kind, NativeResult, NativeValue, ops};

use super::replace_top;
use crate::{Process, VmResult};

pub(super) fn epop(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.pop_eval().map(drop)
}

pub(super) fn edup(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let value = p.top_eval()?.clone();
    p.push_eval(value)
}

pub(super) fn eswap(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.frame_mut()?.swap_eval()
}

// ── constructors ───────────────────────────────────────────────────────

macro_rules! int_constructors {
    ($($name:ident => $variant:ident($ty:ty),)*) => {
        $(
            pub(super) fn $name(p: &mut Process, i: &Instruction) -> VmResult<()> {
                p.push_eval(NativeValue::$variant(i.oprd1 as $ty))
            }
        )*
    };
}

int_constructors! {
    int8 => Int8(i8),
    int16 => Int16(i16),
    int32 => Int32(i32),
    int64 => Int64(i64),
    uint8 => UInt8(u8),
    uint16 => UInt16(u16),
    uint32 => UInt32(u32),
    uint64 => UInt64(u64),
}

pub(super) fn boolean(p: &mut Process, i: &Instruction) -> VmResult<()> {
    p.push_eval(NativeValue::Bool(i.oprd1 != 0))
}

pub(super) fn dec1(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let f = p.current_compartment()?.get_float_literal(i.oprd1)?;
    p.push_eval(NativeValue::Dec1(f as f32))
}

pub(super) fn dec2(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let f = p.current_compartment()?.get_float_literal(i.oprd1)?;
    p.push_eval(NativeValue::Dec2(f))
}

pub(super) fn string(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let s = p.string_literal(i.oprd1)?.to_owned();
    p.push_eval(NativeValue::Str(s))
}

pub(super) fn ary(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.push_eval(NativeValue::Array(Vec::new()))
}

pub(super) fn map(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.push_eval(NativeValue::Map(BTreeMap::new()))
}

// ── conversions and unary operators, in place ──────────────────────────

fn unary(p: &mut Process, f: fn(&mut NativeValue) -> NativeResult<()>) -> VmResult<()> {
    f(p.top_eval()?)?;
    Ok(())
}

macro_rules! conversion_handlers {
    ($($name:ident => $kind:ident,)*) => {
        $(
            pub(super) fn $name(p: &mut Process, _: &Instruction) -> VmResult<()> {
                ops::convert(p.top_eval()?, Kind::$kind)?;
                Ok(())
            }
        )*
    };
}

conversion_handlers! {
    toint8 => Int8,
    toint16 => Int16,
    toint32 => Int32,
    toint64 => Int64,
    touint8 => UInt8,
    touint16 => UInt16,
    touint32 => UInt32,
    touint64 => UInt64,
    tobool => Bool,
    todec1 => Dec1,
    todec2 => Dec2,
    tostr => Str,
    toary => Array,
    tomap => Map,
}

macro_rules! unary_handlers {
    ($($name:ident => $f:path,)*) => {
        $(
            pub(super) fn $name(p: &mut Process, _: &Instruction) -> VmResult<()> {
                unary(p, $f)
            }
        )*
    };
}

unary_handlers! {
    pos => ops::pos,
    neg => ops::neg,
    inc => ops::inc,
    dec => ops::dec,
    abs => ops::abs,
    sqrt => ops::sqrt,
    bnot => ops::bit_not,
    lnot => ops::logical_not,
    truthy => ops::truthy,
    repr => ops::repr,
    hash => ops::hash,
}

// ── binary operators ───────────────────────────────────────────────────

/// `[.., lhs, rhs] -> [.., lhs OP rhs]`
fn binary(
    p: &mut Process,
    f: fn(&NativeValue, &NativeValue) -> NativeResult<NativeValue>,
) -> VmResult<()> {
    replace_top::<1>(p, |lhs, [rhs]| f(lhs, rhs))
}

macro_rules! binary_handlers {
    ($($name:ident => $f:path,)*) => {
        $(
            pub(super) fn $name(p: &mut Process, _: &Instruction) -> VmResult<()> {
                binary(p, $f)
            }
        )*
    };
}

binary_handlers! {
    add => ops::add,
    sub => ops::sub,
    mul => ops::mul,
    div => ops::div,
    rem => ops::rem,
    pow => ops::pow,
    band => ops::bit_and,
    bor => ops::bit_or,
    bxor => ops::bit_xor,
    bls => ops::shl,
    brs => ops::shr,
    eq => ops::eq,
    neq => ops::ne,
    gt => ops::gt,
    lt => ops::lt,
    gte => ops::ge,
    lte => ops::le,
    land => ops::logical_and,
    lor => ops::logical_or,
    cmp => ops::cmp,
}
