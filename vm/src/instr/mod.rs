//! Instruction handlers and the dispatch table.
//!
//! Every handler has the same shape, so dispatch is a single indexed call
//! through [`INSTR_TABLE`]. When a handler runs, the frame's pc already
//! points past the instruction being executed.

use bytecode::{Instruction, Op};
use object::{DynamicObject, NativeResult, NativeValue, ObjectFlags, ObjectId};

use crate::{Process, VmError, VmResult};

mod args;
mod arrays;
mod control;
mod maps;
mod native;
mod objects;
mod runtime;
mod strings;

pub type InstrHandler = fn(&mut Process, &Instruction) -> VmResult<()>;

/// Handler per opcode, indexed by `Op as usize`.
pub static INSTR_TABLE: [InstrHandler; Op::COUNT] = {
    let mut table = [handler_for(Op::New); Op::COUNT];
    let mut i = 0;
    while i < Op::COUNT {
        table[i] = handler_for(Op::ALL[i]);
        i += 1;
    }
    table
};

const fn handler_for(op: Op) -> InstrHandler {
    match op {
        Op::New => objects::new,
        Op::LdObj => objects::ldobj,
        Op::StObj => objects::stobj,
        Op::StObjN => objects::stobjn,
        Op::GetAttr => objects::getattr,
        Op::SetAttr => objects::setattr,
        Op::DelAttr => objects::delattr,
        Op::HasAttr => objects::hasattr,
        Op::GetAttr2 => objects::getattr2,
        Op::SetAttr2 => objects::setattr2,
        Op::DelAttr2 => objects::delattr2,
        Op::HasAttr2 => objects::hasattr2,
        Op::Pop => objects::pop,
        Op::LdObj2 => objects::ldobj2,
        Op::StObj2 => objects::stobj2,
        Op::DelObj => objects::delobj,
        Op::DelObj2 => objects::delobj2,
        Op::GetHndl => objects::gethndl,
        Op::SetHndl => objects::sethndl,
        Op::GetHndl2 => objects::gethndl2,
        Op::SetHndl2 => objects::sethndl2,
        Op::ClrHndl => objects::clrhndl,
        Op::CpyHndl => objects::cpyhndl,
        Op::CpyRepr => objects::cpyrepr,
        Op::IsTruthy => objects::istruthy,
        Op::ObjEq => objects::objeq,
        Op::ObjNeq => objects::objneq,
        Op::SetCtx => objects::setctx,
        Op::CldObj => objects::cldobj,
        Op::SetAttrs => objects::setattrs,
        Op::Swap => objects::swap,
        Op::SetFlGc => objects::setflgc,
        Op::SetFlDel => objects::setfldel,
        Op::SetFlCall => objects::setflcall,
        Op::SetFlMute => objects::setflmute,

        Op::PInvk => control::pinvk,
        Op::Invk => control::invk,
        Op::Rtrn => control::rtrn,
        Op::Jmp => control::jmp,
        Op::JmpIf => control::jmpif,
        Op::JmpR => control::jmpr,
        Op::Exc => control::exc,
        Op::ExcObj => control::excobj,
        Op::ClrExc => control::clrexc,
        Op::JmpExc => control::jmpexc,
        Op::Exit => control::exit,

        Op::PutArg => args::putarg,
        Op::PutKwArg => args::putkwarg,
        Op::PutArgs => args::putargs,
        Op::PutKwArgs => args::putkwargs,
        Op::GetArg => args::getarg,
        Op::GetKwArg => args::getkwarg,
        Op::GetArgs => args::getargs,
        Op::GetKwArgs => args::getkwargs,
        Op::HasArgs => args::hasargs,

        Op::Gc => runtime::gc,
        Op::Debug => runtime::debug,
        Op::Print => runtime::print,

        Op::EPop => native::epop,
        Op::EDup => native::edup,
        Op::ESwap => native::eswap,

        Op::Int8 => native::int8,
        Op::Int16 => native::int16,
        Op::Int32 => native::int32,
        Op::Int64 => native::int64,
        Op::UInt8 => native::uint8,
        Op::UInt16 => native::uint16,
        Op::UInt32 => native::uint32,
        Op::UInt64 => native::uint64,
        Op::Bool => native::boolean,
        Op::Dec1 => native::dec1,
        Op::Dec2 => native::dec2,
        Op::Str => native::string,
        Op::Ary => native::ary,
        Op::Map => native::map,

        Op::ToInt8 => native::toint8,
        Op::ToInt16 => native::toint16,
        Op::ToInt32 => native::toint32,
        Op::ToInt64 => native::toint64,
        Op::ToUInt8 => native::touint8,
        Op::ToUInt16 => native::touint16,
        Op::ToUInt32 => native::touint32,
        Op::ToUInt64 => native::touint64,
        Op::ToBool => native::tobool,
        Op::ToDec1 => native::todec1,
        Op::ToDec2 => native::todec2,
        Op::ToStr => native::tostr,
        Op::ToAry => native::toary,
        Op::ToMap => native::tomap,

        Op::Pos => native::pos,
        Op::Neg => native::neg,
        Op::Inc => native::inc,
        Op::Dec => native::dec,
        Op::Abs => native::abs,
        Op::Sqrt => native::sqrt,
        Op::BNot => native::bnot,
        Op::LNot => native::lnot,
        Op::Truthy => native::truthy,
        Op::Repr => native::repr,
        Op::Hash => native::hash,

        Op::Add => native::add,
        Op::Sub => native::sub,
        Op::Mul => native::mul,
        Op::Div => native::div,
        Op::Mod => native::rem,
        Op::Pow => native::pow,
        Op::BAnd => native::band,
        Op::BOr => native::bor,
        Op::BXor => native::bxor,
        Op::BLs => native::bls,
        Op::BRs => native::brs,
        Op::Eq => native::eq,
        Op::Neq => native::neq,
        Op::Gt => native::gt,
        Op::Lt => native::lt,
        Op::Gte => native::gte,
        Op::Lte => native::lte,
        Op::LAnd => native::land,
        Op::LOr => native::lor,
        Op::Cmp => native::cmp,

        Op::StrLen => strings::strlen,
        Op::StrClr => strings::strclr,
        Op::StrApd => strings::strapd,
        Op::StrPsh => strings::strpsh,
        Op::StrIst => strings::strist,
        Op::StrIst2 => strings::strist2,
        Op::StrErs => strings::strers,
        Op::StrErs2 => strings::strers2,
        Op::StrRplc => strings::strrplc,
        Op::StrSwp => strings::strswp,
        Op::StrSub => strings::strsub,
        Op::StrSub2 => strings::strsub2,
        Op::StrFnd => strings::strfnd,
        Op::StrFnd2 => strings::strfnd2,
        Op::StrRfnd => strings::strrfnd,
        Op::StrRfnd2 => strings::strrfnd2,
        Op::StrCmp => strings::strcmp,
        Op::StrCmp2 => strings::strcmp2,
        Op::StrStarts => strings::strstarts,
        Op::StrEnds => strings::strends,
        Op::StrRev => strings::strrev,
        Op::StrUpper => strings::strupper,
        Op::StrLower => strings::strlower,
        Op::StrTrm => strings::strtrm,
        Op::StrTrmL => strings::strtrml,
        Op::StrTrmR => strings::strtrmr,

        Op::AryLen => arrays::arylen,
        Op::AryEmp => arrays::aryemp,
        Op::AryAt => arrays::aryat,
        Op::AryFrt => arrays::aryfrt,
        Op::AryBak => arrays::arybak,
        Op::AryPut => arrays::aryput,
        Op::AryApnd => arrays::aryapnd,
        Op::AryErs => arrays::aryers,
        Op::AryPop => arrays::arypop,
        Op::ArySwp => arrays::aryswp,
        Op::AryClr => arrays::aryclr,
        Op::AryMrg => arrays::arymrg,
        Op::ArySlice => arrays::aryslice,
        Op::AryStrd => arrays::arystrd,
        Op::AryRev => arrays::aryrev,

        Op::MapLen => maps::maplen,
        Op::MapEmp => maps::mapemp,
        Op::MapFind => maps::mapfind,
        Op::MapAt => maps::mapat,
        Op::MapPut => maps::mapput,
        Op::MapErs => maps::mapers,
        Op::MapClr => maps::mapclr,
        Op::MapSwp => maps::mapswp,
        Op::MapVals => maps::mapvals,
        Op::MapMrg => maps::mapmrg,
    }
}

// ── shared operand plumbing ────────────────────────────────────────────

/// Pops `N` values off the evaluation stack, deepest first.
fn pop_operands<const N: usize>(p: &mut Process) -> VmResult<[NativeValue; N]> {
    let frame = p.frame_mut()?;
    let mut operands: [NativeValue; N] = std::array::from_fn(|_| NativeValue::default());
    for slot in operands.iter_mut().rev() {
        *slot = frame.pop_eval()?;
    }
    Ok(operands)
}

/// Out-of-place: consumes the top `N` values and replaces the value beneath
/// them with `f`'s result.
fn replace_top<const N: usize>(
    p: &mut Process,
    f: impl FnOnce(&NativeValue, &[NativeValue; N]) -> NativeResult<NativeValue>,
) -> VmResult<()> {
    let operands = pop_operands::<N>(p)?;
    let top = p.top_eval()?;
    *top = f(top, &operands)?;
    Ok(())
}

/// In-place: consumes the top `N` values and mutates the value beneath them.
fn mutate_top<const N: usize>(
    p: &mut Process,
    f: impl FnOnce(&mut NativeValue, &[NativeValue; N]) -> NativeResult<()>,
) -> VmResult<()> {
    let operands = pop_operands::<N>(p)?;
    f(p.top_eval()?, &operands)?;
    Ok(())
}

/// Exchanges the contents of the two topmost values in place.
fn swap_top_two(
    p: &mut Process,
    f: fn(&mut NativeValue, &mut NativeValue) -> NativeResult<()>,
) -> VmResult<()> {
    let (a, b) = p.frame_mut()?.top_two_eval()?;
    f(a, b)?;
    Ok(())
}

/// Object `id`, rejecting it when flagged immutable.
fn mutable_object(p: &mut Process, id: ObjectId) -> VmResult<&mut DynamicObject> {
    let obj = p.object_mut(id)?;
    if obj.get_flag(ObjectFlags::IMMUTABLE) {
        return Err(VmError::InvalidOperation("object is immutable"));
    }
    Ok(obj)
}

fn operand_addr(oprd: u64) -> VmResult<usize> {
    usize::try_from(oprd).map_err(|_| VmError::InvalidInstrAddr(oprd as i64))
}

/// Consumes the top `N` values and pushes the object id `f` reads out of
/// the container beneath them. The container stays.
fn read_element<const N: usize>(
    p: &mut Process,
    f: impl FnOnce(&NativeValue, &[NativeValue; N]) -> NativeResult<ObjectId>,
) -> VmResult<()> {
    let operands = pop_operands::<N>(p)?;
    let id = f(p.top_eval()?, &operands)?;
    p.push_object(id);
    Ok(())
}
