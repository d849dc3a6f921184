use bytecode::Instruction;
use object::string;

use super::{mutate_top, replace_top, swap_top_two};
use crate::{Process, VmResult};

// ── out-of-place ───────────────────────────────────────────────────────

pub(super) fn strlen(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<0>(p, |s, []| string::len(s))
}

pub(super) fn strsub(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |s, [pos]| string::substr(s, pos))
}

pub(super) fn strsub2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<2>(p, |s, [pos, len]| string::substr_range(s, pos, len))
}

pub(super) fn strfnd(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |s, [t]| string::find(s, t))
}

pub(super) fn strfnd2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<2>(p, |s, [t, pos]| string::find_from(s, t, pos))
}

pub(super) fn strrfnd(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |s, [t]| string::rfind(s, t))
}

pub(super) fn strrfnd2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<2>(p, |s, [t, pos]| string::rfind_before(s, t, pos))
}

pub(super) fn strcmp(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |s, [t]| string::compare(s, t))
}

pub(super) fn strcmp2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<3>(p, |s, [pos, len, t]| string::compare_range(s, pos, len, t))
}

pub(super) fn strstarts(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |s, [t]| string::starts_with(s, t))
}

pub(super) fn strends(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |s, [t]| string::ends_with(s, t))
}

// ── in place ───────────────────────────────────────────────────────────

pub(super) fn strclr(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |s, []| string::clear(s))
}

pub(super) fn strapd(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<1>(p, |s, [t]| string::append(s, t))
}

pub(super) fn strpsh(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<1>(p, |s, [c]| string::push_char(s, c))
}

pub(super) fn strist(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<2>(p, |s, [pos, t]| string::insert(s, pos, t))
}

pub(super) fn strist2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<2>(p, |s, [pos, c]| string::insert_char(s, pos, c))
}

pub(super) fn strers(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<1>(p, |s, [pos]| string::erase(s, pos))
}

pub(super) fn strers2(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<2>(p, |s, [pos, len]| string::erase_range(s, pos, len))
}

pub(super) fn strrplc(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<3>(p, |s, [pos, len, t]| string::replace(s, pos, len, t))
}

pub(super) fn strswp(p: &mut Process, _: &Instruction) -> VmResult<()> {
    swap_top_two(p, string::swap)
}

pub(super) fn strrev(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |s, []| string::reverse(s))
}

pub(super) fn strupper(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |s, []| string::to_upper(s))
}

pub(super) fn strlower(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |s, []| string::to_lower(s))
}

pub(super) fn strtrm(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |s, []| string::trim(s))
}

pub(super) fn strtrml(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |s, []| string::trim_start(s))
}

pub(super) fn strtrmr(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |s, []| string::trim_end(s))
}
