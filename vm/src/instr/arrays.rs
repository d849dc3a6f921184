use bytecode::Instruction;
use object::array;

use super::{mutate_top, read_element, replace_top, swap_top_two};
use crate::{Process, VmResult};

pub(super) fn arylen(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<0>(p, |a, []| array::len(a))
}

pub(super) fn aryemp(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<0>(p, |a, []| array::is_empty(a))
}

pub(super) fn aryat(p: &mut Process, _: &Instruction) -> VmResult<()> {
    read_element::<1>(p, |a, [i]| array::at(a, i))
}

pub(super) fn aryfrt(p: &mut Process, _: &Instruction) -> VmResult<()> {
    read_element::<0>(p, |a, []| array::front(a))
}

pub(super) fn arybak(p: &mut Process, _: &Instruction) -> VmResult<()> {
    read_element::<0>(p, |a, []| array::back(a))
}

pub(super) fn aryput(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    mutate_top::<1>(p, |a, [i]| array::put(a, i, id))
}

pub(super) fn aryapnd(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    mutate_top::<0>(p, |a, []| array::append(a, id))
}

pub(super) fn aryers(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<1>(p, |a, [i]| array::erase(a, i))
}

pub(super) fn arypop(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |a, []| array::pop(a).map(drop))
}

pub(super) fn aryswp(p: &mut Process, _: &Instruction) -> VmResult<()> {
    swap_top_two(p, array::swap)
}

pub(super) fn aryclr(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |a, []| array::clear(a))
}

pub(super) fn arymrg(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<1>(p, |a, [b]| array::merge(a, b))
}

pub(super) fn aryslice(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<2>(p, |a, [start, stop]| array::slice(a, start, stop))
}

pub(super) fn arystrd(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |a, [step]| array::stride(a, step))
}

pub(super) fn aryrev(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |a, []| array::reverse(a))
}
