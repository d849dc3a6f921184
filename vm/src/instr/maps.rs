use bytecode::Instruction;
use object::map;

use super::{mutate_top, read_element, replace_top, swap_top_two};
use crate::{Process, VmResult};

pub(super) fn maplen(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<0>(p, |m, []| map::len(m))
}

pub(super) fn mapemp(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<0>(p, |m, []| map::is_empty(m))
}

pub(super) fn mapfind(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<1>(p, |m, [k]| map::find(m, k))
}

pub(super) fn mapat(p: &mut Process, _: &Instruction) -> VmResult<()> {
    read_element::<1>(p, |m, [k]| map::at(m, k))
}

pub(super) fn mapput(p: &mut Process, _: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    mutate_top::<1>(p, |m, [k]| map::put(m, k, id))
}

pub(super) fn mapers(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<1>(p, |m, [k]| map::erase(m, k))
}

pub(super) fn mapclr(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<0>(p, |m, []| map::clear(m))
}

pub(super) fn mapswp(p: &mut Process, _: &Instruction) -> VmResult<()> {
    swap_top_two(p, map::swap)
}

pub(super) fn mapvals(p: &mut Process, _: &Instruction) -> VmResult<()> {
    replace_top::<0>(p, |m, []| map::values(m))
}

pub(super) fn mapmrg(p: &mut Process, _: &Instruction) -> VmResult<()> {
    mutate_top::<1>(p, |m, [n]| map::merge(m, n))
}
