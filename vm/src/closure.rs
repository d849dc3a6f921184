use std::collections::BTreeMap;
use std::sync::Arc;

use bytecode::Instruction;
use object::ClosureId;

/// Guest exception handler range: an exception raised at any instruction in
/// `from..=to` resumes at `dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchSite {
    pub from: usize,
    pub to: usize,
    pub dest: usize,
}

impl CatchSite {
    pub const fn new(from: usize, to: usize, dest: usize) -> Self {
        Self { from, to, dest }
    }

    #[inline]
    pub const fn covers(&self, index: usize) -> bool {
        self.from <= index && index <= self.to
    }
}

/// Source position of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub lineno: u32,
    pub col_offset: u32,
}

/// A named unit of code with an optional lexical parent.
///
/// The instruction vector is shared with every frame executing it.
#[derive(Debug, Clone)]
pub struct Closure {
    name: String,
    id: ClosureId,
    parent_id: Option<ClosureId>,
    code: Arc<[Instruction]>,
    locs: BTreeMap<usize, Loc>,
    catch_sites: Vec<CatchSite>,
}

impl Closure {
    pub fn new(
        name: impl Into<String>,
        id: ClosureId,
        parent_id: Option<ClosureId>,
        code: impl Into<Arc<[Instruction]>>,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            parent_id,
            code: code.into(),
            locs: BTreeMap::new(),
            catch_sites: Vec::new(),
        }
    }

    pub fn with_loc(mut self, index: usize, lineno: u32, col_offset: u32) -> Self {
        self.locs.insert(index, Loc { lineno, col_offset });
        self
    }

    /// Catch sites are searched in the order they were added.
    pub fn with_catch_site(mut self, site: CatchSite) -> Self {
        self.catch_sites.push(site);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn id(&self) -> ClosureId {
        self.id
    }

    #[inline]
    pub fn parent_id(&self) -> Option<ClosureId> {
        self.parent_id
    }

    #[inline]
    pub fn code(&self) -> &Arc<[Instruction]> {
        &self.code
    }

    pub fn catch_sites(&self) -> &[CatchSite] {
        &self.catch_sites
    }

    pub fn locs(&self) -> impl Iterator<Item = (usize, Loc)> + '_ {
        self.locs.iter().map(|(i, l)| (*i, *l))
    }

    /// Location of the last entry at or before `index`.
    pub fn loc_at(&self, index: usize) -> Option<Loc> {
        self.locs.range(..=index).next_back().map(|(_, loc)| *loc)
    }

    /// First catch site covering `index`.
    pub fn find_catch_site(&self, index: usize) -> Option<&CatchSite> {
        self.catch_sites.iter().find(|site| site.covers(index))
    }
}

#[cfg(test)]
mod tests {
    use bytecode::Op;

    use super::*;

    fn closure() -> Closure {
        let code: Vec<Instruction> = (0..12).map(|_| Instruction::from(Op::New)).collect();
        Closure::new("f", 1, None, code)
            .with_loc(0, 1, 0)
            .with_loc(4, 2, 8)
            .with_catch_site(CatchSite::new(0, 5, 10))
            .with_catch_site(CatchSite::new(3, 8, 11))
    }

    #[test]
    fn loc_lookup_takes_last_entry_at_or_before() {
        let c = closure();
        assert_eq!(c.loc_at(0), Some(Loc { lineno: 1, col_offset: 0 }));
        assert_eq!(c.loc_at(3), Some(Loc { lineno: 1, col_offset: 0 }));
        assert_eq!(c.loc_at(9), Some(Loc { lineno: 2, col_offset: 8 }));
    }

    #[test]
    fn catch_sites_are_inclusive_and_ordered() {
        let c = closure();
        assert_eq!(c.find_catch_site(3).map(|s| s.dest), Some(10));
        assert_eq!(c.find_catch_site(5).map(|s| s.dest), Some(10));
        assert_eq!(c.find_catch_site(7).map(|s| s.dest), Some(11));
        assert_eq!(c.find_catch_site(9), None);
    }
}
