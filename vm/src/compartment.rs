use std::collections::HashMap;

use object::ClosureId;

use crate::{Closure, VmError, VmResult};

/// Name of the closure a process starts in, when present.
pub const MAIN_CLOSURE: &str = "__main__";

/// A loaded module: literal tables plus a closure table.
#[derive(Debug, Clone, Default)]
pub struct Compartment {
    path: String,
    strings: Vec<String>,
    floats: Vec<f64>,
    closures: Vec<Closure>,
    /// Position of closures whose id differs from their position.
    sparse_ids: HashMap<ClosureId, usize>,
}

impl Compartment {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_string_literal_table(&mut self, strings: Vec<String>) {
        self.strings = strings;
    }

    pub fn set_fpt_literal_table(&mut self, floats: Vec<f64>) {
        self.floats = floats;
    }

    pub fn set_closure_table(&mut self, closures: Vec<Closure>) {
        self.sparse_ids = closures
            .iter()
            .enumerate()
            .filter(|(i, c)| c.id() != *i as ClosureId)
            .map(|(i, c)| (c.id(), i))
            .collect();
        self.closures = closures;
    }

    pub fn string_literals(&self) -> &[String] {
        &self.strings
    }

    pub fn fpt_literals(&self) -> &[f64] {
        &self.floats
    }

    pub fn closures(&self) -> &[Closure] {
        &self.closures
    }

    pub fn get_closure_by_id(&self, id: ClosureId) -> VmResult<&Closure> {
        let by_position = usize::try_from(id)
            .ok()
            .and_then(|i| self.closures.get(i))
            .filter(|c| c.id() == id);
        by_position
            .or_else(|| self.sparse_ids.get(&id).map(|&i| &self.closures[i]))
            .ok_or(VmError::ClosureNotFound(id))
    }

    /// The closure named [`MAIN_CLOSURE`], else the first closure without a
    /// parent.
    pub fn get_starting_closure(&self) -> Option<&Closure> {
        self.closures
            .iter()
            .find(|c| c.name() == MAIN_CLOSURE)
            .or_else(|| self.closures.iter().find(|c| c.parent_id().is_none()))
    }

    pub fn get_string_literal(&self, key: u64) -> VmResult<&str> {
        usize::try_from(key)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map(String::as_str)
            .ok_or(VmError::StringLiteralNotFound(key))
    }

    pub fn get_float_literal(&self, key: u64) -> VmResult<f64> {
        usize::try_from(key)
            .ok()
            .and_then(|i| self.floats.get(i))
            .copied()
            .ok_or(VmError::FptLiteralNotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use bytecode::{Instruction, Op};

    use super::*;

    fn rtrn() -> Vec<Instruction> {
        vec![Instruction::from(Op::Rtrn)]
    }

    fn compartment() -> Compartment {
        let mut c = Compartment::new("m.src");
        c.set_string_literal_table(vec!["x".into()]);
        c.set_fpt_literal_table(vec![2.5]);
        c.set_closure_table(vec![
            Closure::new("helper", 0, Some(40), rtrn()),
            Closure::new("outer", 40, None, rtrn()),
            Closure::new("inner", 2, Some(40), rtrn()),
        ]);
        c
    }

    #[test]
    fn lookup_by_position_and_sparse_id() {
        let c = compartment();
        assert_eq!(c.get_closure_by_id(0).unwrap().name(), "helper");
        assert_eq!(c.get_closure_by_id(40).unwrap().name(), "outer");
        assert_eq!(c.get_closure_by_id(2).unwrap().name(), "inner");
    }

    #[test]
    fn missing_closure_is_consistently_not_found() {
        let c = compartment();
        for _ in 0..3 {
            assert!(matches!(c.get_closure_by_id(1), Err(VmError::ClosureNotFound(1))));
        }
    }

    #[test]
    fn starting_closure() {
        let c = compartment();
        assert_eq!(c.get_starting_closure().unwrap().name(), "outer");

        let mut with_main = compartment();
        let mut closures = with_main.closures().to_vec();
        closures.push(Closure::new(MAIN_CLOSURE, 3, Some(40), rtrn()));
        with_main.set_closure_table(closures);
        assert_eq!(with_main.get_starting_closure().unwrap().id(), 3);

        assert!(Compartment::new("empty").get_starting_closure().is_none());
    }

    #[test]
    fn literals() {
        let c = compartment();
        assert_eq!(c.get_string_literal(0).unwrap(), "x");
        assert_eq!(c.get_float_literal(0).unwrap(), 2.5);
        assert!(matches!(c.get_string_literal(1), Err(VmError::StringLiteralNotFound(1))));
        assert!(matches!(c.get_float_literal(9), Err(VmError::FptLiteralNotFound(9))));
    }
}
