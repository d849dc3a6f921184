use std::collections::BTreeMap;

use object::{ClosureCtx, ObjectId};

use crate::{VmError, VmResult};

/// Arguments staged for one call.
///
/// Created by `PINVK`, filled by the caller's `PUT*` instructions and read
/// by the callee's `GET*` instructions. Keyword keys are kept in ascending
/// order.
#[derive(Debug, Clone)]
pub struct InvocationCtx {
    ctx: ClosureCtx,
    params: Vec<ObjectId>,
    cursor: usize,
    kwargs: BTreeMap<u64, ObjectId>,
}

impl InvocationCtx {
    pub fn new(ctx: ClosureCtx) -> Self {
        Self {
            ctx,
            params: Vec::new(),
            cursor: 0,
            kwargs: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn closure_ctx(&self) -> ClosureCtx {
        self.ctx
    }

    pub fn put_param(&mut self, id: ObjectId) {
        self.params.push(id);
    }

    /// Next positional argument. The list itself is left intact.
    pub fn pop_param(&mut self) -> VmResult<ObjectId> {
        let id = *self
            .params
            .get(self.cursor)
            .ok_or(VmError::MissingParameter { key: None })?;
        self.cursor += 1;
        Ok(id)
    }

    pub fn has_params(&self) -> bool {
        self.cursor < self.params.len()
    }

    /// Consumes every remaining positional argument.
    pub fn take_params(&mut self) -> Vec<ObjectId> {
        let rest = self.params[self.cursor..].to_vec();
        self.cursor = self.params.len();
        rest
    }

    pub fn put_param_value_pair(&mut self, key: u64, id: ObjectId) {
        self.kwargs.insert(key, id);
    }

    pub fn pop_param_value_pair(&mut self, key: u64) -> VmResult<ObjectId> {
        self.kwargs
            .remove(&key)
            .ok_or(VmError::MissingParameter { key: Some(key) })
    }

    pub fn has_param_value_pair_with_key(&self, key: u64) -> bool {
        self.kwargs.contains_key(&key)
    }

    pub fn param_value_pair_keys(&self) -> Vec<u64> {
        self.kwargs.keys().copied().collect()
    }

    /// Removes and returns every keyword argument.
    pub fn take_param_value_pairs(&mut self) -> BTreeMap<u64, ObjectId> {
        std::mem::take(&mut self.kwargs)
    }

    /// Every object this context keeps alive.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.params.iter().chain(self.kwargs.values()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u32) -> ObjectId {
        ObjectId::new(i, 0)
    }

    #[test]
    fn positional_params_use_a_cursor() {
        let mut ctx = InvocationCtx::new(ClosureCtx::new(0, 1));
        ctx.put_param(id(1));
        ctx.put_param(id(2));
        ctx.put_param(id(3));
        assert_eq!(ctx.pop_param().unwrap(), id(1));
        assert!(ctx.has_params());
        assert_eq!(ctx.take_params(), vec![id(2), id(3)]);
        assert!(!ctx.has_params());
        assert!(matches!(
            ctx.pop_param(),
            Err(VmError::MissingParameter { key: None })
        ));
        assert_eq!(ctx.object_ids().count(), 3);
    }

    #[test]
    fn keyword_params() {
        let mut ctx = InvocationCtx::new(ClosureCtx::new(0, 1));
        ctx.put_param_value_pair(9, id(9));
        ctx.put_param_value_pair(4, id(4));
        assert!(ctx.has_param_value_pair_with_key(9));
        assert_eq!(ctx.param_value_pair_keys(), vec![4, 9]);
        assert_eq!(ctx.pop_param_value_pair(9).unwrap(), id(9));
        assert!(matches!(
            ctx.pop_param_value_pair(9),
            Err(VmError::MissingParameter { key: Some(9) })
        ));
        assert_eq!(ctx.take_param_value_pairs().len(), 1);
        assert!(ctx.param_value_pair_keys().is_empty());
    }
}
