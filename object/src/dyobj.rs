use std::collections::HashMap;

use crate::{ClosureCtx, NativeKey, ObjectFlags, ObjectId};

pub type AttrKey = u64;

/// A dynamically-typed heap object.
///
/// Objects carry no payload of their own: structure lives in the attribute
/// map, primitive data in at most one native handle (held by key), and
/// callability in an optional closure context.
#[derive(Debug, Clone, Default)]
pub struct DynamicObject {
    flags: ObjectFlags,
    attrs: HashMap<AttrKey, ObjectId>,
    ntvhndl_key: Option<NativeKey>,
    closure_ctx: Option<ClosureCtx>,
}

impl DynamicObject {
    pub fn new() -> Self {
        Self::default()
    }

    // ── flags ──────────────────────────────────────────────────────

    #[inline(always)]
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    #[inline(always)]
    pub fn get_flag(&self, flag: ObjectFlags) -> bool {
        self.flags.contains(flag)
    }

    #[inline(always)]
    pub fn set_flag(&mut self, flag: ObjectFlags) {
        self.flags = self.flags.with(flag);
    }

    #[inline(always)]
    pub fn clear_flag(&mut self, flag: ObjectFlags) {
        self.flags = self.flags.without(flag);
    }

    // ── attributes ─────────────────────────────────────────────────

    /// Binds `key` to `value`, returning the previous binding.
    pub fn putattr(&mut self, key: AttrKey, value: ObjectId) -> Option<ObjectId> {
        self.attrs.insert(key, value)
    }

    pub fn getattr(&self, key: AttrKey) -> Option<ObjectId> {
        self.attrs.get(&key).copied()
    }

    pub fn delattr(&mut self, key: AttrKey) -> Option<ObjectId> {
        self.attrs.remove(&key)
    }

    pub fn hasattr(&self, key: AttrKey) -> bool {
        self.attrs.contains_key(&key)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (AttrKey, ObjectId)> + '_ {
        self.attrs.iter().map(|(k, v)| (*k, *v))
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    // ── native handle ──────────────────────────────────────────────

    #[inline(always)]
    pub fn ntvhndl_key(&self) -> Option<NativeKey> {
        self.ntvhndl_key
    }

    pub fn set_ntvhndl_key(&mut self, key: NativeKey) {
        self.ntvhndl_key = Some(key);
    }

    pub fn clear_ntvhndl_key(&mut self) -> Option<NativeKey> {
        self.ntvhndl_key.take()
    }

    // ── closure context ────────────────────────────────────────────

    #[inline(always)]
    pub fn closure_ctx(&self) -> Option<ClosureCtx> {
        self.closure_ctx
    }

    pub fn set_closure_ctx(&mut self, ctx: ClosureCtx) {
        self.closure_ctx = Some(ctx);
    }
}
