/// Per-object protection bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct ObjectFlags(pub u8);

impl ObjectFlags {
    pub const NONE: Self = Self(0);
    /// Never reclaimed by the collector; also acts as a GC root.
    pub const NON_GC: Self = Self(1 << 0);
    /// Variable and attribute deletion of this object is rejected.
    pub const INDELIBLE: Self = Self(1 << 1);
    /// `PINVK` rejects this object.
    pub const NON_CALLABLE: Self = Self(1 << 2);
    /// Attribute and native handle mutation is rejected.
    pub const IMMUTABLE: Self = Self(1 << 3);

    #[inline(always)]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    #[inline(always)]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    #[inline(always)]
    pub const fn without(self, flag: Self) -> Self {
        Self(self.0 & !flag.0)
    }
}
