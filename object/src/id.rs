use core::fmt;

/// Weak reference to an object living in the dynamic-object heap.
///
/// `index` addresses a heap slot, `generation` is bumped every time that slot
/// is reclaimed so a stale id never aliases a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    #[inline(always)]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline(always)]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline(always)]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Packs the id as `generation << 32 | index`.
    #[inline(always)]
    pub const fn to_raw(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.index, self.generation)
    }
}

/// Opaque key of a native value handle stored in a native-types pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeKey(u32);

impl NativeKey {
    #[inline(always)]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ntv#{}", self.0)
    }
}
