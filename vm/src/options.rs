/// Automatic collection rule, checked whenever a frame returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcFlag {
    /// Collect after every return.
    Always,
    /// Collect when the heap is fuller than the threshold.
    ByHeapSize,
    /// Collect when the native handle pool is fuller than the threshold.
    ByNtvhndlPoolSize,
}

/// Set of active [`GcFlag`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct GcFlags(pub u8);

impl GcFlags {
    pub const NONE: Self = Self(0);

    #[inline(always)]
    const fn bit(flag: GcFlag) -> u8 {
        match flag {
            GcFlag::Always => 1 << 0,
            GcFlag::ByHeapSize => 1 << 1,
            GcFlag::ByNtvhndlPoolSize => 1 << 2,
        }
    }

    #[inline(always)]
    pub const fn contains(self, flag: GcFlag) -> bool {
        self.0 & Self::bit(flag) != 0
    }

    #[inline(always)]
    pub const fn with(self, flag: GcFlag) -> Self {
        Self(self.0 | Self::bit(flag))
    }

    #[inline(always)]
    pub const fn without(self, flag: GcFlag) -> Self {
        Self(self.0 & !Self::bit(flag))
    }

    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<GcFlag> for GcFlags {
    fn from_iter<I: IntoIterator<Item = GcFlag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

/// Configuration of a [`Process`](crate::Process).
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Maximum number of live heap objects.
    pub heap_capacity: usize,
    /// Maximum number of native type handles.
    pub pool_capacity: usize,
    /// Maximum call depth before `CallStackOverflow`.
    pub max_call_depth: usize,
    pub gc_flags: GcFlags,
    /// Occupancy ratio (0.0 - 1.0) at which the size-based rules fire.
    pub gc_threshold: f64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            heap_capacity: 1 << 20,
            pool_capacity: 1 << 20,
            max_call_depth: 1024,
            gc_flags: GcFlags::NONE,
            gc_threshold: 0.75,
        }
    }
}

impl ProcessOptions {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.heap_capacity == 0 || self.pool_capacity == 0 {
            return Err("capacities must be > 0");
        }
        if self.heap_capacity > u32::MAX as usize || self.pool_capacity > u32::MAX as usize {
            return Err("capacities must fit in 32 bits");
        }
        if self.max_call_depth == 0 {
            return Err("max_call_depth must be > 0");
        }
        if !(0.0..=1.0).contains(&self.gc_threshold) {
            return Err("gc_threshold must be between 0.0 and 1.0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let opts = ProcessOptions::default();
        assert!(opts.validate().is_ok());
        assert!(opts.gc_flags.is_empty());
    }

    #[test]
    fn invalid_options() {
        let opts = ProcessOptions {
            gc_threshold: 1.5,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
        let opts = ProcessOptions {
            max_call_depth: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn gc_flag_set() {
        let flags: GcFlags = [GcFlag::Always, GcFlag::ByHeapSize].into_iter().collect();
        assert!(flags.contains(GcFlag::Always));
        assert!(flags.contains(GcFlag::ByHeapSize));
        assert!(!flags.contains(GcFlag::ByNtvhndlPoolSize));
        assert!(!flags.without(GcFlag::Always).contains(GcFlag::Always));
    }
}
