//! Dynamic-object heap.
//!
//! Objects live in a fixed-capacity arena addressed by generational
//! [`ObjectId`]s. A slot's generation is bumped whenever its object is
//! collected, so ids held by a frame after collection fail lookup with
//! [`HeapError::ObjectNotFound`] instead of aliasing a newer object.
//!
//! Collection is mark/sweep driven by:
//! - a [`RootProvider`] supplying live roots and the object ids held inside
//!   native handles,
//! - every object flagged [`ObjectFlags::NON_GC`],
//! - attribute edges between objects.

use object::{DynamicObject, NativeKey, ObjectFlags, ObjectId};

use crate::{HeapError, HeapResult};

// ── Public API types ──────────────────────────────────────────────────

/// Supplies the roots of one collection cycle.
pub trait RootProvider {
    fn visit_roots(&self, visitor: &mut dyn FnMut(ObjectId));

    /// Object ids referenced by the native handle stored under `key`.
    fn visit_native_edges(&self, key: NativeKey, visitor: &mut dyn FnMut(ObjectId));
}

/// Outcome of one collection cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GcStats {
    pub marked: usize,
    pub collected: usize,
    /// Native handle keys owned by collected objects; the caller erases them.
    pub orphaned_keys: Vec<NativeKey>,
}

// ── Heap settings ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HeapSettings {
    /// Maximum number of live objects.
    pub capacity: usize,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            capacity: 1 << 20, // 1 Mi objects
        }
    }
}

impl HeapSettings {
    #[inline]
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.capacity == 0 {
            return Err("capacity must be > 0");
        }
        if self.capacity > u32::MAX as usize {
            return Err("capacity does not fit an object index");
        }
        Ok(())
    }
}

// ── Heap ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Entry {
    generation: u32,
    object: Option<DynamicObject>,
}

#[derive(Debug)]
pub struct Heap {
    settings: HeapSettings,
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
}

impl Heap {
    /// # Panics
    ///
    /// Panics if `settings` fail validation.
    #[must_use]
    pub fn new(settings: HeapSettings) -> Self {
        if let Err(msg) = settings.validate() {
            panic!("invalid heap settings: {msg}");
        }
        Self {
            settings,
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.settings.capacity
    }

    pub fn create_dyobj(&mut self) -> HeapResult<ObjectId> {
        if self.live >= self.settings.capacity {
            return Err(HeapError::Exhausted {
                capacity: self.settings.capacity,
            });
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.entries.push(Entry::default());
                (self.entries.len() - 1) as u32
            }
        };
        let entry = &mut self.entries[index as usize];
        entry.object = Some(DynamicObject::new());
        self.live += 1;
        Ok(ObjectId::new(index, entry.generation))
    }

    /// Creates `n` objects, or none when fewer than `n` slots remain.
    pub fn create_dyobjs(&mut self, n: usize) -> HeapResult<Vec<ObjectId>> {
        if self.settings.capacity - self.live < n {
            return Err(HeapError::Exhausted {
                capacity: self.settings.capacity,
            });
        }
        (0..n).map(|_| self.create_dyobj()).collect()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entry(id).is_some()
    }

    fn entry(&self, id: ObjectId) -> Option<&Entry> {
        self.entries
            .get(id.index() as usize)
            .filter(|e| e.generation == id.generation() && e.object.is_some())
    }

    pub fn get_dyobj(&self, id: ObjectId) -> HeapResult<&DynamicObject> {
        self.entry(id)
            .and_then(|e| e.object.as_ref())
            .ok_or(HeapError::ObjectNotFound(id))
    }

    pub fn get_dyobj_mut(&mut self, id: ObjectId) -> HeapResult<&mut DynamicObject> {
        self.entries
            .get_mut(id.index() as usize)
            .filter(|e| e.generation == id.generation())
            .and_then(|e| e.object.as_mut())
            .ok_or(HeapError::ObjectNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &DynamicObject)> + '_ {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            e.object
                .as_ref()
                .map(|o| (ObjectId::new(i as u32, e.generation), o))
        })
    }

    // ── Collection ────────────────────────────────────────────────────

    pub fn gc(&mut self, roots: &dyn RootProvider) -> GcStats {
        let mut marks = vec![false; self.entries.len()];
        let mut work: Vec<ObjectId> = Vec::new();

        roots.visit_roots(&mut |id| work.push(id));
        work.extend(
            self.iter()
                .filter(|(_, o)| o.get_flag(ObjectFlags::NON_GC))
                .map(|(id, _)| id),
        );

        let mut stats = GcStats::default();
        while let Some(id) = work.pop() {
            let Some(object) = self.entry(id).and_then(|e| e.object.as_ref()) else {
                continue;
            };
            let mark = &mut marks[id.index() as usize];
            if *mark {
                continue;
            }
            *mark = true;
            stats.marked += 1;

            work.extend(object.attrs().map(|(_, v)| v));
            if let Some(key) = object.ntvhndl_key() {
                roots.visit_native_edges(key, &mut |child| work.push(child));
            }
        }

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if marks[index] || entry.object.is_none() {
                continue;
            }
            if let Some(object) = entry.object.take() {
                log::trace!("gc: collected @{}:{}", index, entry.generation);
                stats.orphaned_keys.extend(object.ntvhndl_key());
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(index as u32);
                self.live -= 1;
                stats.collected += 1;
            }
        }
        stats
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapSettings::default())
    }
}
