mod error;
mod heap;

pub use error::{HeapError, HeapResult};
pub use heap::*;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use object::{NativeKey, ObjectFlags, ObjectId, attr_key};

    use super::*;

    #[derive(Default)]
    struct Roots {
        roots: Vec<ObjectId>,
        native: HashMap<NativeKey, Vec<ObjectId>>,
    }

    impl RootProvider for Roots {
        fn visit_roots(&self, visitor: &mut dyn FnMut(ObjectId)) {
            self.roots.iter().copied().for_each(visitor);
        }

        fn visit_native_edges(&self, key: NativeKey, visitor: &mut dyn FnMut(ObjectId)) {
            if let Some(ids) = self.native.get(&key) {
                ids.iter().copied().for_each(visitor);
            }
        }
    }

    fn small_heap(capacity: usize) -> Heap {
        Heap::new(HeapSettings { capacity })
    }

    #[test]
    fn settings_validation() {
        assert!(HeapSettings::default().validate().is_ok());
        assert!(HeapSettings { capacity: 0 }.validate().is_err());
    }

    #[test]
    fn create_until_exhausted() {
        let mut heap = small_heap(2);
        heap.create_dyobj().unwrap();
        heap.create_dyobj().unwrap();
        assert_eq!(
            heap.create_dyobj().unwrap_err(),
            HeapError::Exhausted { capacity: 2 }
        );
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn create_many_is_all_or_nothing() {
        let mut heap = small_heap(3);
        assert!(heap.create_dyobjs(4).is_err());
        assert!(heap.is_empty());
        let ids = heap.create_dyobjs(3).unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|&id| heap.contains(id)));
    }

    #[test]
    fn unreachable_objects_are_collected() {
        let mut heap = small_heap(8);
        let live = heap.create_dyobj().unwrap();
        let dead = heap.create_dyobj().unwrap();
        let roots = Roots {
            roots: vec![live],
            ..Default::default()
        };
        let stats = heap.gc(&roots);
        assert_eq!(stats.marked, 1);
        assert_eq!(stats.collected, 1);
        assert!(heap.contains(live));
        assert!(!heap.contains(dead));
        assert_eq!(heap.get_dyobj(dead).unwrap_err(), HeapError::ObjectNotFound(dead));
    }

    #[test]
    fn stale_ids_do_not_alias_reused_slots() {
        let mut heap = small_heap(1);
        let old = heap.create_dyobj().unwrap();
        heap.gc(&Roots::default());
        let new = heap.create_dyobj().unwrap();
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(heap.get_dyobj(old).is_err());
        assert!(heap.get_dyobj(new).is_ok());
    }

    #[test]
    fn attributes_native_edges_and_flags_keep_objects_alive() {
        let mut heap = small_heap(8);
        let root = heap.create_dyobj().unwrap();
        let attr = heap.create_dyobj().unwrap();
        let element = heap.create_dyobj().unwrap();
        let pinned = heap.create_dyobj().unwrap();
        let garbage = heap.create_dyobj().unwrap();

        heap.get_dyobj_mut(root).unwrap().putattr(attr_key("a"), attr);
        heap.get_dyobj_mut(attr).unwrap().set_ntvhndl_key(NativeKey::new(0));
        heap.get_dyobj_mut(pinned).unwrap().set_flag(ObjectFlags::NON_GC);
        heap.get_dyobj_mut(garbage).unwrap().set_ntvhndl_key(NativeKey::new(1));

        let roots = Roots {
            roots: vec![root],
            native: HashMap::from([(NativeKey::new(0), vec![element])]),
        };
        let stats = heap.gc(&roots);
        assert_eq!(stats.marked, 4);
        assert_eq!(stats.collected, 1);
        assert_eq!(stats.orphaned_keys, vec![NativeKey::new(1)]);
        for id in [root, attr, element, pinned] {
            assert!(heap.contains(id));
        }
    }

    #[test]
    fn cycles_are_collected() {
        let mut heap = small_heap(4);
        let a = heap.create_dyobj().unwrap();
        let b = heap.create_dyobj().unwrap();
        heap.get_dyobj_mut(a).unwrap().putattr(attr_key("b"), b);
        heap.get_dyobj_mut(b).unwrap().putattr(attr_key("a"), a);
        let stats = heap.gc(&Roots::default());
        assert_eq!(stats.collected, 2);
        assert!(heap.is_empty());
    }
}
