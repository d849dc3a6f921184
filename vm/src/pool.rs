use object::{NativeKey, NativeValue};

use crate::{VmError, VmResult};

/// Fixed-capacity arena of native value handles.
///
/// Erased slots are reused; the pool never grows past its capacity.
#[derive(Debug)]
pub struct NativeTypesPool {
    slots: Vec<Option<NativeValue>>,
    free: Vec<u32>,
    capacity: usize,
    len: usize,
}

impl NativeTypesPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores a default handle.
    pub fn create(&mut self) -> VmResult<NativeKey> {
        self.create_with(NativeValue::default())
    }

    pub fn create_with(&mut self, value: NativeValue) -> VmResult<NativeKey> {
        if self.len >= self.capacity {
            return Err(VmError::NativeTypeHandleInsertionError {
                capacity: self.capacity,
            });
        }
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(value);
                index
            }
            None => {
                self.slots.push(Some(value));
                (self.slots.len() - 1) as u32
            }
        };
        self.len += 1;
        Ok(NativeKey::new(index))
    }

    pub fn contains(&self, key: NativeKey) -> bool {
        matches!(self.slots.get(key.index()), Some(Some(_)))
    }

    pub fn at(&self, key: NativeKey) -> VmResult<&NativeValue> {
        self.slots
            .get(key.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| VmError::NativeTypeHandleNotFound(key.to_string()))
    }

    pub fn at_mut(&mut self, key: NativeKey) -> VmResult<&mut NativeValue> {
        self.slots
            .get_mut(key.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| VmError::NativeTypeHandleNotFound(key.to_string()))
    }

    pub fn erase(&mut self, key: NativeKey) -> VmResult<NativeValue> {
        let value = self
            .slots
            .get_mut(key.index())
            .and_then(Option::take)
            .ok_or_else(|| VmError::NativeTypeHandleNotFound(key.to_string()))?;
        self.free.push(key.index() as u32);
        self.len -= 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_and_reuse() {
        const K: usize = 4;
        let mut pool = NativeTypesPool::new(K);
        let keys: Vec<_> = (0..K).map(|_| pool.create().unwrap()).collect();
        assert!(matches!(
            pool.create(),
            Err(VmError::NativeTypeHandleInsertionError { capacity: K })
        ));
        for key in &keys {
            pool.erase(*key).unwrap();
        }
        assert!(pool.is_empty());
        for _ in 0..K {
            pool.create().unwrap();
        }
        assert_eq!(pool.len(), K);
        assert!(pool.create().is_err());
    }

    #[test]
    fn access_and_erase() {
        let mut pool = NativeTypesPool::new(2);
        let key = pool.create_with(NativeValue::Str("a".into())).unwrap();
        pool.at_mut(key).unwrap().as_string_mut("test").unwrap().push('b');
        assert_eq!(pool.at(key).unwrap(), &NativeValue::Str("ab".into()));
        assert_eq!(pool.erase(key).unwrap(), NativeValue::Str("ab".into()));
        assert!(!pool.contains(key));
        assert!(matches!(pool.at(key), Err(VmError::NativeTypeHandleNotFound(_))));
        assert!(pool.erase(key).is_err());
    }
}
