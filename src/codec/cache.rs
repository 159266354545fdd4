use std::sync::Arc;

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::core::DocValuesError;

/// Lazily materialized accessors, one slot per field.
///
/// The map lock is only held to find or create a field's slot; loading runs
/// inside the slot's own cell, so a slow first load of one field never stalls
/// readers of another.
pub(crate) struct FieldCache<T> {
    slots: RwLock<AHashMap<u32, Arc<OnceCell<Arc<T>>>>>,
}

impl<T> Default for FieldCache<T> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(AHashMap::new()),
        }
    }
}

impl<T> FieldCache<T> {
    /// Return the cached accessor, running `load` if this is the first
    /// request. The flag is true when this call did the loading.
    pub fn get_or_load(
        &self,
        field: u32,
        load: impl FnOnce() -> Result<T, DocValuesError>,
    ) -> Result<(Arc<T>, bool), DocValuesError> {
        let slot = self.slot(field);
        if let Some(value) = slot.get() {
            return Ok((Arc::clone(value), false));
        }
        let mut loaded = false;
        let value = slot.get_or_try_init(|| {
            loaded = true;
            load().map(Arc::new)
        })?;
        Ok((Arc::clone(value), loaded))
    }

    fn slot(&self, field: u32) -> Arc<OnceCell<Arc<T>>> {
        if let Some(slot) = self.slots.read().get(&field) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().entry(field).or_default())
    }

    /// Number of fields whose accessor has been materialized.
    pub fn loaded(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_loads_once() {
        let cache: FieldCache<String> = FieldCache::default();
        let calls = AtomicUsize::new(0);
        let load = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("value".to_string())
        };
        let (first, loaded) = cache.get_or_load(1, load).unwrap();
        assert!(loaded);
        let (second, loaded) = cache.get_or_load(1, load).unwrap();
        assert!(!loaded);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.loaded(), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let cache: FieldCache<u64> = FieldCache::default();
        let err = cache
            .get_or_load(3, || Err(DocValuesError::CorruptIndex("boom".into())))
            .unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(cache.loaded(), 0);
        let (value, _) = cache.get_or_load(3, || Ok(7)).unwrap();
        assert_eq!(*value, 7);
    }

    #[test]
    fn test_concurrent_first_load() {
        let cache: FieldCache<usize> = FieldCache::default();
        let calls = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let (v, _) = cache
                        .get_or_load(0, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(99)
                        })
                        .unwrap();
                    assert_eq!(*v, 99);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
