//! Bookkeeping for pooled scratch buffers.

use std::collections::HashMap;

use crate::error::FeatureError;
use crate::resource::{FilterMode, ScratchHandle, TargetDescriptor};

/// The properties a scratch buffer is pooled by.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct ScratchKey {
    /// Resolution and format.
    pub descriptor: TargetDescriptor,
    /// Sampling filter.
    pub filter: FilterMode,
}

/// Result of [`ScratchPool::acquire`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Acquired {
    /// A previously released buffer with the same key is handed out again.
    Reused(ScratchHandle),
    /// No free buffer matched: the caller must allocate storage for this handle.
    Fresh(ScratchHandle),
}

impl Acquired {
    /// The acquired handle.
    pub fn handle(self) -> ScratchHandle {
        match self {
            Acquired::Reused(h) | Acquired::Fresh(h) => h,
        }
    }
}

/// Counters describing the pool usage since its creation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScratchStats {
    /// Number of `acquire` calls.
    pub acquired: usize,
    /// Number of successful `release` calls.
    pub released: usize,
    /// Number of buffers that had to be allocated.
    pub allocated: usize,
    /// Number of free buffers dropped by [`ScratchPool::end_frame`].
    pub evicted: usize,
}

/// Tracks live and free scratch buffers.
///
/// The pool only manages handles. Devices keep the actual storage (images or textures)
/// indexed by handle, allocate it when [`Acquired::Fresh`] is returned and free it for the
/// handles returned by [`ScratchPool::end_frame`].
///
/// A released buffer is kept for reuse until the end of the frame following its release.
#[derive(Default)]
pub struct ScratchPool {
    // Free handles with the frame they were last released in.
    free: HashMap<ScratchKey, Vec<(ScratchHandle, u64)>>,
    live: HashMap<ScratchHandle, ScratchKey>,
    next: u32,
    frame: u64,
    stats: ScratchStats,
}

impl ScratchPool {
    /// Creates an empty pool.
    pub fn new() -> ScratchPool {
        ScratchPool::default()
    }

    /// Hands out a buffer matching `key`, reusing a released one when possible.
    pub fn acquire(&mut self, key: ScratchKey) -> Acquired {
        self.stats.acquired += 1;

        let reused = self
            .free
            .get_mut(&key)
            .and_then(|handles| handles.pop())
            .map(|(handle, _)| handle);
        let acquired = match reused {
            Some(handle) => {
                log::trace!("reusing scratch buffer {:?} for {:?}", handle, key);
                Acquired::Reused(handle)
            }
            None => {
                let handle = ScratchHandle(self.next);
                self.next += 1;
                self.stats.allocated += 1;
                Acquired::Fresh(handle)
            }
        };

        let _ = self.live.insert(acquired.handle(), key);
        acquired
    }

    /// Returns a buffer to the pool.
    pub fn release(&mut self, handle: ScratchHandle) -> Result<ScratchKey, FeatureError> {
        let key = self
            .live
            .remove(&handle)
            .ok_or(FeatureError::UnknownScratch(handle))?;
        self.free.entry(key).or_default().push((handle, self.frame));
        self.stats.released += 1;
        Ok(key)
    }

    /// Whether `handle` is currently acquired.
    pub fn is_live(&self, handle: ScratchHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Number of buffers acquired and not yet released.
    pub fn outstanding(&self) -> usize {
        self.live.len()
    }

    /// Number of buffers with storage, acquired or free.
    pub fn held(&self) -> usize {
        self.live.len() + self.free.values().map(Vec::len).sum::<usize>()
    }

    /// Usage counters.
    pub fn stats(&self) -> ScratchStats {
        self.stats
    }

    /// Closes the current frame.
    ///
    /// Free buffers that were not used during this frame are dropped from the pool and
    /// returned, so the caller can free their storage.
    pub fn end_frame(&mut self) -> Vec<ScratchHandle> {
        let frame = self.frame;
        let mut evicted = Vec::new();

        for handles in self.free.values_mut() {
            handles.retain(|&(handle, released)| {
                let keep = released == frame;
                if !keep {
                    evicted.push(handle);
                }
                keep
            });
        }
        self.free.retain(|_, handles| !handles.is_empty());

        if !evicted.is_empty() {
            log::trace!("evicting {} unused scratch buffer(s)", evicted.len());
        }
        self.stats.evicted += evicted.len();
        self.frame += 1;
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ColorFormat;

    fn key(width: u32, filter: FilterMode) -> ScratchKey {
        ScratchKey {
            descriptor: TargetDescriptor::new(width, 4, ColorFormat::Rgba8Unorm),
            filter,
        }
    }

    #[test]
    fn released_buffers_are_reused_for_the_same_key() {
        let mut pool = ScratchPool::new();
        let first = pool.acquire(key(8, FilterMode::Point));
        assert!(matches!(first, Acquired::Fresh(_)));
        pool.release(first.handle()).unwrap();

        let second = pool.acquire(key(8, FilterMode::Point));
        assert_eq!(second, Acquired::Reused(first.handle()));
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn different_keys_never_share_buffers() {
        let mut pool = ScratchPool::new();
        let a = pool.acquire(key(8, FilterMode::Point)).handle();
        pool.release(a).unwrap();

        let b = pool.acquire(key(8, FilterMode::Bilinear));
        assert!(matches!(b, Acquired::Fresh(_)));
        let c = pool.acquire(key(16, FilterMode::Point));
        assert!(matches!(c, Acquired::Fresh(_)));
        assert_eq!(pool.outstanding(), 2);
    }

    #[test]
    fn double_release_is_rejected() {
        let mut pool = ScratchPool::new();
        let h = pool.acquire(key(8, FilterMode::Point)).handle();
        assert!(pool.release(h).is_ok());
        assert_eq!(pool.release(h), Err(FeatureError::UnknownScratch(h)));
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn buffers_unused_for_a_frame_are_evicted() {
        let mut pool = ScratchPool::new();
        let a = pool.acquire(key(8, FilterMode::Point)).handle();
        pool.release(a).unwrap();
        assert!(pool.end_frame().is_empty());

        // Resized: the old buffer is not reused this frame.
        let b = pool.acquire(key(16, FilterMode::Point)).handle();
        pool.release(b).unwrap();
        assert_eq!(pool.end_frame(), vec![a]);
        assert_eq!(pool.held(), 1);

        // Buffers reused every frame stay.
        let c = pool.acquire(key(16, FilterMode::Point));
        assert_eq!(c, Acquired::Reused(b));
        pool.release(b).unwrap();
        assert!(pool.end_frame().is_empty());
        assert_eq!(pool.stats().evicted, 1);
    }

    #[test]
    fn live_buffers_are_never_evicted() {
        let mut pool = ScratchPool::new();
        let a = pool.acquire(key(8, FilterMode::Point)).handle();
        assert!(pool.end_frame().is_empty());
        assert!(pool.end_frame().is_empty());
        assert!(pool.is_live(a));
        assert_eq!(pool.held(), 1);
    }
}
