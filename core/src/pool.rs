//! Concurrency-safe reusable-object pool for ammo slots

use crossbeam_queue::ArrayQueue;

use crate::ammo::Ammo;

/// Fixed-capacity free-list of pooled ammo slots.
///
/// Amortizes allocation of ammo wrappers across the pipeline's lifetime:
/// [`get`](AmmoPool::get) pops a recycled slot or allocates a fresh one when
/// the free-list is empty, so the decode loop never blocks on the pool;
/// [`put`](AmmoPool::put) parks a slot again, dropping it when the free-list
/// is already full. Both paths are lock-free and safe for concurrent use
/// from any number of tasks.
#[derive(Debug)]
pub struct AmmoPool<P> {
    slots: ArrayQueue<Box<Ammo<P>>>,
}

impl<P> AmmoPool<P> {
    /// Create a pool that parks at most `capacity` idle slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: ArrayQueue::new(capacity),
        }
    }

    /// Obtain a slot, recycling a parked one when available.
    pub fn get(&self) -> Box<Ammo<P>> {
        self.slots.pop().unwrap_or_default()
    }

    /// Park a slot for reuse. Overflow beyond capacity is simply dropped.
    pub fn put(&self, slot: Box<Ammo<P>>) {
        let _ = self.slots.push(slot);
    }

    /// Number of slots currently parked.
    pub fn idle(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of parked slots.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}
