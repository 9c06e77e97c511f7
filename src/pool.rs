use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

use crate::error::SpawnError;

/// Fixed-capacity pool of opaque slots shared by the spawner and its tasks.
///
/// Cloning is cheap; every clone refers to the same pool.
#[derive(Clone, Debug)]
pub struct SlotPool {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    sem: Arc<Semaphore>,
    capacity: usize,
    admitted: AtomicU64,
    released: AtomicU64,
    peak: AtomicUsize,
}

/// One outstanding slot. Returned to the pool on `release` or drop.
#[derive(Debug)]
pub struct Slot {
    permit: Option<OwnedSemaphorePermit>,
    pool: Arc<Inner>,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        let inner = Inner {
            sem: Arc::new(Semaphore::new(capacity)),
            capacity,
            admitted: AtomicU64::new(0),
            released: AtomicU64::new(0),
            peak: AtomicUsize::new(0),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Take one slot, waiting while all `capacity` slots are outstanding.
    pub async fn acquire(&self) -> Result<Slot, SpawnError> {
        let permit = Arc::clone(&self.inner.sem)
            .acquire_owned()
            .await
            .map_err(|_| SpawnError::PoolClosed)?;

        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
        self.inner.peak.fetch_max(self.in_flight(), Ordering::Relaxed);

        Ok(Slot {
            permit: Some(permit),
            pool: Arc::clone(&self.inner),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Slots acquired and not yet released.
    pub fn in_flight(&self) -> usize {
        self.inner.capacity - self.inner.sem.available_permits()
    }

    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    pub fn released(&self) -> u64 {
        self.inner.released.load(Ordering::Relaxed)
    }

    /// Highest in-flight count observed at acquisition time.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::Relaxed)
    }

    /// Stop handing out slots. Pending and future acquisitions fail;
    /// outstanding slots can still be released.
    pub fn close(&self) {
        self.inner.sem.close();
    }
}

impl Slot {
    pub fn release(mut self) {
        self.give_back();
    }

    fn give_back(&mut self) {
        if let Some(permit) = self.permit.take() {
            drop(permit);
            let released = self.pool.released.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(released, "slot released");
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.give_back();
    }
}
