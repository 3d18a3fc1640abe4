use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::utils::time::get_now_as_millis;
use crate::EngineKind;
use crate::GraphEngine;

/// Registry wrapper around one engine: the kind tag, the exclusive-use flag
/// and the idle-timeout bookkeeping.
///
/// The `tokio::sync::Mutex` is the exclusive flag itself: acquisition goes
/// through `try_lock`, so a contended caller is rejected immediately instead
/// of queued. The engine sits behind an `Arc` shared only between the map and
/// the single in-flight guard; whichever drops last frees the engine, which
/// makes removal of the entry and destruction of the engine atomic for
/// external observers.
pub(crate) struct EngineEntry {
    kind: EngineKind,
    engine: Arc<Mutex<Box<dyn GraphEngine>>>,
    last_touched: Arc<AtomicU64>,
}

impl EngineEntry {
    pub(crate) fn new(
        kind: EngineKind,
        engine: Box<dyn GraphEngine>,
    ) -> Self {
        Self {
            kind,
            engine: Arc::new(Mutex::new(engine)),
            last_touched: Arc::new(AtomicU64::new(get_now_as_millis())),
        }
    }

    pub(crate) fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Attempts to take exclusive use of the engine. Fails fast when another
    /// in-flight call holds it.
    pub(crate) fn try_acquire(&self) -> Option<OwnedMutexGuard<Box<dyn GraphEngine>>> {
        self.engine.clone().try_lock_owned().ok()
    }

    /// An entry is free when no in-flight call holds the exclusive flag.
    ///
    /// The probe briefly takes and releases the lock, so the answer only
    /// stays true while the caller holds the map shard lock across it.
    pub(crate) fn is_free(&self) -> bool {
        self.engine.try_lock().is_ok()
    }

    /// Millisecond timestamp of the last held→free transition.
    pub(crate) fn last_touched(&self) -> u64 {
        self.last_touched.load(Ordering::Acquire)
    }

    /// Shared handle used to refresh `last_touched` once the map reference
    /// has been released.
    pub(crate) fn touch_handle(&self) -> Arc<AtomicU64> {
        self.last_touched.clone()
    }

    #[cfg(test)]
    pub(crate) fn backdate(
        &self,
        by_millis: u64,
    ) {
        let aged = self.last_touched().saturating_sub(by_millis);
        self.last_touched.store(aged, Ordering::Release);
    }
}
