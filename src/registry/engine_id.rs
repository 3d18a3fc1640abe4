use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::Rng;

use crate::Error;
use crate::Result;

/// Opaque handle a coordinator uses to refer to a previously created engine
/// across independent request/response cycles.
pub type EngineId = u64;

/// Monotonic identifier source for engine handles.
///
/// The counter starts from a random offset so handles are not guessable and
/// do not restart at the same point after a node restart. An identifier is
/// never reused while an outstanding client reference could still be alive:
/// a stale client must get `NotFound`, never a newer unrelated engine.
pub struct EngineIdGenerator {
    next_id: AtomicU64,
}

impl EngineIdGenerator {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let offset: u32 = rng.gen_range(1..u32::MAX);
        Self {
            next_id: AtomicU64::new(offset as u64),
        }
    }

    /// Returns a fresh identifier distinct from every identifier this
    /// process handed out before.
    ///
    /// Exhausting the 64-bit space is a capacity bug, not a per-call
    /// condition, and fails with [`Error::Fatal`].
    pub fn next(&self) -> Result<EngineId> {
        let id = self.next_id.fetch_add(1, Ordering::AcqRel);
        if id == u64::MAX {
            // Pin the counter so a wrapped value can never be handed out.
            self.next_id.store(u64::MAX, Ordering::Release);
            return Err(Error::Fatal("engine identifier space exhausted".to_string()));
        }
        Ok(id)
    }

    #[cfg(test)]
    pub(crate) fn starting_at(start: u64) -> Self {
        Self {
            next_id: AtomicU64::new(start),
        }
    }
}

impl Default for EngineIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
