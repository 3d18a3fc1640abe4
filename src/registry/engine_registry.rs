//! The per-node mapping from engine identifier to engine entry, as the single
//! source of truth for engine lifetime.
//!
//! Two locking tiers bound cross-engine contention to the cost of a map
//! operation:
//! - the map's shard locks protect insert/remove/lookup only and are never
//!   held across an engine step;
//! - each entry's exclusive flag is held for exactly one step call, and is
//!   acquired while the shard lock is still held, which closes the race
//!   between a lookup and a concurrent destroy.
//!
//! A contended call fails immediately with `EngineBusy` rather than queuing:
//! callers are independent stateless requests that may retry, and blocking
//! request workers on remote computation risks pool exhaustion.

use std::fmt::Debug;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use autometrics::autometrics;
use dashmap::DashMap;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::EngineEntry;
use crate::metrics::ACTIVE_ENGINES_METRIC;
use crate::metrics::ENGINES_CREATED_METRIC;
use crate::metrics::ENGINES_DESTROYED_METRIC;
use crate::metrics::ENGINE_BUSY_REJECTIONS_METRIC;
use crate::metrics::ENGINE_STEP_DURATION_METRIC;
use crate::utils::time::get_now_as_millis;
use crate::EngineFactory;
use crate::EngineId;
use crate::EngineIdGenerator;
use crate::EngineKind;
use crate::RegistryConfig;
use crate::RegistryError;
use crate::Result;
use crate::API_SLO;

pub struct EngineRegistry {
    engines: DashMap<EngineId, EngineEntry>,
    factory: Arc<dyn EngineFactory>,
    id_gen: EngineIdGenerator,
    // Reserved slots: counts engines still being built as well as live
    // entries, so concurrent creates cannot overshoot max_engines.
    active: AtomicUsize,
    max_engines: usize,
}

impl Debug for EngineRegistry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engines.len())
            .field("max_engines", &self.max_engines)
            .finish()
    }
}

impl EngineRegistry {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            engines: DashMap::new(),
            factory,
            id_gen: EngineIdGenerator::new(),
            active: AtomicUsize::new(0),
            max_engines: config.max_engines,
        }
    }

    /// Builds an engine of the requested kind from a coordinator's serialized
    /// plan and registers it in free state.
    ///
    /// Fails with `InvalidPlan` when the factory rejects the plan and with
    /// `ResourceExhausted` at the configured engine limit; neither failure
    /// inserts anything.
    #[autometrics(objective = API_SLO)]
    pub async fn create(
        &self,
        kind: EngineKind,
        plan: Vec<u8>,
    ) -> Result<EngineId> {
        self.reserve_slot()?;

        let engine = match self.factory.build(kind, plan).await {
            Ok(engine) => engine,
            Err(e) => {
                self.release_slot();
                warn!(kind = kind.as_str(), "engine build rejected: {}", e);
                return Err(RegistryError::InvalidPlan { source: e }.into());
            }
        };

        let engine_id = match self.id_gen.next() {
            Ok(id) => id,
            Err(e) => {
                self.release_slot();
                return Err(e);
            }
        };

        self.engines.insert(engine_id, EngineEntry::new(kind, engine));
        ENGINES_CREATED_METRIC.with_label_values(&[kind.as_str()]).inc();
        ACTIVE_ENGINES_METRIC.set(self.engines.len() as i64);
        debug!(engine_id, kind = kind.as_str(), "engine registered");
        Ok(engine_id)
    }

    /// Runs one step on the engine behind `engine_id`, holding its exclusive
    /// flag for the duration of the call and nothing longer.
    ///
    /// The kind check happens before the flag is touched; a contended entry
    /// fails immediately with `EngineBusy`. Step errors propagate as
    /// `ExecutionFailed` while the entry stays registered and free: a failed
    /// step does not make the engine unusable, and destruction remains an
    /// explicit caller decision.
    #[autometrics(objective = API_SLO)]
    pub async fn execute(
        &self,
        engine_id: EngineId,
        kind: EngineKind,
        request: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let (mut engine, last_touched) = {
            let entry = self
                .engines
                .get(&engine_id)
                .ok_or(RegistryError::NotFound { engine_id })?;

            if entry.kind() != kind {
                return Err(RegistryError::TypeMismatch {
                    engine_id,
                    requested: kind,
                    actual: entry.kind(),
                }
                .into());
            }

            // The exclusive flag is taken while the shard lock is still
            // held, so a concurrent destroy cannot slip between lookup and
            // acquisition.
            match entry.try_acquire() {
                Some(guard) => (guard, entry.touch_handle()),
                None => {
                    ENGINE_BUSY_REJECTIONS_METRIC.inc();
                    trace!(engine_id, "execute rejected: engine in use");
                    return Err(RegistryError::EngineBusy { engine_id }.into());
                }
            }
        };

        // Shard lock released above: a slow step never blocks the map.
        let started = Instant::now();
        let outcome = engine.step(request).await;

        // Unlock bookkeeping is unconditional, success or failure. The
        // timestamp refresh happens before the flag is released so the sweep
        // can never observe a free entry with a stale timestamp.
        last_touched.store(get_now_as_millis(), Ordering::Release);
        drop(engine);

        ENGINE_STEP_DURATION_METRIC
            .with_label_values(&[kind.as_str()])
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        outcome.map_err(|e| {
            RegistryError::ExecutionFailed {
                engine_id,
                source: Box::new(e),
            }
            .into()
        })
    }

    /// Removes the entry and releases its engine, provided no call is in
    /// flight.
    ///
    /// Fails with `EngineBusy` against a held entry and `NotFound` once the
    /// entry is gone; callers treat the second destroy's `NotFound` as
    /// already-done.
    #[autometrics(objective = API_SLO)]
    pub fn destroy(
        &self,
        engine_id: EngineId,
    ) -> Result<()> {
        // The free-probe runs under the shard write lock, so an engine
        // mid-step cannot be destroyed out from under its caller.
        if self
            .engines
            .remove_if(&engine_id, |_, entry| entry.is_free())
            .is_some()
        {
            self.release_slot();
            ENGINES_DESTROYED_METRIC.with_label_values(&["explicit"]).inc();
            ACTIVE_ENGINES_METRIC.set(self.engines.len() as i64);
            debug!(engine_id, "engine destroyed");
            return Ok(());
        }

        if self.engines.contains_key(&engine_id) {
            Err(RegistryError::EngineBusy { engine_id }.into())
        } else {
            Err(RegistryError::NotFound { engine_id }.into())
        }
    }

    /// Destroys every free entry whose last use is older than `idle_timeout`.
    ///
    /// Identifiers are snapshotted first so no lock spans the scan; each
    /// candidate is then removed only if it is still free and still idle,
    /// tolerating entries that became active in between. A held entry is
    /// never reclaimed regardless of age.
    pub fn sweep_expired(
        &self,
        idle_timeout: Duration,
    ) -> usize {
        let deadline = get_now_as_millis().saturating_sub(idle_timeout.as_millis() as u64);

        let candidates: Vec<EngineId> = self
            .engines
            .iter()
            .filter(|entry| entry.last_touched() < deadline)
            .map(|entry| *entry.key())
            .collect();

        let mut reclaimed = 0;
        for engine_id in candidates {
            let removed = self.engines.remove_if(&engine_id, |_, entry| {
                entry.is_free() && entry.last_touched() < deadline
            });
            if removed.is_some() {
                self.release_slot();
                ENGINES_DESTROYED_METRIC.with_label_values(&["idle_sweep"]).inc();
                reclaimed += 1;
                warn!(engine_id, "abandoned engine reclaimed");
            } else {
                trace!(engine_id, "sweep skipped: engine busy or touched again");
            }
        }

        if reclaimed > 0 {
            ACTIVE_ENGINES_METRIC.set(self.engines.len() as i64);
        }
        reclaimed
    }

    /// Destroys all free entries. Invoked when the owning node, or an
    /// enclosing context that created the engines, is torn down.
    pub fn drain(&self) -> usize {
        let ids: Vec<EngineId> = self.engines.iter().map(|entry| *entry.key()).collect();

        let mut dropped = 0;
        for engine_id in ids {
            if self
                .engines
                .remove_if(&engine_id, |_, entry| entry.is_free())
                .is_some()
            {
                self.release_slot();
                ENGINES_DESTROYED_METRIC.with_label_values(&["drain"]).inc();
                dropped += 1;
            }
        }

        if !self.engines.is_empty() {
            warn!(remaining = self.engines.len(), "engines still in use at drain");
        }
        ACTIVE_ENGINES_METRIC.set(self.engines.len() as i64);
        dropped
    }

    pub fn contains(
        &self,
        engine_id: EngineId,
    ) -> bool {
        self.engines.contains_key(&engine_id)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    fn reserve_slot(&self) -> Result<()> {
        let max = self.max_engines;
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| RegistryError::ResourceExhausted { max }.into())
    }

    fn release_slot(&self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }

    #[cfg(test)]
    pub(crate) fn backdate(
        &self,
        engine_id: EngineId,
        by_millis: u64,
    ) {
        if let Some(entry) = self.engines.get(&engine_id) {
            entry.backdate(by_millis);
        }
    }
}
