//! # Lifecycle Manager
//!
//! One operation per work-item transition. Each operation reads what it
//! needs, stages the entity mutation, the machine recolor and the history
//! record into a single [`WriteBatch`], and commits it. The machine update in
//! that batch is guarded by the version the machine was read at, so two
//! concurrent transitions on one machine cannot both commit a color derived
//! from the same stale live set: the loser gets a conflict and the whole
//! attempt is re-run against fresh reads, up to
//! [`LifecycleConfig::max_conflict_retries`] times.
//!
//! Operations on different machines share no lock and never conflict.

mod lots;
mod machines;
mod maintenance;
mod production_orders;
mod queries;
mod work_orders;

pub use lots::LotAllocation;

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{FloorConfig, LifecycleConfig};
use crate::error::{FloorError, FloorResult};
use crate::history::{StatusHistoryRecorder, TransitionRecord};
use crate::identity::Actor;
use crate::logging::{log_error, log_retry, log_transition};
use crate::models::{Machine, RelatedIds};
use crate::sequence::SequenceAllocator;
use crate::state_machine::{ColorChange, MachineSnapshot};
use crate::store::{EntityStore, WriteBatch};

/// A recolor staged in a batch, logged once the batch commits
#[derive(Debug, Clone)]
pub(crate) struct StagedRecolor {
    pub(crate) transition: &'static str,
    pub(crate) machine: Machine,
    pub(crate) change: ColorChange,
}

pub struct LifecycleManager {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    allocator: SequenceAllocator,
    recorder: StatusHistoryRecorder,
    config: LifecycleConfig,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("backend", &self.store.backend_name())
            .field("allocator", &self.allocator)
            .field("config", &self.config)
            .finish()
    }
}

impl LifecycleManager {
    /// Manager with the default retry and numbering policy
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            allocator: SequenceAllocator::new(store.clone()),
            recorder: StatusHistoryRecorder::new(store.clone()),
            store,
            clock,
            config: LifecycleConfig::default(),
        }
    }

    pub fn from_config(
        store: Arc<dyn EntityStore>,
        clock: Arc<dyn Clock>,
        config: &FloorConfig,
    ) -> Self {
        Self {
            allocator: SequenceAllocator::with_counter(
                store.clone(),
                config.numbering.counter_key.clone(),
                config.numbering.min_width,
            ),
            recorder: StatusHistoryRecorder::new(store.clone()),
            store,
            clock,
            config: config.lifecycle,
        }
    }

    /// Manager on the system clock
    pub fn with_system_clock(store: Arc<dyn EntityStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    pub fn with_lifecycle_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn lifecycle_config(&self) -> &LifecycleConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run `attempt` until it succeeds, fails with anything other than a
    /// version conflict, or exhausts the retry budget.
    async fn with_conflict_retry<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> FloorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FloorResult<T>>,
    {
        let max_retries = self.config.max_conflict_retries;
        let mut retries = 0;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_conflict() && retries < max_retries => {
                    retries += 1;
                    log_retry(operation, retries, max_retries, &err.to_string());

                    let delay = self.config.backoff_for(retries);
                    if delay.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => {
                    let err = match err {
                        FloorError::ConflictRetryable { entity, id, .. } => {
                            FloorError::ConflictRetryable {
                                entity,
                                id,
                                attempts: retries + 1,
                            }
                        }
                        other => other,
                    };
                    report(operation, &err);
                    return Err(err);
                }
            }
        }
    }

    /// Re-derive a snapshot's color and stage the machine update plus its
    /// history record
    fn stage_recolor(
        &self,
        batch: &mut WriteBatch,
        snapshot: &mut MachineSnapshot,
        transition: &'static str,
        actor: &Actor,
        related: RelatedIds,
        now: DateTime<Utc>,
    ) -> FloorResult<StagedRecolor> {
        let change = snapshot.recolor(now);
        batch.update(&snapshot.machine)?;
        self.recorder.record(
            batch,
            &snapshot.machine.record,
            &TransitionRecord {
                transition,
                previous: change.previous,
                new: change.new,
                actor,
                related,
                at: now,
            },
        )?;
        Ok(StagedRecolor {
            transition,
            machine: snapshot.machine.record.clone(),
            change,
        })
    }

    /// Commit a batch and log the recolors it carried
    async fn commit_recolors(
        &self,
        batch: WriteBatch,
        recolors: &[StagedRecolor],
        actor: &Actor,
    ) -> FloorResult<()> {
        self.store.commit(batch).await?;
        for staged in recolors {
            log_transition(
                staged.transition,
                staged.machine.id,
                &staged.machine.code,
                staged.change.previous,
                staged.change.new,
                &actor.username,
            );
        }
        Ok(())
    }
}

/// Log a surfaced error; caller-side rejections stay at debug
fn report(operation: &str, err: &FloorError) {
    match err {
        FloorError::StoreUnavailable(_)
        | FloorError::Storage(_)
        | FloorError::AllocationError(_)
        | FloorError::ConflictRetryable { .. } => {
            log_error("lifecycle", operation, &err.to_string(), None);
        }
        _ => tracing::debug!(operation = %operation, error = %err, "operation rejected"),
    }
}

/// Reject blank required text fields
fn require_text(field: &str, value: &str) -> FloorResult<()> {
    if value.trim().is_empty() {
        Err(FloorError::invalid_input(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

fn require_positive(field: &str, value: u64) -> FloorResult<()> {
    if value == 0 {
        Err(FloorError::invalid_input(format!("{field} must be greater than zero")))
    } else {
        Ok(())
    }
}
