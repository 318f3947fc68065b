#![allow(dead_code)] // Each integration test binary uses a different slice of the harness

pub mod builders;
pub mod fault_store;
pub mod strategies;

pub use builders::*;
pub use fault_store::*;

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use floor_core::clock::{Clock, ManualClock};
use floor_core::config::LifecycleConfig;
use floor_core::identity::{Actor, Role};
use floor_core::lifecycle::LifecycleManager;
use floor_core::models::{Machine, MachineColor};
use floor_core::store::{EntityStore, InMemoryEntityStore};

/// A floor over one store with a manual clock and one actor per role
pub struct TestFloor {
    pub store: Arc<dyn EntityStore>,
    pub clock: Arc<ManualClock>,
    pub manager: Arc<LifecycleManager>,
    pub admin: Actor,
    pub internal: Actor,
    pub external: Actor,
}

impl TestFloor {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryEntityStore::new()))
    }

    pub fn with_store(store: Arc<dyn EntityStore>) -> Self {
        Self::with_store_and_retries(store, LifecycleConfig::default())
    }

    pub fn with_store_and_retries(store: Arc<dyn EntityStore>, config: LifecycleConfig) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 3, 6, 0, 0).unwrap(),
        ));
        let manager =
            LifecycleManager::new(store.clone(), clock.clone()).with_lifecycle_config(config);
        Self {
            store,
            clock,
            manager: Arc::new(manager),
            admin: Actor::admin("admin"),
            internal: Actor::new("interno", Role::InternalOperator),
            external: Actor::new("externo", Role::ExternalOperator),
        }
    }

    /// Register a machine in the 16-spindle group
    pub async fn machine(&self, code: &str) -> Machine {
        self.manager
            .register_machine(&self.admin, code, "16_fusos")
            .await
            .expect("register machine")
    }

    pub async fn color(&self, machine: &Machine) -> MachineColor {
        self.manager
            .get_machine(machine.id)
            .await
            .expect("machine exists")
            .color
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Advance the clock one minute so timestamps order strictly
    pub fn tick(&self) {
        self.clock.advance(Duration::minutes(1));
    }
}

/// Retry policy generous enough that `n` contenders on one machine always
/// finish: each lost attempt means another contender committed.
pub fn retries_for_contenders(n: u32) -> LifecycleConfig {
    LifecycleConfig {
        max_conflict_retries: n + 2,
        retry_backoff_ms: 0,
    }
}
