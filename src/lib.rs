#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, JSONB in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Floor Core
//!
//! Machine-availability state machine and order-numbering core for a
//! production floor.
//!
//! ## Overview
//!
//! The floor tracks machines, the work orders queued or running on them,
//! maintenance windows, bobbin lots split across machines, and the
//! sequentially numbered production orders ("OS") clients see.
//!
//! Two things here carry real correctness weight:
//!
//! - **Order numbering**: [`sequence::SequenceAllocator`] issues numbers from
//!   one atomic store counter, so concurrent creators never share a number.
//! - **Machine color**: a machine's color is never written as a fixed target
//!   by a transition. [`state_machine::resolve_color`] re-derives it from the
//!   machine's full live work after every transition, so finishing one order
//!   leaves a machine `Amarelo` while other orders are still queued.
//!
//! ## Module Organization
//!
//! - [`lifecycle`] - One operation per transition, atomic and retried on conflict
//! - [`state_machine`] - Status tables, machine guards and the color resolver
//! - [`sequence`] - Production order numbering
//! - [`history`] - Append-only machine status history
//! - [`store`] - Entity store interface with in-memory and PostgreSQL backends
//! - [`models`] - Floor records
//! - [`identity`] - Actors, roles and permissions
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use floor_core::identity::{Actor, Role};
//! use floor_core::lifecycle::LifecycleManager;
//! use floor_core::models::NewWorkOrder;
//! use floor_core::store::InMemoryEntityStore;
//!
//! # async fn example() -> floor_core::FloorResult<()> {
//! let manager = LifecycleManager::with_system_clock(Arc::new(InMemoryEntityStore::new()));
//! let admin = Actor::admin("admin");
//! let machine = manager.register_machine(&admin, "CD1", "16_fusos").await?;
//!
//! let order = manager
//!     .create_work_order(&admin, machine.id, NewWorkOrder {
//!         client: "Malharia Sul".into(),
//!         quantity: 12,
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let operator = Actor::new("externo", Role::ExternalOperator);
//! manager.start_work_order(&operator, order.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod identity;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod sequence;
pub mod state_machine;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigManager, ConfigurationError, FloorConfig};
pub use error::{FloorError, FloorResult};
pub use identity::{Actor, Permission, Role};
pub use lifecycle::{LifecycleManager, LotAllocation};
pub use models::MachineColor;
pub use sequence::SequenceAllocator;
pub use state_machine::resolve_color;
pub use store::{EntityStore, InMemoryEntityStore, StoreError};
