//! Error types for the floor core.
//!
//! [`FloorError`] is the taxonomy every lifecycle operation surfaces to its
//! caller. Store-level faults arrive as [`StoreError`] and are folded in
//! through `From`, so `?` works across the boundary.

use thiserror::Error;
use uuid::Uuid;

use crate::identity::{Permission, Role};
use crate::models::MachineColor;
use crate::store::{Collection, StoreError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FloorError {
    /// Referenced machine, order, maintenance window or lot is absent
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// Status precondition unmet for the requested event
    #[error("Invalid transition for {entity} {id}: cannot {event} from {from}")]
    InvalidTransition {
        entity: &'static str,
        id: Uuid,
        from: String,
        event: &'static str,
    },

    /// Machine color precondition unmet
    #[error("Machine {machine_id} unavailable ({color}): {reason}")]
    MachineUnavailable {
        machine_id: Uuid,
        color: MachineColor,
        reason: String,
    },

    /// Counter store unreachable or returned a non-monotonic value
    #[error("Order number allocation failed: {0}")]
    AllocationError(String),

    /// Optimistic-concurrency collision that outlived the retry budget
    #[error("Concurrent update on {entity} {id} persisted after {attempts} attempt(s)")]
    ConflictRetryable {
        entity: &'static str,
        id: Uuid,
        attempts: u32,
    },

    #[error("Entity store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("{actor} ({role}) is not permitted to {permission}")]
    Forbidden {
        actor: String,
        role: Role,
        permission: Permission,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl FloorError {
    pub fn not_found(collection: Collection, id: Uuid) -> Self {
        Self::NotFound {
            entity: collection.entity_name(),
            id,
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn machine_unavailable(
        machine_id: Uuid,
        color: MachineColor,
        reason: impl Into<String>,
    ) -> Self {
        Self::MachineUnavailable {
            machine_id,
            color,
            reason: reason.into(),
        }
    }

    /// True for the optimistic-concurrency collision the lifecycle manager retries
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConflictRetryable { .. })
    }
}

impl From<StoreError> for FloorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => FloorError::StoreUnavailable(msg),
            StoreError::NotFound { collection, id } => FloorError::not_found(collection, id),
            StoreError::Conflict { collection, id, .. } => FloorError::ConflictRetryable {
                entity: collection.entity_name(),
                id,
                attempts: 1,
            },
            other => FloorError::Storage(other.to_string()),
        }
    }
}

pub type FloorResult<T> = std::result::Result<T, FloorError>;
