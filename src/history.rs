//! # Status History Recorder
//!
//! Builds the append-only record for each committed machine transition. The
//! record is staged into the same [`WriteBatch`] as the entity mutation and
//! the recolor, so a failed history write rolls back the whole transition.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::store::{FIELD_CHANGED_AT, FIELD_MACHINE_ID};
use crate::error::FloorResult;
use crate::identity::Actor;
use crate::models::{Machine, MachineColor, RelatedIds, StatusHistoryRecord};
use crate::store::{fetch_many, EntityStore, Filter, SortBy, Versioned, WriteBatch};

/// Everything a history record needs besides the machine itself
#[derive(Debug, Clone, Copy)]
pub struct TransitionRecord<'a> {
    pub transition: &'a str,
    pub previous: MachineColor,
    pub new: MachineColor,
    pub actor: &'a Actor,
    pub related: RelatedIds,
    pub at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct StatusHistoryRecorder {
    store: Arc<dyn EntityStore>,
}

impl std::fmt::Debug for StatusHistoryRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusHistoryRecorder")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl StatusHistoryRecorder {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn build(machine: &Machine, transition: &TransitionRecord<'_>) -> StatusHistoryRecord {
        StatusHistoryRecord {
            id: Uuid::new_v4(),
            machine_id: machine.id,
            machine_code: machine.code.clone(),
            layout_group: machine.layout_group.clone(),
            previous_color: transition.previous,
            new_color: transition.new,
            transition: transition.transition.to_string(),
            changed_by: transition.actor.username.clone(),
            changed_at: transition.at,
            related_work_order_id: transition.related.work_order_id,
            related_maintenance_id: transition.related.maintenance_id,
            related_lot_id: transition.related.lot_id,
        }
    }

    /// Stage a history insert into `batch`
    pub fn record(
        &self,
        batch: &mut WriteBatch,
        machine: &Machine,
        transition: &TransitionRecord<'_>,
    ) -> FloorResult<StatusHistoryRecord> {
        let record = Self::build(machine, transition);
        batch.insert(&record)?;
        Ok(record)
    }

    /// History of one machine, oldest first
    pub async fn list_history(&self, machine_id: Uuid) -> FloorResult<Vec<StatusHistoryRecord>> {
        let records = fetch_many::<StatusHistoryRecord>(
            self.store.as_ref(),
            &Filter::new().eq(FIELD_MACHINE_ID, machine_id.to_string()),
            Some(&SortBy::ascending(FIELD_CHANGED_AT)),
        )
        .await?;
        Ok(records.into_iter().map(Versioned::into_inner).collect())
    }
}
