//! # Status History Model
//!
//! Append-only audit trail of machine color transitions. Records are never
//! updated once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MachineColor;
use crate::store::{Collection, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryRecord {
    pub id: Uuid,
    pub machine_id: Uuid,
    pub machine_code: String,
    pub layout_group: String,
    pub previous_color: MachineColor,
    pub new_color: MachineColor,
    /// Transition name, see [`crate::constants::transitions`]
    pub transition: String,
    pub changed_by: String,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub changed_at: DateTime<Utc>,
    pub related_work_order_id: Option<Uuid>,
    pub related_maintenance_id: Option<Uuid>,
    pub related_lot_id: Option<Uuid>,
}

impl StatusHistoryRecord {
    pub fn changed_color(&self) -> bool {
        self.previous_color != self.new_color
    }
}

impl Record for StatusHistoryRecord {
    const COLLECTION: Collection = Collection::StatusHistory;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Ids of the work items a transition concerned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelatedIds {
    pub work_order_id: Option<Uuid>,
    pub maintenance_id: Option<Uuid>,
    pub lot_id: Option<Uuid>,
}

impl RelatedIds {
    pub fn work_order(id: Uuid) -> Self {
        Self {
            work_order_id: Some(id),
            ..Self::default()
        }
    }

    pub fn maintenance(id: Uuid) -> Self {
        Self {
            maintenance_id: Some(id),
            ..Self::default()
        }
    }

    pub fn lot(id: Uuid) -> Self {
        Self {
            lot_id: Some(id),
            ..Self::default()
        }
    }
}
