//! # Production Order Model
//!
//! The client-facing order header ("OS") carrying the sequential number.
//! `number` is assigned once at creation and never changes.
//!
//! The `draft_*` fields hold allocation plans still being edited. Any
//! authorized actor may overwrite them (last writer wins); they have no
//! effect on machine state until promoted into a bobbin lot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::{Collection, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionOrderStatus {
    Pendente,
    EmProducao,
    Finalizado,
}

impl fmt::Display for ProductionOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pendente => write!(f, "pendente"),
            Self::EmProducao => write!(f, "em_producao"),
            Self::Finalizado => write!(f, "finalizado"),
        }
    }
}

impl Default for ProductionOrderStatus {
    fn default() -> Self {
        Self::Pendente
    }
}

/// One planned machine allocation in a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAllocation {
    pub machine_id: Uuid,
    pub quantity: u64,
}

/// Lot fields filled in while the draft is planned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLotFields {
    pub lot_code: Option<String>,
    pub raw_material: Option<String>,
    pub yarn_count: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: Uuid,
    pub number: String,
    pub status: ProductionOrderStatus,
    pub client: String,
    pub article: String,
    pub yarn_color: String,
    pub meters: u64,
    pub due_date: NaiveDate,
    pub notes: String,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub draft_allocations: Option<Vec<DraftAllocation>>,
    #[serde(default)]
    pub draft_lot_fields: Option<DraftLotFields>,
    #[serde(default)]
    pub last_edited_by: Option<String>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub last_edited_at: Option<DateTime<Utc>>,
    /// Lots promoted from this order's drafts
    #[serde(default)]
    pub lot_ids: Vec<Uuid>,
}

impl ProductionOrder {
    pub fn has_draft(&self) -> bool {
        self.draft_allocations.is_some() || self.draft_lot_fields.is_some()
    }
}

impl Record for ProductionOrder {
    const COLLECTION: Collection = Collection::ProductionOrders;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProductionOrder {
    pub client: String,
    pub article: String,
    pub yarn_color: String,
    pub meters: u64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_draft_fields_deserialize_as_empty() {
        let json = serde_json::json!({
            "id": Uuid::nil(),
            "number": "0001",
            "status": "pendente",
            "client": "Malharia Sul",
            "article": "Fio 30/1",
            "yarn_color": "azul claro",
            "meters": 2000,
            "due_date": "2025-02-15",
            "notes": "",
            "created_by": "admin",
            "created_at": 1_700_000_000_000_000i64,
        });

        let order: ProductionOrder = serde_json::from_value(json).unwrap();
        assert!(!order.has_draft());
        assert!(order.started_at.is_none());
        assert!(order.lot_ids.is_empty());
        assert_eq!(order.due_date, NaiveDate::from_ymd_opt(2025, 2, 15).unwrap());
    }
}
