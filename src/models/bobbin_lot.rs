//! # Bobbin Lot Model
//!
//! A material batch split across machines. Allocating a lot queues one
//! pending work order per allocation on the target machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::{Collection, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BobbinLotStatus {
    Pending,
    AwaitingProduction,
    InProduction,
    Finished,
}

impl BobbinLotStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingProduction => "awaiting_production",
            Self::InProduction => "in_production",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for BobbinLotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineAllocation {
    pub machine_id: Uuid,
    pub quantity: u64,
}

impl MachineAllocation {
    pub fn new(machine_id: Uuid, quantity: u64) -> Self {
        Self {
            machine_id,
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BobbinLot {
    pub id: Uuid,
    pub client: String,
    pub article: String,
    pub yarn_color: String,
    pub meters: u64,
    pub lot_code: String,
    pub due_date: NaiveDate,
    pub notes: String,
    pub status: BobbinLotStatus,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub machine_allocations: Vec<MachineAllocation>,
    #[serde(default)]
    pub production_order_id: Option<Uuid>,
}

impl Record for BobbinLot {
    const COLLECTION: Collection = Collection::BobbinLots;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBobbinLot {
    pub client: String,
    pub article: String,
    pub yarn_color: String,
    pub meters: u64,
    pub lot_code: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}
