//! # Work Order Model
//!
//! A floor order against exactly one machine. Many work orders exist per
//! machine over time; only those not yet `Finalizado` count as live work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::{Collection, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pendente,
    EmProducao,
    Finalizado,
}

impl WorkOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalizado)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::EmProducao)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::EmProducao => "em_producao",
            Self::Finalizado => "finalizado",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(Self::Pendente),
            "em_producao" => Ok(Self::EmProducao),
            "finalizado" => Ok(Self::Finalizado),
            _ => Err(format!("Invalid work order status: {s}")),
        }
    }
}

impl Default for WorkOrderStatus {
    fn default() -> Self {
        Self::Pendente
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    pub machine_id: Uuid,
    pub machine_code: String,
    /// Set when the order was queued by a bobbin lot allocation
    pub lot_id: Option<Uuid>,
    pub status: WorkOrderStatus,
    pub client: String,
    pub article: String,
    pub yarn_color: String,
    pub quantity: u64,
    pub notes: String,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub finished_at: Option<DateTime<Utc>>,
    pub release_note: String,
    pub final_report: String,
}

impl WorkOrder {
    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }
}

impl Record for WorkOrder {
    const COLLECTION: Collection = Collection::WorkOrders;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Caller-supplied fields of a new work order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWorkOrder {
    pub client: String,
    pub article: String,
    pub yarn_color: String,
    pub quantity: u64,
    #[serde(default)]
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(WorkOrderStatus::EmProducao.to_string(), "em_producao");
        assert_eq!(
            "finalizado".parse::<WorkOrderStatus>().unwrap(),
            WorkOrderStatus::Finalizado
        );
        assert_eq!(
            serde_json::to_value(WorkOrderStatus::EmProducao).unwrap(),
            serde_json::json!(WorkOrderStatus::EmProducao.as_str())
        );
    }

    #[test]
    fn test_only_finalizado_is_terminal() {
        assert!(WorkOrderStatus::Finalizado.is_terminal());
        assert!(!WorkOrderStatus::Pendente.is_terminal());
        assert!(!WorkOrderStatus::EmProducao.is_terminal());
    }
}
