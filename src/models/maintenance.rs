//! # Maintenance Window Model
//!
//! While `Active`, a window forces its machine to `Azul` regardless of any
//! queued or running work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::{Collection, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Active,
    Finished,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub id: Uuid,
    pub machine_id: Uuid,
    pub machine_code: String,
    pub reason: String,
    pub status: MaintenanceStatus,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    pub finished_by: Option<String>,
    #[serde(default, with = "chrono::serde::ts_microseconds_option")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl MaintenanceWindow {
    pub fn is_active(&self) -> bool {
        self.status == MaintenanceStatus::Active
    }
}

impl Record for MaintenanceWindow {
    const COLLECTION: Collection = Collection::MaintenanceWindows;

    fn id(&self) -> Uuid {
        self.id
    }
}
