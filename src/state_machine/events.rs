use serde::{Deserialize, Serialize};

/// Events that move a work order through its statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderEvent {
    /// Begin production on the machine
    Start,
    /// Close the order with its release note and final report
    Finish,
}

impl WorkOrderEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Finish => "finish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceEvent {
    Finish,
}

impl MaintenanceEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Finish => "finish",
        }
    }
}

/// Events on a bobbin lot. `Allocate` is raised by the allocation operation
/// itself; callers advance a lot with `Start` and `Finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotEvent {
    Allocate,
    Start,
    Finish,
}

impl LotEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::Start => "start",
            Self::Finish => "finish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionOrderEvent {
    Start,
    Finish,
}

impl ProductionOrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Finish => "finish",
        }
    }
}
