//! Status transition tables for each work-item kind.
//!
//! Each function maps `(current status, event)` to the target status or
//! rejects the move with [`FloorError::InvalidTransition`]. Machine colors are
//! not decided here; see [`super::resolver`].

use uuid::Uuid;

use super::events::{LotEvent, MaintenanceEvent, ProductionOrderEvent, WorkOrderEvent};
use crate::error::{FloorError, FloorResult};
use crate::models::{BobbinLotStatus, MaintenanceStatus, ProductionOrderStatus, WorkOrderStatus};

fn rejected(entity: &'static str, id: Uuid, from: impl ToString, event: &'static str) -> FloorError {
    FloorError::InvalidTransition {
        entity,
        id,
        from: from.to_string(),
        event,
    }
}

pub fn work_order_target(
    id: Uuid,
    current: WorkOrderStatus,
    event: WorkOrderEvent,
) -> FloorResult<WorkOrderStatus> {
    let target = match (current, event) {
        (WorkOrderStatus::Pendente, WorkOrderEvent::Start) => WorkOrderStatus::EmProducao,
        (WorkOrderStatus::EmProducao, WorkOrderEvent::Finish) => WorkOrderStatus::Finalizado,
        (from, event) => return Err(rejected("work order", id, from, event.event_type())),
    };
    Ok(target)
}

pub fn maintenance_target(
    id: Uuid,
    current: MaintenanceStatus,
    event: MaintenanceEvent,
) -> FloorResult<MaintenanceStatus> {
    match (current, event) {
        (MaintenanceStatus::Active, MaintenanceEvent::Finish) => Ok(MaintenanceStatus::Finished),
        (from, event) => Err(rejected("maintenance window", id, from, event.event_type())),
    }
}

pub fn lot_target(id: Uuid, current: BobbinLotStatus, event: LotEvent) -> FloorResult<BobbinLotStatus> {
    let target = match (current, event) {
        // A lot may receive further allocations until production starts
        (BobbinLotStatus::Pending, LotEvent::Allocate)
        | (BobbinLotStatus::AwaitingProduction, LotEvent::Allocate) => {
            BobbinLotStatus::AwaitingProduction
        }
        (BobbinLotStatus::AwaitingProduction, LotEvent::Start) => BobbinLotStatus::InProduction,
        (BobbinLotStatus::InProduction, LotEvent::Finish) => BobbinLotStatus::Finished,
        (from, event) => return Err(rejected("bobbin lot", id, from, event.event_type())),
    };
    Ok(target)
}

pub fn production_order_target(
    id: Uuid,
    current: ProductionOrderStatus,
    event: ProductionOrderEvent,
) -> FloorResult<ProductionOrderStatus> {
    let target = match (current, event) {
        (ProductionOrderStatus::Pendente, ProductionOrderEvent::Start) => {
            ProductionOrderStatus::EmProducao
        }
        (ProductionOrderStatus::EmProducao, ProductionOrderEvent::Finish) => {
            ProductionOrderStatus::Finalizado
        }
        (from, event) => return Err(rejected("production order", id, from, event.event_type())),
    };
    Ok(target)
}
