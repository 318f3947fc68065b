//! Floor records as stored in the entity store.

pub mod bobbin_lot;
pub mod machine;
pub mod maintenance;
pub mod production_order;
pub mod status_history;
pub mod work_order;

pub use bobbin_lot::{BobbinLot, BobbinLotStatus, MachineAllocation, NewBobbinLot};
pub use machine::{Machine, MachineColor};
pub use maintenance::{MaintenanceStatus, MaintenanceWindow};
pub use production_order::{
    DraftAllocation, DraftLotFields, NewProductionOrder, ProductionOrder, ProductionOrderStatus,
};
pub use status_history::{RelatedIds, StatusHistoryRecord};
pub use work_order::{NewWorkOrder, WorkOrder, WorkOrderStatus};
