// State machine module for the floor
//
// Work-item status tables, machine guards, and the resolver that derives a
// machine's color from its live work.

pub mod events;
pub mod guards;
pub mod resolver;
pub mod transitions;

pub use events::{LotEvent, MaintenanceEvent, ProductionOrderEvent, WorkOrderEvent};
pub use guards::{AcceptsQueuedWorkGuard, CanStartGuard, IdleMachineGuard, MachineGuard};
pub use resolver::{resolve_color, ColorChange, MachineSnapshot};
pub use transitions::{lot_target, maintenance_target, production_order_target, work_order_target};
