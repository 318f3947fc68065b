use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use floor_core::models::{
    Machine, MaintenanceStatus, MaintenanceWindow, WorkOrder, WorkOrderStatus,
};

pub fn work_order_status_strategy() -> impl Strategy<Value = WorkOrderStatus> {
    prop_oneof![
        Just(WorkOrderStatus::Pendente),
        Just(WorkOrderStatus::EmProducao),
        Just(WorkOrderStatus::Finalizado),
    ]
}

pub fn maintenance_status_strategy() -> impl Strategy<Value = MaintenanceStatus> {
    prop_oneof![Just(MaintenanceStatus::Active), Just(MaintenanceStatus::Finished)]
}

/// A machine's work as statuses only; records are built per machine
#[derive(Debug, Clone)]
pub struct WorkMix {
    pub active: bool,
    pub orders: Vec<WorkOrderStatus>,
    pub windows: Vec<MaintenanceStatus>,
}

pub fn work_mix_strategy() -> impl Strategy<Value = WorkMix> {
    (
        any::<bool>(),
        prop::collection::vec(work_order_status_strategy(), 0..8),
        prop::collection::vec(maintenance_status_strategy(), 0..3),
    )
        .prop_map(|(active, orders, windows)| WorkMix {
            active,
            orders,
            windows,
        })
}

impl WorkMix {
    pub fn build(&self) -> (Machine, Vec<WorkOrder>, Vec<MaintenanceWindow>) {
        let mut machine = Machine::new("P1", "32_fusos", Utc::now());
        machine.active = self.active;
        let orders = self
            .orders
            .iter()
            .map(|status| WorkOrder {
                id: Uuid::new_v4(),
                machine_id: machine.id,
                machine_code: machine.code.clone(),
                lot_id: None,
                status: *status,
                client: "prop".to_string(),
                article: "fio".to_string(),
                yarn_color: "cru".to_string(),
                quantity: 1,
                notes: String::new(),
                created_by: "prop".to_string(),
                created_at: Utc::now(),
                started_at: None,
                finished_at: None,
                release_note: String::new(),
                final_report: String::new(),
            })
            .collect();
        let windows = self
            .windows
            .iter()
            .map(|status| MaintenanceWindow {
                id: Uuid::new_v4(),
                machine_id: machine.id,
                machine_code: machine.code.clone(),
                reason: "prop".to_string(),
                status: *status,
                created_by: "prop".to_string(),
                created_at: Utc::now(),
                finished_by: None,
                finished_at: None,
            })
            .collect();
        (machine, orders, windows)
    }
}
