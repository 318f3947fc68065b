//! Machine preconditions checked before a transition is staged.
//!
//! Guards inspect a [`MachineSnapshot`] and fail with
//! [`FloorError::MachineUnavailable`] carrying the machine's current color.

use super::resolver::MachineSnapshot;
use crate::error::{FloorError, FloorResult};
use crate::models::MachineColor;

/// Trait for machine-level transition guards
pub trait MachineGuard {
    fn check(&self, snapshot: &MachineSnapshot) -> FloorResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

fn unavailable(snapshot: &MachineSnapshot, reason: &str) -> FloorError {
    FloorError::machine_unavailable(snapshot.machine_id(), snapshot.resolved_color(), reason)
}

/// New work orders and maintenance windows need an idle machine
pub struct IdleMachineGuard;

impl MachineGuard for IdleMachineGuard {
    fn check(&self, snapshot: &MachineSnapshot) -> FloorResult<()> {
        match snapshot.resolved_color() {
            MachineColor::Verde => Ok(()),
            _ => Err(unavailable(snapshot, self.description())),
        }
    }

    fn description(&self) -> &'static str {
        "machine must be idle (verde)"
    }
}

/// Starting an order needs an active machine, no maintenance and nothing running
pub struct CanStartGuard;

impl MachineGuard for CanStartGuard {
    fn check(&self, snapshot: &MachineSnapshot) -> FloorResult<()> {
        if !snapshot.machine.record.active {
            return Err(unavailable(snapshot, "machine is deactivated"));
        }
        if snapshot.has_active_maintenance() {
            return Err(unavailable(snapshot, "machine is under maintenance"));
        }
        if let Some(running) = snapshot.running_order() {
            return Err(unavailable(
                snapshot,
                &format!("machine is already running work order {}", running.id),
            ));
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "machine must be active, out of maintenance and not running another order"
    }
}

/// Lot allocations queue behind any work, but never onto a deactivated machine
pub struct AcceptsQueuedWorkGuard;

impl MachineGuard for AcceptsQueuedWorkGuard {
    fn check(&self, snapshot: &MachineSnapshot) -> FloorResult<()> {
        if snapshot.machine.record.active {
            Ok(())
        } else {
            Err(unavailable(snapshot, self.description()))
        }
    }

    fn description(&self) -> &'static str {
        "machine must be active to queue work"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Machine, MaintenanceStatus, MaintenanceWindow, WorkOrder, WorkOrderStatus,
    };
    use crate::store::Versioned;
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot(active: bool) -> MachineSnapshot {
        let mut machine = Machine::new("F7", "16_fusos", Utc::now());
        machine.active = active;
        MachineSnapshot {
            machine: Versioned {
                version: 1,
                record: machine,
            },
            work_orders: vec![],
            maintenance: vec![],
        }
    }

    fn add_order(snapshot: &mut MachineSnapshot, status: WorkOrderStatus) {
        let machine = &snapshot.machine.record;
        let order = WorkOrder {
            id: Uuid::new_v4(),
            machine_id: machine.id,
            machine_code: machine.code.clone(),
            lot_id: None,
            status,
            client: "c".into(),
            article: "a".into(),
            yarn_color: "azul".into(),
            quantity: 1,
            notes: String::new(),
            created_by: "u".into(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            release_note: String::new(),
            final_report: String::new(),
        };
        snapshot.apply_work_order(&order);
    }

    #[test]
    fn test_idle_guard_rejects_queued_machine() {
        let mut snap = snapshot(true);
        assert!(IdleMachineGuard.check(&snap).is_ok());

        add_order(&mut snap, WorkOrderStatus::Pendente);
        let err = IdleMachineGuard.check(&snap).unwrap_err();
        assert!(matches!(
            err,
            FloorError::MachineUnavailable {
                color: MachineColor::Amarelo,
                ..
            }
        ));
    }

    #[test]
    fn test_can_start_guard() {
        let mut snap = snapshot(true);
        add_order(&mut snap, WorkOrderStatus::Pendente);
        assert!(CanStartGuard.check(&snap).is_ok());

        add_order(&mut snap, WorkOrderStatus::EmProducao);
        assert!(CanStartGuard.check(&snap).is_err());

        let mut maintained = snapshot(true);
        let machine = &maintained.machine.record;
        let window = MaintenanceWindow {
            id: Uuid::new_v4(),
            machine_id: machine.id,
            machine_code: machine.code.clone(),
            reason: "lubrificação".into(),
            status: MaintenanceStatus::Active,
            created_by: "u".into(),
            created_at: Utc::now(),
            finished_by: None,
            finished_at: None,
        };
        maintained.apply_maintenance(&window);
        assert!(CanStartGuard.check(&maintained).is_err());

        assert!(CanStartGuard.check(&snapshot(false)).is_err());
    }

    #[test]
    fn test_queued_work_guard_only_needs_active() {
        let mut snap = snapshot(true);
        add_order(&mut snap, WorkOrderStatus::EmProducao);
        assert!(AcceptsQueuedWorkGuard.check(&snap).is_ok());

        let err = AcceptsQueuedWorkGuard.check(&snapshot(false)).unwrap_err();
        assert!(matches!(
            err,
            FloorError::MachineUnavailable {
                color: MachineColor::Desativada,
                ..
            }
        ));
    }
}
