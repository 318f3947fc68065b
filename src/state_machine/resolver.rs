//! # Machine Status Resolver
//!
//! A machine's color is never set directly by a transition. It is derived
//! from the machine record and its current live work every time anything
//! touching the machine commits.
//!
//! Precedence, highest first:
//!
//! 1. inactive machine: `Desativada`
//! 2. any active maintenance window: `Azul`
//! 3. any running work order: `Vermelho`
//! 4. any pending work order: `Amarelo`
//! 5. otherwise `Verde`

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::constants::store::{FIELD_CREATED_AT, FIELD_MACHINE_ID, FIELD_STATUS};
use crate::error::{FloorError, FloorResult};
use crate::models::{
    Machine, MachineColor, MaintenanceStatus, MaintenanceWindow, WorkOrder, WorkOrderStatus,
};
use crate::store::{fetch, fetch_many, Collection, EntityStore, Filter, SortBy, Versioned};

/// Derive the color for `machine` from its live work items.
///
/// Items belonging to other machines and items already in a terminal status
/// are ignored, so callers may pass unfiltered slices.
pub fn resolve_color(
    machine: &Machine,
    live_work_orders: &[WorkOrder],
    live_maintenance: &[MaintenanceWindow],
) -> MachineColor {
    if !machine.active {
        return MachineColor::Desativada;
    }

    let owned_orders = || {
        live_work_orders
            .iter()
            .filter(move |order| order.machine_id == machine.id)
    };

    if live_maintenance
        .iter()
        .any(|window| window.machine_id == machine.id && window.is_active())
    {
        MachineColor::Azul
    } else if owned_orders().any(|order| order.status == WorkOrderStatus::EmProducao) {
        MachineColor::Vermelho
    } else if owned_orders().any(|order| order.status == WorkOrderStatus::Pendente) {
        MachineColor::Amarelo
    } else {
        MachineColor::Verde
    }
}

/// Outcome of re-deriving a machine's color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorChange {
    pub previous: MachineColor,
    pub new: MachineColor,
}

impl ColorChange {
    pub fn changed(&self) -> bool {
        self.previous != self.new
    }
}

/// A machine read together with its live work, at one store version.
///
/// Transitions mutate the snapshot in memory, call [`MachineSnapshot::recolor`],
/// and commit the machine guarded by the version it was read at. A concurrent
/// writer on the same machine therefore makes the commit fail instead of
/// overwriting a color computed from a newer live set.
#[derive(Debug, Clone)]
pub struct MachineSnapshot {
    pub machine: Versioned<Machine>,
    pub work_orders: Vec<WorkOrder>,
    pub maintenance: Vec<MaintenanceWindow>,
}

impl MachineSnapshot {
    pub async fn load(store: &dyn EntityStore, machine_id: Uuid) -> FloorResult<Self> {
        let machine = fetch::<Machine>(store, machine_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::Machines, machine_id))?;

        let work_orders = fetch_many::<WorkOrder>(
            store,
            &Filter::new()
                .eq(FIELD_MACHINE_ID, machine_id.to_string())
                .ne(FIELD_STATUS, WorkOrderStatus::Finalizado.as_str()),
            Some(&SortBy::ascending(FIELD_CREATED_AT)),
        )
        .await?
        .into_iter()
        .map(Versioned::into_inner)
        .collect();

        let maintenance = fetch_many::<MaintenanceWindow>(
            store,
            &Filter::new()
                .eq(FIELD_MACHINE_ID, machine_id.to_string())
                .eq(FIELD_STATUS, MaintenanceStatus::Active.as_str()),
            Some(&SortBy::ascending(FIELD_CREATED_AT)),
        )
        .await?
        .into_iter()
        .map(Versioned::into_inner)
        .collect();

        Ok(Self {
            machine,
            work_orders,
            maintenance,
        })
    }

    pub fn machine_id(&self) -> Uuid {
        self.machine.record.id
    }

    /// Color implied by the snapshot's current contents
    pub fn resolved_color(&self) -> MachineColor {
        resolve_color(&self.machine.record, &self.work_orders, &self.maintenance)
    }

    pub fn running_order(&self) -> Option<&WorkOrder> {
        self.work_orders.iter().find(|order| order.status.is_running())
    }

    pub fn pending_orders(&self) -> impl Iterator<Item = &WorkOrder> {
        self.work_orders
            .iter()
            .filter(|order| order.status == WorkOrderStatus::Pendente)
    }

    pub fn has_active_maintenance(&self) -> bool {
        self.maintenance.iter().any(MaintenanceWindow::is_active)
    }

    /// Insert or replace a work order in the live set; terminal orders leave it
    pub fn apply_work_order(&mut self, order: &WorkOrder) {
        self.work_orders.retain(|existing| existing.id != order.id);
        if order.is_live() {
            self.work_orders.push(order.clone());
        }
    }

    /// Insert or replace a maintenance window; finished windows leave the set
    pub fn apply_maintenance(&mut self, window: &MaintenanceWindow) {
        self.maintenance.retain(|existing| existing.id != window.id);
        if window.is_active() {
            self.maintenance.push(window.clone());
        }
    }

    /// Re-derive the machine color from the live set and stamp the record
    pub fn recolor(&mut self, now: DateTime<Utc>) -> ColorChange {
        let previous = self.machine.record.color;
        let new = self.resolved_color();
        self.machine.record.color = new;
        self.machine.record.updated_at = now;
        ColorChange { previous, new }
    }
}
