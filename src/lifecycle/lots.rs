use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{require_positive, require_text, LifecycleManager, StagedRecolor};
use crate::constants::transitions::LOT_ALLOCATED;
use crate::error::{FloorError, FloorResult};
use crate::identity::{Actor, Permission};
use crate::logging::log_allocation;
use crate::models::{
    BobbinLot, BobbinLotStatus, MachineAllocation, NewBobbinLot, RelatedIds, WorkOrder,
    WorkOrderStatus,
};
use crate::state_machine::{
    lot_target, AcceptsQueuedWorkGuard, LotEvent, MachineGuard, MachineSnapshot,
};
use crate::store::{fetch, insert_record, Collection, Versioned, WriteBatch};

/// Result of allocating a lot: the updated lot and the work orders queued
#[derive(Debug, Clone, PartialEq)]
pub struct LotAllocation {
    pub lot: BobbinLot,
    pub work_orders: Vec<WorkOrder>,
}

/// Work staged by an allocation, committed by the caller
pub(super) struct StagedAllocation {
    pub(super) work_orders: Vec<WorkOrder>,
    pub(super) recolors: Vec<StagedRecolor>,
}

pub(super) fn validate_allocations(allocations: &[MachineAllocation]) -> FloorResult<()> {
    if allocations.is_empty() {
        return Err(FloorError::invalid_input("at least one machine allocation is required"));
    }
    for allocation in allocations {
        require_positive("allocation quantity", allocation.quantity)?;
    }
    Ok(())
}

impl LifecycleManager {
    pub async fn create_bobbin_lot(&self, actor: &Actor, fields: NewBobbinLot) -> FloorResult<BobbinLot> {
        actor.require(Permission::ManageLots)?;
        require_text("lot_code", &fields.lot_code)?;
        require_text("client", &fields.client)?;
        require_positive("meters", fields.meters)?;

        let lot = BobbinLot {
            id: Uuid::new_v4(),
            client: fields.client,
            article: fields.article,
            yarn_color: fields.yarn_color,
            meters: fields.meters,
            lot_code: fields.lot_code,
            due_date: fields.due_date,
            notes: fields.notes,
            status: BobbinLotStatus::Pending,
            created_by: actor.username.clone(),
            created_at: self.now(),
            started_at: None,
            finished_at: None,
            machine_allocations: Vec::new(),
            production_order_id: None,
        };

        let created = insert_record(self.store.as_ref(), lot).await?;
        tracing::info!(lot_id = %created.record.id, lot_code = %created.record.lot_code, "bobbin lot created");
        Ok(created.into_inner())
    }

    /// Queue one pending work order per allocation on its target machine.
    ///
    /// Running and maintained machines keep their color; the new orders only
    /// join their pending queue. Deactivated machines reject the allocation.
    pub async fn allocate_lot_to_machines(
        &self,
        actor: &Actor,
        lot_id: Uuid,
        allocations: &[MachineAllocation],
    ) -> FloorResult<LotAllocation> {
        actor.require(Permission::ManageLots)?;
        validate_allocations(allocations)?;

        self.with_conflict_retry("allocate_lot_to_machines", || {
            self.try_allocate_lot(actor, lot_id, allocations)
        })
        .await
    }

    async fn try_allocate_lot(
        &self,
        actor: &Actor,
        lot_id: Uuid,
        allocations: &[MachineAllocation],
    ) -> FloorResult<LotAllocation> {
        let mut lot: Versioned<BobbinLot> = fetch(self.store.as_ref(), lot_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::BobbinLots, lot_id))?;

        let now = self.now();
        let mut batch = WriteBatch::new();
        let staged = self
            .stage_lot_allocation(&mut batch, &mut lot.record, allocations, actor, now)
            .await?;
        batch.update(&lot)?;

        self.commit_recolors(batch, &staged.recolors, actor).await?;
        log_allocation(lot_id, staged.recolors.len(), staged.work_orders.len(), &actor.username);

        Ok(LotAllocation {
            lot: lot.into_inner(),
            work_orders: staged.work_orders,
        })
    }

    /// Stage the work orders, recolors and history for allocating `lot`,
    /// and advance the lot record in place. One machine update per machine,
    /// whatever the number of allocations targeting it.
    pub(super) async fn stage_lot_allocation(
        &self,
        batch: &mut WriteBatch,
        lot: &mut BobbinLot,
        allocations: &[MachineAllocation],
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> FloorResult<StagedAllocation> {
        let target = lot_target(lot.id, lot.status, LotEvent::Allocate)?;

        let mut per_machine: BTreeMap<Uuid, Vec<u64>> = BTreeMap::new();
        for allocation in allocations {
            per_machine
                .entry(allocation.machine_id)
                .or_default()
                .push(allocation.quantity);
        }

        let store = self.store.as_ref();
        let snapshots = try_join_all(
            per_machine
                .keys()
                .map(|machine_id| MachineSnapshot::load(store, *machine_id)),
        )
        .await?;

        let mut staged = StagedAllocation {
            work_orders: Vec::with_capacity(allocations.len()),
            recolors: Vec::with_capacity(snapshots.len()),
        };

        for (mut snapshot, quantities) in snapshots.into_iter().zip(per_machine.values()) {
            AcceptsQueuedWorkGuard.check(&snapshot)?;

            let mut first_order = None;
            for quantity in quantities {
                let order = WorkOrder {
                    id: Uuid::new_v4(),
                    machine_id: snapshot.machine_id(),
                    machine_code: snapshot.machine.record.code.clone(),
                    lot_id: Some(lot.id),
                    status: WorkOrderStatus::Pendente,
                    client: lot.client.clone(),
                    article: lot.article.clone(),
                    yarn_color: lot.yarn_color.clone(),
                    quantity: *quantity,
                    notes: lot.notes.clone(),
                    created_by: actor.username.clone(),
                    created_at: now,
                    started_at: None,
                    finished_at: None,
                    release_note: String::new(),
                    final_report: String::new(),
                };
                batch.insert(&order)?;
                snapshot.apply_work_order(&order);
                first_order.get_or_insert(order.id);
                staged.work_orders.push(order);
            }

            let related = RelatedIds {
                work_order_id: first_order,
                maintenance_id: None,
                lot_id: Some(lot.id),
            };
            staged
                .recolors
                .push(self.stage_recolor(batch, &mut snapshot, LOT_ALLOCATED, actor, related, now)?);
        }

        lot.status = target;
        lot.started_at.get_or_insert(now);
        lot.machine_allocations.extend_from_slice(allocations);
        Ok(staged)
    }

    /// Move a lot into production or finish it. Allocation has its own
    /// operation and is rejected here.
    pub async fn advance_bobbin_lot(
        &self,
        actor: &Actor,
        lot_id: Uuid,
        event: LotEvent,
    ) -> FloorResult<BobbinLot> {
        actor.require(Permission::ManageLots)?;
        if event == LotEvent::Allocate {
            return Err(FloorError::invalid_input(
                "lots are allocated through allocate_lot_to_machines",
            ));
        }

        self.with_conflict_retry("advance_bobbin_lot", || self.try_advance_lot(lot_id, event))
            .await
    }

    async fn try_advance_lot(&self, lot_id: Uuid, event: LotEvent) -> FloorResult<BobbinLot> {
        let mut lot: Versioned<BobbinLot> = fetch(self.store.as_ref(), lot_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::BobbinLots, lot_id))?;

        let target = lot_target(lot_id, lot.record.status, event)?;
        lot.record.status = target;
        if target == BobbinLotStatus::Finished {
            lot.record.finished_at = Some(self.now());
        }

        let mut batch = WriteBatch::new();
        batch.update(&lot)?;
        self.store.commit(batch).await?;

        tracing::info!(lot_id = %lot_id, status = %target, event = event.event_type(), "bobbin lot advanced");
        Ok(lot.into_inner())
    }
}
