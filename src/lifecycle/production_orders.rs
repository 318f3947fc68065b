use uuid::Uuid;

use super::lots::{validate_allocations, LotAllocation};
use super::{require_positive, require_text, LifecycleManager};
use crate::error::{FloorError, FloorResult};
use crate::identity::{Actor, Permission};
use crate::logging::log_allocation;
use crate::models::{
    BobbinLot, BobbinLotStatus, DraftAllocation, DraftLotFields, MachineAllocation,
    NewProductionOrder, ProductionOrder, ProductionOrderStatus,
};
use crate::state_machine::{production_order_target, ProductionOrderEvent};
use crate::store::{
    fetch, insert_record, Collection, Patch, Versioned, WriteBatch, WritePrecondition,
};

impl LifecycleManager {
    /// Create a production order ("OS") with the next sequential number.
    ///
    /// The number is allocated before anything is written; if allocation
    /// fails nothing is persisted. A number whose insert then fails is
    /// consumed, leaving a gap but never a duplicate.
    pub async fn create_production_order(
        &self,
        actor: &Actor,
        fields: NewProductionOrder,
    ) -> FloorResult<ProductionOrder> {
        actor.require(Permission::CreateOrders)?;
        require_text("client", &fields.client)?;
        require_positive("meters", fields.meters)?;

        let number = self.allocator.allocate_next_order_number().await?;

        let order = ProductionOrder {
            id: Uuid::new_v4(),
            number,
            status: ProductionOrderStatus::Pendente,
            client: fields.client,
            article: fields.article,
            yarn_color: fields.yarn_color,
            meters: fields.meters,
            due_date: fields.due_date,
            notes: fields.notes,
            created_by: actor.username.clone(),
            created_at: self.now(),
            started_at: None,
            finished_at: None,
            draft_allocations: None,
            draft_lot_fields: None,
            last_edited_by: None,
            last_edited_at: None,
            lot_ids: Vec::new(),
        };

        let created = insert_record(self.store.as_ref(), order).await?;
        tracing::info!(
            production_order_id = %created.record.id,
            number = %created.record.number,
            actor = %actor.username,
            "production order created"
        );
        Ok(created.into_inner())
    }

    /// Overwrite an order's draft fields. Last writer wins: no version check,
    /// any actor may replace another's in-progress draft.
    pub async fn save_production_order_draft(
        &self,
        actor: &Actor,
        production_order_id: Uuid,
        allocations: Option<Vec<DraftAllocation>>,
        lot_fields: Option<DraftLotFields>,
    ) -> FloorResult<ProductionOrder> {
        actor.require(Permission::EditDrafts)?;

        let current: Versioned<ProductionOrder> = fetch(self.store.as_ref(), production_order_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::ProductionOrders, production_order_id))?;
        if current.record.status == ProductionOrderStatus::Finalizado {
            return Err(FloorError::InvalidTransition {
                entity: "production order",
                id: production_order_id,
                from: current.record.status.to_string(),
                event: "edit draft",
            });
        }

        let now = self.now();
        let patch = Patch::new()
            .set("draft_allocations", &allocations)?
            .set("draft_lot_fields", &lot_fields)?
            .set("last_edited_by", &actor.username)?
            .set("last_edited_at", now.timestamp_micros())?;

        let document = self
            .store
            .update_fields(
                Collection::ProductionOrders,
                production_order_id,
                patch,
                WritePrecondition::None,
            )
            .await?;

        tracing::debug!(
            production_order_id = %production_order_id,
            actor = %actor.username,
            "production order draft saved"
        );
        Ok(Versioned::<ProductionOrder>::from_document(document)?.into_inner())
    }

    /// Turn an order's draft into a bobbin lot allocated per the draft, and
    /// clear the draft, in one commit guarded by the order's version.
    pub async fn promote_draft_to_lot(
        &self,
        actor: &Actor,
        production_order_id: Uuid,
    ) -> FloorResult<LotAllocation> {
        actor.require(Permission::EditDrafts)?;
        actor.require(Permission::ManageLots)?;

        self.with_conflict_retry("promote_draft_to_lot", || {
            self.try_promote_draft(actor, production_order_id)
        })
        .await
    }

    async fn try_promote_draft(
        &self,
        actor: &Actor,
        production_order_id: Uuid,
    ) -> FloorResult<LotAllocation> {
        let mut order: Versioned<ProductionOrder> = fetch(self.store.as_ref(), production_order_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::ProductionOrders, production_order_id))?;

        if order.record.status == ProductionOrderStatus::Finalizado {
            return Err(FloorError::InvalidTransition {
                entity: "production order",
                id: production_order_id,
                from: order.record.status.to_string(),
                event: "promote draft",
            });
        }

        let allocations: Vec<MachineAllocation> = order
            .record
            .draft_allocations
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|draft| MachineAllocation::new(draft.machine_id, draft.quantity))
            .collect();
        if allocations.is_empty() {
            return Err(FloorError::invalid_input(format!(
                "production order {} has no draft allocations to promote",
                order.record.number
            )));
        }
        validate_allocations(&allocations)?;

        let now = self.now();
        let lot_fields = order.record.draft_lot_fields.clone().unwrap_or_default();
        let mut lot = BobbinLot {
            id: Uuid::new_v4(),
            client: order.record.client.clone(),
            article: order.record.article.clone(),
            yarn_color: order.record.yarn_color.clone(),
            meters: order.record.meters,
            lot_code: lot_fields
                .lot_code
                .filter(|code| !code.trim().is_empty())
                .unwrap_or_else(|| order.record.number.clone()),
            due_date: order.record.due_date,
            notes: lot_fields.notes.unwrap_or_else(|| order.record.notes.clone()),
            status: BobbinLotStatus::Pending,
            created_by: actor.username.clone(),
            created_at: now,
            started_at: None,
            finished_at: None,
            machine_allocations: Vec::new(),
            production_order_id: Some(production_order_id),
        };

        let mut batch = WriteBatch::new();
        let staged = self
            .stage_lot_allocation(&mut batch, &mut lot, &allocations, actor, now)
            .await?;
        batch.insert(&lot)?;

        order.record.draft_allocations = None;
        order.record.draft_lot_fields = None;
        order.record.last_edited_by = Some(actor.username.clone());
        order.record.last_edited_at = Some(now);
        order.record.lot_ids.push(lot.id);
        batch.update(&order)?;

        self.commit_recolors(batch, &staged.recolors, actor).await?;
        log_allocation(lot.id, staged.recolors.len(), staged.work_orders.len(), &actor.username);

        Ok(LotAllocation {
            lot,
            work_orders: staged.work_orders,
        })
    }

    /// `Pendente -> EmProducao -> Finalizado`, stamping the matching timestamp
    pub async fn advance_production_order(
        &self,
        actor: &Actor,
        production_order_id: Uuid,
        event: ProductionOrderEvent,
    ) -> FloorResult<ProductionOrder> {
        actor.require(Permission::CreateOrders)?;

        self.with_conflict_retry("advance_production_order", || {
            self.try_advance_production_order(production_order_id, event)
        })
        .await
    }

    async fn try_advance_production_order(
        &self,
        production_order_id: Uuid,
        event: ProductionOrderEvent,
    ) -> FloorResult<ProductionOrder> {
        let mut order: Versioned<ProductionOrder> = fetch(self.store.as_ref(), production_order_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::ProductionOrders, production_order_id))?;

        let target = production_order_target(production_order_id, order.record.status, event)?;
        let now = self.now();
        match target {
            ProductionOrderStatus::EmProducao => order.record.started_at = Some(now),
            ProductionOrderStatus::Finalizado => order.record.finished_at = Some(now),
            ProductionOrderStatus::Pendente => {}
        }
        order.record.status = target;

        let mut batch = WriteBatch::new();
        batch.update(&order)?;
        self.store.commit(batch).await?;

        tracing::info!(
            production_order_id = %production_order_id,
            number = %order.record.number,
            status = %target,
            "production order advanced"
        );
        Ok(order.into_inner())
    }
}
