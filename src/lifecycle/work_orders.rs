use uuid::Uuid;

use super::{require_positive, require_text, LifecycleManager};
use crate::constants::transitions::{WORK_ORDER_CREATED, WORK_ORDER_FINISHED, WORK_ORDER_STARTED};
use crate::error::{FloorError, FloorResult};
use crate::identity::{Actor, Permission};
use crate::models::{NewWorkOrder, RelatedIds, WorkOrder, WorkOrderStatus};
use crate::state_machine::{
    work_order_target, CanStartGuard, IdleMachineGuard, MachineGuard, MachineSnapshot,
    WorkOrderEvent,
};
use crate::store::{fetch, Collection, Versioned, WriteBatch};

impl LifecycleManager {
    /// Open a pending work order on an idle machine.
    ///
    /// Machines that are not `Verde` reject new direct orders; queued demand
    /// goes through lot allocation instead.
    pub async fn create_work_order(
        &self,
        actor: &Actor,
        machine_id: Uuid,
        fields: NewWorkOrder,
    ) -> FloorResult<WorkOrder> {
        actor.require(Permission::CreateOrders)?;
        require_text("client", &fields.client)?;
        require_positive("quantity", fields.quantity)?;

        self.with_conflict_retry("create_work_order", || {
            self.try_create_work_order(actor, machine_id, &fields)
        })
        .await
    }

    async fn try_create_work_order(
        &self,
        actor: &Actor,
        machine_id: Uuid,
        fields: &NewWorkOrder,
    ) -> FloorResult<WorkOrder> {
        let mut snapshot = MachineSnapshot::load(self.store.as_ref(), machine_id).await?;
        IdleMachineGuard.check(&snapshot)?;

        let now = self.now();
        let order = WorkOrder {
            id: Uuid::new_v4(),
            machine_id,
            machine_code: snapshot.machine.record.code.clone(),
            lot_id: None,
            status: WorkOrderStatus::Pendente,
            client: fields.client.clone(),
            article: fields.article.clone(),
            yarn_color: fields.yarn_color.clone(),
            quantity: fields.quantity,
            notes: fields.notes.clone(),
            created_by: actor.username.clone(),
            created_at: now,
            started_at: None,
            finished_at: None,
            release_note: String::new(),
            final_report: String::new(),
        };

        let mut batch = WriteBatch::new();
        batch.insert(&order)?;
        snapshot.apply_work_order(&order);
        let staged = self.stage_recolor(
            &mut batch,
            &mut snapshot,
            WORK_ORDER_CREATED,
            actor,
            RelatedIds::work_order(order.id),
            now,
        )?;

        self.commit_recolors(batch, &[staged], actor).await?;
        Ok(order)
    }

    /// Move a pending work order into production
    pub async fn start_work_order(&self, actor: &Actor, work_order_id: Uuid) -> FloorResult<WorkOrder> {
        actor.require(Permission::OperateWorkOrders)?;

        self.with_conflict_retry("start_work_order", || {
            self.try_advance_work_order(actor, work_order_id, WorkOrderEvent::Start, None)
        })
        .await
    }

    /// Finish a running work order and recolor its machine from the work
    /// still queued there
    pub async fn finish_work_order(
        &self,
        actor: &Actor,
        work_order_id: Uuid,
        release_note: &str,
        final_report: &str,
    ) -> FloorResult<WorkOrder> {
        actor.require(Permission::OperateWorkOrders)?;

        self.with_conflict_retry("finish_work_order", || {
            self.try_advance_work_order(
                actor,
                work_order_id,
                WorkOrderEvent::Finish,
                Some((release_note, final_report)),
            )
        })
        .await
    }

    async fn try_advance_work_order(
        &self,
        actor: &Actor,
        work_order_id: Uuid,
        event: WorkOrderEvent,
        closing_notes: Option<(&str, &str)>,
    ) -> FloorResult<WorkOrder> {
        let mut order: Versioned<WorkOrder> = fetch(self.store.as_ref(), work_order_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::WorkOrders, work_order_id))?;

        let target = work_order_target(work_order_id, order.record.status, event)?;
        let mut snapshot = MachineSnapshot::load(self.store.as_ref(), order.record.machine_id).await?;

        let now = self.now();
        let transition = match event {
            WorkOrderEvent::Start => {
                CanStartGuard.check(&snapshot)?;
                order.record.started_at = Some(now);
                WORK_ORDER_STARTED
            }
            WorkOrderEvent::Finish => {
                order.record.finished_at = Some(now);
                if let Some((release_note, final_report)) = closing_notes {
                    order.record.release_note = release_note.to_string();
                    order.record.final_report = final_report.to_string();
                }
                WORK_ORDER_FINISHED
            }
        };
        order.record.status = target;

        let mut batch = WriteBatch::new();
        batch.update(&order)?;
        snapshot.apply_work_order(&order.record);
        let staged = self.stage_recolor(
            &mut batch,
            &mut snapshot,
            transition,
            actor,
            RelatedIds::work_order(work_order_id),
            now,
        )?;

        self.commit_recolors(batch, &[staged], actor).await?;
        Ok(order.into_inner())
    }
}
