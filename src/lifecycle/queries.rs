//! Read accessors. None of these take an actor: reads carry no role
//! precondition.

use uuid::Uuid;

use super::LifecycleManager;
use crate::constants::store::{
    FIELD_CREATED_AT, FIELD_DUE_DATE, FIELD_LAYOUT_GROUP, FIELD_MACHINE_ID, FIELD_STATUS,
};
use crate::error::{FloorError, FloorResult};
use crate::models::{
    BobbinLot, BobbinLotStatus, Machine, MaintenanceWindow, ProductionOrder, StatusHistoryRecord,
    WorkOrder,
};
use crate::state_machine::MachineSnapshot;
use crate::store::{fetch, fetch_many, Collection, Filter, Record, SortBy, Versioned};

impl LifecycleManager {
    async fn get_record<T: Record>(&self, id: Uuid) -> FloorResult<T> {
        fetch::<T>(self.store.as_ref(), id)
            .await?
            .map(Versioned::into_inner)
            .ok_or_else(|| FloorError::not_found(T::COLLECTION, id))
    }

    async fn list_records<T: Record>(&self, filter: Filter, sort: Option<SortBy>) -> FloorResult<Vec<T>> {
        let records = fetch_many::<T>(self.store.as_ref(), &filter, sort.as_ref()).await?;
        Ok(records.into_iter().map(Versioned::into_inner).collect())
    }

    pub async fn get_machine(&self, machine_id: Uuid) -> FloorResult<Machine> {
        self.get_record(machine_id).await
    }

    /// Machines in registration order, optionally restricted to one layout group
    pub async fn list_machines(&self, layout_group: Option<&str>) -> FloorResult<Vec<Machine>> {
        let filter = match layout_group {
            Some(group) => Filter::new().eq(FIELD_LAYOUT_GROUP, group),
            None => Filter::new(),
        };
        self.list_records(filter, None).await
    }

    /// Work orders on a machine not yet finished, oldest first
    pub async fn list_live_work_orders(&self, machine_id: Uuid) -> FloorResult<Vec<WorkOrder>> {
        let snapshot = MachineSnapshot::load(self.store.as_ref(), machine_id).await?;
        Ok(snapshot.work_orders)
    }

    /// Every work order ever opened on a machine, newest first
    pub async fn list_work_orders(&self, machine_id: Uuid) -> FloorResult<Vec<WorkOrder>> {
        self.list_records(
            Filter::new().eq(FIELD_MACHINE_ID, machine_id.to_string()),
            Some(SortBy::descending(FIELD_CREATED_AT)),
        )
        .await
    }

    pub async fn get_work_order(&self, work_order_id: Uuid) -> FloorResult<WorkOrder> {
        self.get_record(work_order_id).await
    }

    /// Machine status history, oldest first
    pub async fn list_history(&self, machine_id: Uuid) -> FloorResult<Vec<StatusHistoryRecord>> {
        self.recorder.list_history(machine_id).await
    }

    /// Maintenance windows, newest first, optionally for one machine
    pub async fn list_maintenance(&self, machine_id: Option<Uuid>) -> FloorResult<Vec<MaintenanceWindow>> {
        let filter = match machine_id {
            Some(id) => Filter::new().eq(FIELD_MACHINE_ID, id.to_string()),
            None => Filter::new(),
        };
        self.list_records(filter, Some(SortBy::descending(FIELD_CREATED_AT)))
            .await
    }

    pub async fn get_production_order(&self, production_order_id: Uuid) -> FloorResult<ProductionOrder> {
        self.get_record(production_order_id).await
    }

    /// Production orders, newest first
    pub async fn list_production_orders(&self) -> FloorResult<Vec<ProductionOrder>> {
        self.list_records(Filter::new(), Some(SortBy::descending(FIELD_CREATED_AT)))
            .await
    }

    pub async fn get_bobbin_lot(&self, lot_id: Uuid) -> FloorResult<BobbinLot> {
        self.get_record(lot_id).await
    }

    /// Lots not yet finished, earliest due date first
    pub async fn list_open_lots(&self) -> FloorResult<Vec<BobbinLot>> {
        self.list_records(
            Filter::new().ne(FIELD_STATUS, BobbinLotStatus::Finished.as_str()),
            Some(SortBy::ascending(FIELD_DUE_DATE)),
        )
        .await
    }

    /// Finished lots, most recently created first
    pub async fn list_finished_lots(&self) -> FloorResult<Vec<BobbinLot>> {
        self.list_records(
            Filter::new().eq(FIELD_STATUS, BobbinLotStatus::Finished.as_str()),
            Some(SortBy::descending(FIELD_CREATED_AT)),
        )
        .await
    }
}
