use uuid::Uuid;

use super::{require_text, LifecycleManager};
use crate::constants::transitions::{MAINTENANCE_FINISHED, MAINTENANCE_STARTED};
use crate::error::{FloorError, FloorResult};
use crate::identity::{Actor, Permission};
use crate::models::{MaintenanceStatus, MaintenanceWindow, RelatedIds};
use crate::state_machine::{
    maintenance_target, IdleMachineGuard, MachineGuard, MachineSnapshot, MaintenanceEvent,
};
use crate::store::{fetch, Collection, Versioned, WriteBatch};

impl LifecycleManager {
    /// Open a maintenance window on an idle machine, forcing it to `Azul`
    pub async fn start_maintenance(
        &self,
        actor: &Actor,
        machine_id: Uuid,
        reason: &str,
    ) -> FloorResult<MaintenanceWindow> {
        actor.require(Permission::ManageMaintenance)?;
        require_text("reason", reason)?;

        self.with_conflict_retry("start_maintenance", || {
            self.try_start_maintenance(actor, machine_id, reason)
        })
        .await
    }

    async fn try_start_maintenance(
        &self,
        actor: &Actor,
        machine_id: Uuid,
        reason: &str,
    ) -> FloorResult<MaintenanceWindow> {
        let mut snapshot = MachineSnapshot::load(self.store.as_ref(), machine_id).await?;
        IdleMachineGuard.check(&snapshot)?;

        let now = self.now();
        let window = MaintenanceWindow {
            id: Uuid::new_v4(),
            machine_id,
            machine_code: snapshot.machine.record.code.clone(),
            reason: reason.trim().to_string(),
            status: MaintenanceStatus::Active,
            created_by: actor.username.clone(),
            created_at: now,
            finished_by: None,
            finished_at: None,
        };

        let mut batch = WriteBatch::new();
        batch.insert(&window)?;
        snapshot.apply_maintenance(&window);
        let staged = self.stage_recolor(
            &mut batch,
            &mut snapshot,
            MAINTENANCE_STARTED,
            actor,
            RelatedIds::maintenance(window.id),
            now,
        )?;

        self.commit_recolors(batch, &[staged], actor).await?;
        Ok(window)
    }

    /// Close a maintenance window; the machine returns to whatever its live
    /// work implies, which is `Amarelo` if orders queued in the meantime
    pub async fn finish_maintenance(
        &self,
        actor: &Actor,
        maintenance_id: Uuid,
    ) -> FloorResult<MaintenanceWindow> {
        actor.require(Permission::ManageMaintenance)?;

        self.with_conflict_retry("finish_maintenance", || {
            self.try_finish_maintenance(actor, maintenance_id)
        })
        .await
    }

    async fn try_finish_maintenance(
        &self,
        actor: &Actor,
        maintenance_id: Uuid,
    ) -> FloorResult<MaintenanceWindow> {
        let mut window: Versioned<MaintenanceWindow> = fetch(self.store.as_ref(), maintenance_id)
            .await?
            .ok_or_else(|| FloorError::not_found(Collection::MaintenanceWindows, maintenance_id))?;

        let target = maintenance_target(maintenance_id, window.record.status, MaintenanceEvent::Finish)?;
        let mut snapshot = MachineSnapshot::load(self.store.as_ref(), window.record.machine_id).await?;

        let now = self.now();
        window.record.status = target;
        window.record.finished_by = Some(actor.username.clone());
        window.record.finished_at = Some(now);

        let mut batch = WriteBatch::new();
        batch.update(&window)?;
        snapshot.apply_maintenance(&window.record);
        let staged = self.stage_recolor(
            &mut batch,
            &mut snapshot,
            MAINTENANCE_FINISHED,
            actor,
            RelatedIds::maintenance(maintenance_id),
            now,
        )?;

        self.commit_recolors(batch, &[staged], actor).await?;
        Ok(window.into_inner())
    }
}
