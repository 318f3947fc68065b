use uuid::Uuid;

use super::{require_text, LifecycleManager};
use crate::constants::store::{FIELD_CODE, FIELD_LAYOUT_GROUP};
use crate::constants::transitions::{MACHINE_DEACTIVATED, MACHINE_REACTIVATED, MACHINE_REGISTERED};
use crate::error::{FloorError, FloorResult};
use crate::history::{StatusHistoryRecorder, TransitionRecord};
use crate::identity::{Actor, Permission};
use crate::layout::FloorLayout;
use crate::logging::log_transition;
use crate::models::{Machine, RelatedIds};
use crate::state_machine::MachineSnapshot;
use crate::store::{Collection, Filter, StoreError, WriteBatch};

impl LifecycleManager {
    /// Flip a machine between active and deactivated. Deactivation forces
    /// `Desativada`; reactivation re-derives the color from live work.
    pub async fn toggle_machine_active(&self, actor: &Actor, machine_id: Uuid) -> FloorResult<Machine> {
        actor.require(Permission::ManageMachines)?;

        self.with_conflict_retry("toggle_machine_active", || {
            self.try_toggle_machine(actor, machine_id)
        })
        .await
    }

    async fn try_toggle_machine(&self, actor: &Actor, machine_id: Uuid) -> FloorResult<Machine> {
        let mut snapshot = MachineSnapshot::load(self.store.as_ref(), machine_id).await?;

        let active = !snapshot.machine.record.active;
        snapshot.machine.record.active = active;
        let transition = if active {
            MACHINE_REACTIVATED
        } else {
            MACHINE_DEACTIVATED
        };

        let now = self.now();
        let mut batch = WriteBatch::new();
        let staged = self.stage_recolor(
            &mut batch,
            &mut snapshot,
            transition,
            actor,
            RelatedIds::default(),
            now,
        )?;

        self.commit_recolors(batch, &[staged], actor).await?;
        Ok(snapshot.machine.into_inner())
    }

    /// Add a machine to a layout group. Codes are unique within a group: the
    /// lookup catches the common case and the derived machine id makes a
    /// concurrent duplicate fail at commit.
    pub async fn register_machine(
        &self,
        actor: &Actor,
        code: &str,
        layout_group: &str,
    ) -> FloorResult<Machine> {
        actor.require(Permission::ManageMachines)?;
        require_text("code", code)?;
        require_text("layout_group", layout_group)?;

        let code = code.trim();
        let layout_group = layout_group.trim();
        let existing = self
            .store
            .find_many(
                Collection::Machines,
                &Filter::new()
                    .eq(FIELD_LAYOUT_GROUP, layout_group)
                    .eq(FIELD_CODE, code),
                None,
            )
            .await?;
        if !existing.is_empty() {
            return Err(duplicate_code(code, layout_group));
        }

        let machine = Machine::new(code, layout_group, self.now());
        let mut batch = WriteBatch::new();
        self.stage_registration(&mut batch, &machine, actor)?;
        match self.store.commit(batch).await {
            Err(StoreError::DuplicateId {
                collection: Collection::Machines,
                ..
            }) => return Err(duplicate_code(code, layout_group)),
            other => other?,
        }

        log_transition(
            MACHINE_REGISTERED,
            machine.id,
            &machine.code,
            machine.color,
            machine.color,
            &actor.username,
        );
        Ok(machine)
    }

    /// Seed every machine of `layouts` when the floor has no machines yet.
    /// Returns the number of machines created; zero if the floor was
    /// already initialized, including by a seeder that committed first.
    pub async fn initialize_floor(&self, actor: &Actor, layouts: &[FloorLayout]) -> FloorResult<usize> {
        actor.require(Permission::ManageMachines)?;

        let existing = self
            .store
            .find_many(Collection::Machines, &Filter::new(), None)
            .await?;
        if !existing.is_empty() {
            tracing::info!(machines = existing.len(), "floor already initialized");
            return Ok(0);
        }

        let now = self.now();
        let mut batch = WriteBatch::new();
        let mut created = 0;
        for layout in layouts {
            for code in &layout.codes {
                let machine = Machine::new(code.as_str(), layout.group.as_str(), now);
                self.stage_registration(&mut batch, &machine, actor)?;
                created += 1;
            }
        }

        match self.store.commit(batch).await {
            Err(StoreError::DuplicateId {
                collection: Collection::Machines,
                ..
            }) => {
                tracing::info!("floor initialized concurrently");
                return Ok(0);
            }
            other => other?,
        }
        tracing::info!(
            machines = created,
            layout_groups = layouts.len(),
            actor = %actor.username,
            "floor initialized"
        );
        Ok(created)
    }

    fn stage_registration(&self, batch: &mut WriteBatch, machine: &Machine, actor: &Actor) -> FloorResult<()> {
        batch.insert(machine)?;
        batch.insert(&StatusHistoryRecorder::build(
            machine,
            &TransitionRecord {
                transition: MACHINE_REGISTERED,
                previous: machine.color,
                new: machine.color,
                actor,
                related: RelatedIds::default(),
                at: machine.updated_at,
            },
        ))?;
        Ok(())
    }
}

fn duplicate_code(code: &str, layout_group: &str) -> FloorError {
    FloorError::invalid_input(format!(
        "machine {code} already exists in layout group {layout_group}"
    ))
}
