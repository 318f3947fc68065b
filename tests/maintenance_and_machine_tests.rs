//! Maintenance precedence, activation toggles and floor seeding

mod common;

use std::sync::Arc;

use common::{BobbinLotBuilder, TestFloor};
use floor_core::constants::transitions::{
    MACHINE_DEACTIVATED, MACHINE_REACTIVATED, MAINTENANCE_FINISHED, MAINTENANCE_STARTED,
};
use floor_core::layout::{default_layouts, FloorLayout, GROUP_16_SPINDLES, GROUP_32_SPINDLES};
use floor_core::models::{Machine, MachineAllocation, MachineColor, MaintenanceStatus};
use floor_core::FloorError;

#[tokio::test]
async fn test_maintenance_outranks_queued_work_until_finished() {
    let floor = TestFloor::new();
    let machine = floor.machine("CD1").await;

    let window = floor
        .manager
        .start_maintenance(&floor.external, machine.id, "troca de correia")
        .await
        .unwrap();
    assert_eq!(window.status, MaintenanceStatus::Active);
    assert_eq!(floor.color(&machine).await, MachineColor::Azul);

    let lot = floor
        .manager
        .create_bobbin_lot(&floor.admin, BobbinLotBuilder::new("L-1").build())
        .await
        .unwrap();
    floor
        .manager
        .allocate_lot_to_machines(&floor.admin, lot.id, &[MachineAllocation::new(machine.id, 4)])
        .await
        .unwrap();
    assert_eq!(floor.color(&machine).await, MachineColor::Azul);

    floor.tick();
    let finished = floor
        .manager
        .finish_maintenance(&floor.external, window.id)
        .await
        .unwrap();
    assert_eq!(finished.status, MaintenanceStatus::Finished);
    assert_eq!(finished.finished_by.as_deref(), Some("externo"));
    assert_eq!(floor.color(&machine).await, MachineColor::Amarelo);

    let history = floor.manager.list_history(machine.id).await.unwrap();
    let started = history
        .iter()
        .find(|h| h.transition == MAINTENANCE_STARTED)
        .unwrap();
    assert_eq!(started.related_maintenance_id, Some(window.id));
    assert_eq!(history.last().unwrap().transition, MAINTENANCE_FINISHED);
}

#[tokio::test]
async fn test_maintenance_needs_an_idle_machine() {
    let floor = TestFloor::new();
    let machine = floor.machine("CD2").await;
    floor
        .manager
        .start_maintenance(&floor.external, machine.id, "lubrificacao")
        .await
        .unwrap();

    let err = floor
        .manager
        .start_maintenance(&floor.external, machine.id, "segunda janela")
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            FloorError::MachineUnavailable {
                color: MachineColor::Azul,
                ..
            }
        ),
        "{err:?}"
    );

    let err = floor
        .manager
        .start_maintenance(&floor.external, machine.id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, FloorError::InvalidInput(_)));
}

#[tokio::test]
async fn test_finishing_twice_is_an_invalid_transition() {
    let floor = TestFloor::new();
    let machine = floor.machine("CD3").await;
    let window = floor
        .manager
        .start_maintenance(&floor.admin, machine.id, "inspecao")
        .await
        .unwrap();
    floor.manager.finish_maintenance(&floor.admin, window.id).await.unwrap();

    let err = floor
        .manager
        .finish_maintenance(&floor.admin, window.id)
        .await
        .unwrap_err();
    assert!(matches!(err, FloorError::InvalidTransition { .. }), "{err:?}");
    assert_eq!(floor.color(&machine).await, MachineColor::Verde);
    assert_eq!(
        floor.manager.list_maintenance(Some(machine.id)).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_deactivation_overrides_and_reactivation_rederives() {
    let floor = TestFloor::new();
    let machine = floor.machine("U1").await;
    let lot = floor
        .manager
        .create_bobbin_lot(&floor.admin, BobbinLotBuilder::new("L-2").build())
        .await
        .unwrap();
    floor
        .manager
        .allocate_lot_to_machines(&floor.admin, lot.id, &[MachineAllocation::new(machine.id, 2)])
        .await
        .unwrap();

    let toggled = floor
        .manager
        .toggle_machine_active(&floor.admin, machine.id)
        .await
        .unwrap();
    assert!(!toggled.active);
    assert_eq!(toggled.color, MachineColor::Desativada);

    let other = floor
        .manager
        .create_bobbin_lot(&floor.admin, BobbinLotBuilder::new("L-3").build())
        .await
        .unwrap();
    let err = floor
        .manager
        .allocate_lot_to_machines(&floor.admin, other.id, &[MachineAllocation::new(machine.id, 1)])
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            FloorError::MachineUnavailable {
                color: MachineColor::Desativada,
                ..
            }
        ),
        "{err:?}"
    );

    let toggled = floor
        .manager
        .toggle_machine_active(&floor.admin, machine.id)
        .await
        .unwrap();
    assert!(toggled.active);
    assert_eq!(toggled.color, MachineColor::Amarelo);

    let transitions: Vec<_> = floor
        .manager
        .list_history(machine.id)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.transition)
        .collect();
    assert!(transitions.contains(&MACHINE_DEACTIVATED.to_string()));
    assert_eq!(transitions.last().map(String::as_str), Some(MACHINE_REACTIVATED));
}

#[tokio::test]
async fn test_only_admins_manage_machines() {
    let floor = TestFloor::new();
    let machine = floor.machine("N1").await;

    for actor in [&floor.internal, &floor.external] {
        let err = floor
            .manager
            .toggle_machine_active(actor, machine.id)
            .await
            .unwrap_err();
        assert!(matches!(err, FloorError::Forbidden { .. }));

        let err = floor
            .manager
            .register_machine(actor, "N2", GROUP_32_SPINDLES)
            .await
            .unwrap_err();
        assert!(matches!(err, FloorError::Forbidden { .. }));
    }
}

#[tokio::test]
async fn test_machine_codes_are_unique_per_group() {
    let floor = TestFloor::new();
    floor.machine("CD1").await;

    let err = floor
        .manager
        .register_machine(&floor.admin, "CD1", GROUP_16_SPINDLES)
        .await
        .unwrap_err();
    assert!(matches!(err, FloorError::InvalidInput(_)));

    floor
        .manager
        .register_machine(&floor.admin, "CD1", GROUP_32_SPINDLES)
        .await
        .unwrap();
    assert_eq!(floor.manager.list_machines(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_floor_seeds_once() {
    let floor = TestFloor::new();
    let layouts = default_layouts();

    let created = floor
        .manager
        .initialize_floor(&floor.admin, &layouts)
        .await
        .unwrap();
    assert_eq!(created, 52 + 67);

    let sixteen = floor
        .manager
        .list_machines(Some(GROUP_16_SPINDLES))
        .await
        .unwrap();
    assert_eq!(sixteen.len(), 52);
    assert!(sixteen.iter().all(|m| m.active && m.color == MachineColor::Verde));

    let again = floor
        .manager
        .initialize_floor(&floor.admin, &[FloorLayout::new("extra").with_series("X", 3)])
        .await
        .unwrap();
    assert_eq!(again, 0);
    assert_eq!(floor.manager.list_machines(None).await.unwrap().len(), 119);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_of_one_code_admit_exactly_one() {
    for round in 0..20 {
        let floor = TestFloor::new();
        let code = format!("R{round}");

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let manager = Arc::clone(&floor.manager);
                let admin = floor.admin.clone();
                let code = code.clone();
                tokio::spawn(async move {
                    manager
                        .register_machine(&admin, &code, GROUP_16_SPINDLES)
                        .await
                })
            })
            .collect();

        let mut registered = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(machine) => registered.push(machine),
                Err(FloorError::InvalidInput(_)) => {}
                Err(other) => panic!("round {round}: unexpected error: {other:?}"),
            }
        }

        assert_eq!(registered.len(), 1, "round {round}");
        assert_eq!(registered[0].id, Machine::derive_id(GROUP_16_SPINDLES, &code));
        assert_eq!(floor.manager.list_machines(None).await.unwrap().len(), 1);
        assert_eq!(
            floor.manager.list_history(registered[0].id).await.unwrap().len(),
            1
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_seeders_initialize_the_floor_once() {
    for _ in 0..10 {
        let floor = TestFloor::new();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let manager = Arc::clone(&floor.manager);
                let admin = floor.admin.clone();
                tokio::spawn(async move {
                    manager
                        .initialize_floor(&admin, &default_layouts())
                        .await
                })
            })
            .collect();

        let mut created = Vec::new();
        for handle in handles {
            created.push(handle.await.unwrap().unwrap());
        }

        created.sort_unstable();
        assert_eq!(created, vec![0, 0, 52 + 67]);
        assert_eq!(floor.manager.list_machines(None).await.unwrap().len(), 119);
    }
}
