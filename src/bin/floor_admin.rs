//! Floor administration: load configuration, prepare the store and seed
//! the default machine layout.
//!
//! Usage: `floor-admin [config_dir]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use floor_core::config::loader::ConfigManager;
use floor_core::config::StoreBackend;
use floor_core::identity::Actor;
use floor_core::layout::default_layouts;
use floor_core::lifecycle::LifecycleManager;
use floor_core::logging::init_structured_logging;
use floor_core::store::{EntityStore, InMemoryEntityStore};
use floor_core::{constants::SYSTEM_ACTOR, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    let config_dir = std::env::args().nth(1).map(PathBuf::from);
    let manager = ConfigManager::load_from_directory(config_dir)
        .context("failed to load floor configuration")?;
    let config = manager.config();

    init_structured_logging(&config.logging);

    let store = connect_store(config).await?;
    let lifecycle = LifecycleManager::from_config(store.clone(), Arc::new(SystemClock), config);

    let created = lifecycle
        .initialize_floor(&Actor::admin(SYSTEM_ACTOR), &default_layouts())
        .await
        .context("failed to seed the floor layout")?;

    let machines = lifecycle.list_machines(None).await?;
    println!("✅ Floor ready on {} store", store.backend_name());
    println!("   - Environment: {}", manager.environment());
    println!("   - Machines created now: {created}");
    println!("   - Machines on floor: {}", machines.len());
    Ok(())
}

async fn connect_store(config: &floor_core::FloorConfig) -> Result<Arc<dyn EntityStore>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryEntityStore::new())),
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            let store = floor_core::store::PgEntityStore::connect(&config.store)
                .await
                .context("failed to connect to postgres")?;
            store.migrate().await.context("failed to run schema migration")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => anyhow::bail!("floor-admin was built without the postgres feature"),
    }
}
