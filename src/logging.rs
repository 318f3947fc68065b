//! # Structured Logging Module
//!
//! Console logging for the floor core, human-readable or JSON, plus the
//! structured event helpers the lifecycle manager emits on every committed
//! transition.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::loader::ConfigManager;
use crate::config::LoggingConfig;
use crate::models::MachineColor;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let directive = filter_directive(&config.level, std::env::var("RUST_LOG").ok());

        let console = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        };

        // Use try_init to avoid panic if global subscriber already set
        if tracing_subscriber::registry()
            .with(console)
            .try_init()
            .is_err()
        {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            environment = %environment,
            filter = %directive,
            json = config.json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// `RUST_LOG` wins over the configured level when set and non-empty
fn filter_directive(configured: &str, rust_log: Option<String>) -> String {
    match rust_log {
        Some(value) if !value.trim().is_empty() => value,
        _ if configured.trim().is_empty() => crate::constants::defaults::LOG_LEVEL.to_string(),
        _ => configured.to_string(),
    }
}

/// Log a committed machine transition
pub fn log_transition(
    transition: &str,
    machine_id: Uuid,
    machine_code: &str,
    previous: MachineColor,
    new: MachineColor,
    actor: &str,
) {
    tracing::info!(
        transition = %transition,
        machine_id = %machine_id,
        machine_code = %machine_code,
        previous_color = %previous,
        new_color = %new,
        actor = %actor,
        "🏭 MACHINE_TRANSITION"
    );
}

/// Log a lot allocation across machines
pub fn log_allocation(lot_id: Uuid, machines: usize, work_orders: usize, actor: &str) {
    tracing::info!(
        lot_id = %lot_id,
        machines = machines,
        work_orders = work_orders,
        actor = %actor,
        "🧵 LOT_ALLOCATION"
    );
}

/// Log an optimistic-concurrency retry
pub fn log_retry(operation: &str, attempt: u32, max_retries: u32, error: &str) {
    tracing::warn!(
        operation = %operation,
        attempt = attempt,
        max_retries = max_retries,
        error = %error,
        "🔁 CONFLICT_RETRY"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        "❌ ERROR"
    );
}
