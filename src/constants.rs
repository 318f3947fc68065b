//! # System Constants
//!
//! Transition names recorded in status history, store keys, and the
//! operational defaults the configuration layer falls back to.

/// Transition names stamped on every status history record
pub mod transitions {
    pub const MACHINE_REGISTERED: &str = "machine.registered";
    pub const MACHINE_DEACTIVATED: &str = "machine.deactivated";
    pub const MACHINE_REACTIVATED: &str = "machine.reactivated";

    pub const WORK_ORDER_CREATED: &str = "work_order.created";
    pub const WORK_ORDER_STARTED: &str = "work_order.started";
    pub const WORK_ORDER_FINISHED: &str = "work_order.finished";

    pub const MAINTENANCE_STARTED: &str = "maintenance.started";
    pub const MAINTENANCE_FINISHED: &str = "maintenance.finished";

    pub const LOT_ALLOCATED: &str = "bobbin_lot.allocated";
}

/// Store-level keys and field names shared by every backend
pub mod store {
    /// Counter backing production order numbers
    pub const ORDER_NUMBER_COUNTER: &str = "production_order_number";

    pub const FIELD_MACHINE_ID: &str = "machine_id";
    pub const FIELD_STATUS: &str = "status";
    pub const FIELD_CREATED_AT: &str = "created_at";
    pub const FIELD_CHANGED_AT: &str = "changed_at";
    pub const FIELD_DUE_DATE: &str = "due_date";
    pub const FIELD_LAYOUT_GROUP: &str = "layout_group";
    pub const FIELD_CODE: &str = "code";
}

/// Defaults applied when configuration leaves a value unset
pub mod defaults {
    /// Zero-padded width of production order numbers ("0001")
    pub const ORDER_NUMBER_MIN_WIDTH: usize = 4;
    pub const MAX_CONFLICT_RETRIES: u32 = 5;
    pub const RETRY_BACKOFF_MS: u64 = 2;
    /// Upper bound on the exponent used for retry backoff
    pub const RETRY_BACKOFF_MAX_SHIFT: u32 = 6;
    pub const DATABASE_MAX_CONNECTIONS: u32 = 10;
    pub const DATABASE_ACQUIRE_TIMEOUT_MS: u64 = 5_000;
    pub const LOG_LEVEL: &str = "info";
}

/// Actor recorded for operations issued by the system itself (floor seeding)
pub const SYSTEM_ACTOR: &str = "system";
