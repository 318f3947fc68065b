//! # Entity Store
//!
//! Narrow document-store interface the floor core persists through.
//!
//! Records live as JSON documents grouped by [`Collection`]. Every document
//! carries a store-managed `version` bumped on each update, which is what
//! the lifecycle manager's optimistic concurrency keys on.
//!
//! [`EntityStore::commit`] is the atomicity boundary: a [`WriteBatch`] of
//! inserts and version-guarded updates is applied all-or-nothing. A failed
//! precondition aborts the batch with [`StoreError::Conflict`].

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod records;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryEntityStore;
#[cfg(feature = "postgres")]
pub use postgres::PgEntityStore;
pub use records::{fetch, fetch_many, insert_record, Record, Versioned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Machines,
    WorkOrders,
    ProductionOrders,
    MaintenanceWindows,
    BobbinLots,
    StatusHistory,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Machines => "machines",
            Self::WorkOrders => "work_orders",
            Self::ProductionOrders => "production_orders",
            Self::MaintenanceWindows => "maintenance_windows",
            Self::BobbinLots => "bobbin_lots",
            Self::StatusHistory => "status_history",
        }
    }

    /// Singular name used in error messages
    pub fn entity_name(&self) -> &'static str {
        match self {
            Self::Machines => "machine",
            Self::WorkOrders => "work order",
            Self::ProductionOrders => "production order",
            Self::MaintenanceWindows => "maintenance window",
            Self::BobbinLots => "bobbin lot",
            Self::StatusHistory => "status history record",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("{collection} document {id} not found")]
    NotFound { collection: Collection, id: Uuid },

    #[error("Version conflict on {collection} {id}: expected {expected}, found {actual:?}")]
    Conflict {
        collection: Collection,
        id: Uuid,
        expected: u64,
        actual: Option<u64>,
    },

    #[error("{collection} document {id} already exists")]
    DuplicateId { collection: Collection, id: Uuid },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A stored document with its store-managed version
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub version: u64,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    fn matches(&self, body: &Value) -> bool {
        let actual = body.get(&self.field);
        match self.op {
            FilterOp::Eq => actual == Some(&self.value),
            FilterOp::Ne => actual != Some(&self.value),
        }
    }
}

/// Conjunction of field comparisons against top-level document fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<FieldFilter>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(FieldFilter {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(FieldFilter {
            field: field.into(),
            op: FilterOp::Ne,
            value: value.into(),
        });
        self
    }

    pub fn clauses(&self) -> &[FieldFilter] {
        &self.clauses
    }

    pub fn matches(&self, body: &Value) -> bool {
        self.clauses.iter().all(|clause| clause.matches(body))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-field ordering; ties fall back to insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Field-level `$set` applied by [`EntityStore::update_fields`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Serialize) -> StoreResult<Self> {
        self.fields.insert(field.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Patch overwriting every field of a serialized record
    pub fn from_record<T: Serialize>(record: &T) -> StoreResult<Self> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(StoreError::Serialization(format!(
                "record must serialize to an object, got {other}"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Merge this patch into a document body
    pub fn apply_to(&self, body: &mut Value) {
        if let Value::Object(target) = body {
            for (field, value) in &self.fields {
                target.insert(field.clone(), value.clone());
            }
        }
    }
}

/// Condition an update must satisfy to be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePrecondition {
    /// Apply only if the document's version matches
    MatchesVersion(u64),
    /// Apply unconditionally (last writer wins)
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Insert {
        collection: Collection,
        id: Uuid,
        body: Value,
    },
    Update {
        collection: Collection,
        id: Uuid,
        patch: Patch,
        precondition: WritePrecondition,
    },
}

impl Write {
    pub fn target(&self) -> (Collection, Uuid) {
        match self {
            Write::Insert { collection, id, .. } | Write::Update { collection, id, .. } => {
                (*collection, *id)
            }
        }
    }
}

/// Writes committed together or not at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) {
        self.writes.push(write);
    }

    pub fn insert<T: Record>(&mut self, record: &T) -> StoreResult<()> {
        self.writes.push(Write::Insert {
            collection: T::COLLECTION,
            id: record.id(),
            body: serde_json::to_value(record)?,
        });
        Ok(())
    }

    /// Overwrite a record, guarded by the version it was read at
    pub fn update<T: Record>(&mut self, versioned: &Versioned<T>) -> StoreResult<()> {
        self.writes.push(Write::Update {
            collection: T::COLLECTION,
            id: versioned.record.id(),
            patch: Patch::from_record(&versioned.record)?,
            precondition: WritePrecondition::MatchesVersion(versioned.version),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>>;

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&SortBy>,
    ) -> StoreResult<Vec<Document>>;

    async fn insert(&self, collection: Collection, id: Uuid, body: Value) -> StoreResult<Document>;

    async fn update_fields(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Patch,
        precondition: WritePrecondition,
    ) -> StoreResult<Document>;

    /// Atomically increment a counter and return the new value; a missing
    /// counter is created at 1
    async fn increment_and_get(&self, counter_key: &str) -> StoreResult<i64>;

    /// Apply every write in the batch or none of them
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Ordering over JSON values used by sorts: null < bool < number < string,
/// numbers compared numerically
pub fn compare_json(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or(f64::NAN)
                .partial_cmp(&y.as_f64().unwrap_or(f64::NAN))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_eq_and_ne() {
        let body = json!({"machine_id": "m-1", "status": "pendente"});

        assert!(Filter::new().eq("machine_id", "m-1").matches(&body));
        assert!(!Filter::new().eq("machine_id", "m-2").matches(&body));
        assert!(Filter::new()
            .eq("machine_id", "m-1")
            .ne("status", "finalizado")
            .matches(&body));
        assert!(!Filter::new().ne("status", "pendente").matches(&body));
    }

    #[test]
    fn test_ne_matches_missing_field() {
        let body = json!({"status": "pendente"});
        assert!(Filter::new().ne("lot_id", "x").matches(&body));
        assert!(!Filter::new().eq("lot_id", "x").matches(&body));
    }

    #[test]
    fn test_patch_merges_into_body() {
        let mut body = json!({"id": "a", "status": "pendente", "notes": "keep"});
        let patch = Patch::new()
            .set("status", "em_producao")
            .unwrap()
            .set("started_at", 42)
            .unwrap();
        patch.apply_to(&mut body);

        assert_eq!(body["status"], "em_producao");
        assert_eq!(body["started_at"], 42);
        assert_eq!(body["notes"], "keep");
    }

    #[test]
    fn test_patch_from_non_object_is_rejected() {
        assert!(Patch::from_record(&"just a string").is_err());
    }

    #[test]
    fn test_compare_json_orders_numbers_numerically() {
        assert_eq!(compare_json(&json!(9), &json!(10)), Ordering::Less);
        assert_eq!(compare_json(&json!("9"), &json!("10")), Ordering::Greater);
        assert_eq!(compare_json(&json!(null), &json!(1)), Ordering::Less);
        assert_eq!(compare_json(&json!(1.5), &json!(1.25)), Ordering::Greater);
    }
}
