//! # PostgreSQL Entity Store
//!
//! Documents are kept in one JSONB table keyed by `(collection, id)`; counters
//! in a separate table. A batch commit runs inside a single transaction, and
//! version preconditions are enforced in the `UPDATE ... WHERE version = $n`
//! clause so a stale writer matches zero rows and the transaction is rolled
//! back.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    Collection, Document, EntityStore, Filter, FilterOp, Patch, SortBy, SortDirection, StoreError,
    StoreResult, Write, WriteBatch, WritePrecondition,
};
use crate::config::StoreConfig;

/// Schema the store expects; safe to run repeatedly
pub const MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS floor_documents (
    collection TEXT NOT NULL,
    id UUID NOT NULL,
    version BIGINT NOT NULL DEFAULT 1,
    seq BIGSERIAL NOT NULL,
    body JSONB NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS floor_documents_machine_idx
    ON floor_documents (collection, (body ->> 'machine_id'));

CREATE TABLE IF NOT EXISTS floor_counters (
    key TEXT PRIMARY KEY,
    value BIGINT NOT NULL
);
"#;

const SELECT_DOCUMENTS: &str = "SELECT id, version, body FROM floor_documents";

#[derive(Debug, Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let database_url = config.database_url.as_deref().ok_or_else(|| {
            StoreError::Unavailable("no database_url configured for postgres store".to_string())
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        info!(
            max_connections = config.max_connections,
            "Postgres entity store connected"
        );
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(MIGRATION)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("floor_documents schema ensured");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Build the `find_many` query: field filters become JSONB comparisons, the
/// sort key is followed by insertion order.
pub fn build_find_many_query(
    collection: Collection,
    filter: &Filter,
    sort: Option<&SortBy>,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SELECT_DOCUMENTS);
    query.push(" WHERE collection = ");
    query.push_bind(collection.as_str());

    for clause in filter.clauses() {
        query.push(" AND body -> ");
        query.push_bind(clause.field.clone());
        match clause.op {
            FilterOp::Eq => query.push(" = "),
            FilterOp::Ne => query.push(" IS DISTINCT FROM "),
        };
        query.push_bind(Json(clause.value.clone()));
    }

    match sort {
        Some(sort) => {
            let direction = match sort.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            query.push(" ORDER BY body -> ");
            query.push_bind(sort.field.clone());
            query.push(format!(" {direction}, seq {direction}"));
        }
        None => {
            query.push(" ORDER BY seq ASC");
        }
    }
    query
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(err.to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn version_to_i64(version: u64) -> StoreResult<i64> {
    i64::try_from(version).map_err(|_| StoreError::Backend(format!("version {version} overflows")))
}

fn row_to_document(row: &PgRow) -> StoreResult<Document> {
    let id: Uuid = row.try_get("id").map_err(map_sqlx_error)?;
    let version: i64 = row.try_get("version").map_err(map_sqlx_error)?;
    let Json(body): Json<Value> = row.try_get("body").map_err(map_sqlx_error)?;
    Ok(Document {
        id,
        version: version.max(0) as u64,
        body,
    })
}

async fn insert_in(
    conn: &mut PgConnection,
    collection: Collection,
    id: Uuid,
    body: Value,
) -> StoreResult<Document> {
    let row = sqlx::query(
        "INSERT INTO floor_documents (collection, id, version, body) VALUES ($1, $2, 1, $3) \
         ON CONFLICT (collection, id) DO NOTHING RETURNING id, version, body",
    )
    .bind(collection.as_str())
    .bind(id)
    .bind(Json(body))
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    match row {
        Some(row) => row_to_document(&row),
        None => Err(StoreError::DuplicateId { collection, id }),
    }
}

async fn update_in(
    conn: &mut PgConnection,
    collection: Collection,
    id: Uuid,
    patch: Patch,
    precondition: WritePrecondition,
) -> StoreResult<Document> {
    let expected = match precondition {
        WritePrecondition::MatchesVersion(version) => Some(version_to_i64(version)?),
        WritePrecondition::None => None,
    };

    let row = sqlx::query(
        "UPDATE floor_documents SET body = body || $3, version = version + 1 \
         WHERE collection = $1 AND id = $2 AND ($4::BIGINT IS NULL OR version = $4) \
         RETURNING id, version, body",
    )
    .bind(collection.as_str())
    .bind(id)
    .bind(Json(patch.into_value()))
    .bind(expected)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if let Some(row) = row {
        return row_to_document(&row);
    }

    // Zero rows: either the document is gone or the version moved on
    let actual: Option<i64> =
        sqlx::query_scalar("SELECT version FROM floor_documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

    match (actual, precondition) {
        (None, _) => Err(StoreError::NotFound { collection, id }),
        (Some(actual), WritePrecondition::MatchesVersion(expected)) => Err(StoreError::Conflict {
            collection,
            id,
            expected,
            actual: Some(actual.max(0) as u64),
        }),
        (Some(_), WritePrecondition::None) => Err(StoreError::Backend(format!(
            "unconditional update of {collection} {id} matched no rows"
        ))),
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn find_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, version, body FROM floor_documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&SortBy>,
    ) -> StoreResult<Vec<Document>> {
        let mut query = build_find_many_query(collection, filter, sort);
        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(row_to_document).collect()
    }

    async fn insert(&self, collection: Collection, id: Uuid, body: Value) -> StoreResult<Document> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        insert_in(&mut *conn, collection, id, body).await
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Patch,
        precondition: WritePrecondition,
    ) -> StoreResult<Document> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        update_in(&mut *conn, collection, id, patch, precondition).await
    }

    async fn increment_and_get(&self, counter_key: &str) -> StoreResult<i64> {
        sqlx::query_scalar(
            "INSERT INTO floor_counters (key, value) VALUES ($1, 1) \
             ON CONFLICT (key) DO UPDATE SET value = floor_counters.value + 1 \
             RETURNING value",
        )
        .bind(counter_key)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for write in batch.into_writes() {
            // Returning early drops `tx`, which rolls it back
            match write {
                Write::Insert {
                    collection,
                    id,
                    body,
                } => {
                    insert_in(&mut *tx, collection, id, body).await?;
                }
                Write::Update {
                    collection,
                    id,
                    patch,
                    precondition,
                } => {
                    update_in(&mut *tx, collection, id, patch, precondition).await?;
                }
            }
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
