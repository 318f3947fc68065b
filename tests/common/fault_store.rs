//! Entity store wrapper that injects failures into an in-memory store

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use uuid::Uuid;

use floor_core::store::{
    Collection, Document, EntityStore, Filter, InMemoryEntityStore, Patch, SortBy, StoreError,
    StoreResult, WriteBatch, WritePrecondition,
};

#[derive(Debug, Default)]
pub struct FaultInjectingStore {
    inner: InMemoryEntityStore,
    conflicting_commits: AtomicU32,
    commits_unavailable: AtomicBool,
    counter_unavailable: AtomicBool,
    inserts_unavailable: AtomicBool,
    commit_attempts: AtomicU32,
}

impl FaultInjectingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryEntityStore {
        &self.inner
    }

    /// Reject the next `n` commits with a version conflict
    pub fn conflict_next_commits(&self, n: u32) {
        self.conflicting_commits.store(n, Ordering::SeqCst);
    }

    pub fn set_commits_unavailable(&self, unavailable: bool) {
        self.commits_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_counter_unavailable(&self, unavailable: bool) {
        self.counter_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_inserts_unavailable(&self, unavailable: bool) {
        self.inserts_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn commit_attempts(&self) -> u32 {
        self.commit_attempts.load(Ordering::SeqCst)
    }

    fn take_conflict(&self) -> bool {
        self.conflicting_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl EntityStore for FaultInjectingStore {
    async fn find_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>> {
        self.inner.find_by_id(collection, id).await
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&SortBy>,
    ) -> StoreResult<Vec<Document>> {
        self.inner.find_many(collection, filter, sort).await
    }

    async fn insert(&self, collection: Collection, id: Uuid, body: Value) -> StoreResult<Document> {
        if self.inserts_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected insert outage".to_string()));
        }
        self.inner.insert(collection, id, body).await
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Patch,
        precondition: WritePrecondition,
    ) -> StoreResult<Document> {
        self.inner
            .update_fields(collection, id, patch, precondition)
            .await
    }

    async fn increment_and_get(&self, counter_key: &str) -> StoreResult<i64> {
        if self.counter_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected counter outage".to_string()));
        }
        self.inner.increment_and_get(counter_key).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        if self.commits_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected commit outage".to_string()));
        }
        if self.take_conflict() {
            let (collection, id) = batch
                .writes()
                .first()
                .map(|write| write.target())
                .unwrap_or((Collection::Machines, Uuid::nil()));
            return Err(StoreError::Conflict {
                collection,
                id,
                expected: 0,
                actual: None,
            });
        }
        self.inner.commit(batch).await
    }

    fn backend_name(&self) -> &'static str {
        "fault-injecting"
    }
}
