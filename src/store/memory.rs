//! In-memory entity store.
//!
//! Documents sit behind a single read/write lock so a committed batch is
//! never observed half-applied. Counters live in a sharded map whose entry
//! guard makes increment-and-read atomic per key.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;
use uuid::Uuid;

use super::{
    compare_json, Collection, Document, EntityStore, Filter, Patch, SortBy, SortDirection,
    StoreError, StoreResult, Write, WriteBatch, WritePrecondition,
};

#[derive(Debug, Clone)]
struct StoredDocument {
    version: u64,
    /// Insertion order, used as the sort tie-breaker
    seq: u64,
    body: Value,
}

impl StoredDocument {
    fn to_document(&self, id: Uuid) -> Document {
        Document {
            id,
            version: self.version,
            body: self.body.clone(),
        }
    }
}

type DocumentKey = (Collection, Uuid);

#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    documents: RwLock<HashMap<DocumentKey, StoredDocument>>,
    counters: DashMap<String, i64>,
    next_seq: AtomicU64,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a counter's current value, e.g. to continue numbering imported orders
    pub fn seed_counter(&self, counter_key: &str, value: i64) {
        self.counters.insert(counter_key.to_string(), value);
    }

    pub fn counter_value(&self, counter_key: &str) -> Option<i64> {
        self.counters.get(counter_key).map(|value| *value)
    }

    pub fn document_count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn check_precondition(
        collection: Collection,
        id: Uuid,
        current: Option<&StoredDocument>,
        precondition: WritePrecondition,
    ) -> StoreResult<()> {
        match (current, precondition) {
            (None, _) => Err(StoreError::NotFound { collection, id }),
            (Some(doc), WritePrecondition::MatchesVersion(expected)) if doc.version != expected => {
                Err(StoreError::Conflict {
                    collection,
                    id,
                    expected,
                    actual: Some(doc.version),
                })
            }
            _ => Ok(()),
        }
    }

    fn patched(current: &StoredDocument, patch: &Patch) -> StoredDocument {
        let mut body = current.body.clone();
        patch.apply_to(&mut body);
        StoredDocument {
            version: current.version + 1,
            seq: current.seq,
            body,
        }
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Document>> {
        Ok(self
            .documents
            .read()
            .get(&(collection, id))
            .map(|doc| doc.to_document(id)))
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&SortBy>,
    ) -> StoreResult<Vec<Document>> {
        let mut matched: Vec<(u64, Document)> = {
            let documents = self.documents.read();
            documents
                .iter()
                .filter(|((c, _), doc)| *c == collection && filter.matches(&doc.body))
                .map(|((_, id), doc)| (doc.seq, doc.to_document(*id)))
                .collect()
        };

        matched.sort_by(|(seq_a, a), (seq_b, b)| {
            let by_field = sort.map(|sort| {
                let ordering = compare_json(
                    a.body.get(&sort.field).unwrap_or(&Value::Null),
                    b.body.get(&sort.field).unwrap_or(&Value::Null),
                );
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
            let by_seq = match sort.map(|s| s.direction) {
                Some(SortDirection::Descending) => seq_b.cmp(seq_a),
                _ => seq_a.cmp(seq_b),
            };
            by_field.unwrap_or(std::cmp::Ordering::Equal).then(by_seq)
        });

        Ok(matched.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn insert(&self, collection: Collection, id: Uuid, body: Value) -> StoreResult<Document> {
        let mut documents = self.documents.write();
        if documents.contains_key(&(collection, id)) {
            return Err(StoreError::DuplicateId { collection, id });
        }
        let stored = StoredDocument {
            version: 1,
            seq: self.next_seq(),
            body,
        };
        let document = stored.to_document(id);
        documents.insert((collection, id), stored);
        Ok(document)
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Patch,
        precondition: WritePrecondition,
    ) -> StoreResult<Document> {
        let mut documents = self.documents.write();
        let current = documents.get(&(collection, id));
        Self::check_precondition(collection, id, current, precondition)?;
        let current = current.ok_or(StoreError::NotFound { collection, id })?;

        let updated = Self::patched(current, &patch);
        let document = updated.to_document(id);
        documents.insert((collection, id), updated);
        Ok(document)
    }

    async fn increment_and_get(&self, counter_key: &str) -> StoreResult<i64> {
        let mut entry = self.counters.entry(counter_key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut documents = self.documents.write();

        // Stage every write against an overlay first; nothing touches the
        // live map until the whole batch has validated.
        let mut staged: HashMap<DocumentKey, StoredDocument> = HashMap::new();
        let mut order: Vec<DocumentKey> = Vec::with_capacity(batch.len());

        for write in batch.into_writes() {
            let key = write.target();
            let (collection, id) = key;
            let current = staged.get(&key).or_else(|| documents.get(&key)).cloned();

            let next = match write {
                Write::Insert { body, .. } => {
                    if current.is_some() {
                        return Err(StoreError::DuplicateId { collection, id });
                    }
                    StoredDocument {
                        version: 1,
                        seq: self.next_seq(),
                        body,
                    }
                }
                Write::Update {
                    patch,
                    precondition,
                    ..
                } => {
                    Self::check_precondition(collection, id, current.as_ref(), precondition)?;
                    match current {
                        Some(current) => Self::patched(&current, &patch),
                        None => return Err(StoreError::NotFound { collection, id }),
                    }
                }
            };

            if !staged.contains_key(&key) {
                order.push(key);
            }
            staged.insert(key, next);
        }

        trace!(writes = order.len(), "committing in-memory batch");
        for key in order {
            if let Some(doc) = staged.remove(&key) {
                documents.insert(key, doc);
            }
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
