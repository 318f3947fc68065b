//! Typed access to store documents.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{Collection, Document, EntityStore, Filter, SortBy, StoreResult};

/// A record type persisted in one collection
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
}

/// A record together with the store version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

impl<T: Record> Versioned<T> {
    pub fn from_document(document: Document) -> StoreResult<Self> {
        Ok(Self {
            version: document.version,
            record: serde_json::from_value(document.body)?,
        })
    }

    pub fn into_inner(self) -> T {
        self.record
    }
}

pub async fn fetch<T: Record>(store: &dyn EntityStore, id: Uuid) -> StoreResult<Option<Versioned<T>>> {
    store
        .find_by_id(T::COLLECTION, id)
        .await?
        .map(Versioned::from_document)
        .transpose()
}

pub async fn fetch_many<T: Record>(
    store: &dyn EntityStore,
    filter: &Filter,
    sort: Option<&SortBy>,
) -> StoreResult<Vec<Versioned<T>>> {
    store
        .find_many(T::COLLECTION, filter, sort)
        .await?
        .into_iter()
        .map(Versioned::from_document)
        .collect()
}

pub async fn insert_record<T: Record>(store: &dyn EntityStore, record: T) -> StoreResult<Versioned<T>> {
    let body = serde_json::to_value(&record)?;
    let document = store.insert(T::COLLECTION, record.id(), body).await?;
    Ok(Versioned {
        version: document.version,
        record,
    })
}
