use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod memory;
pub mod mongo;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;

/// A document type stored in its own collection and keyed by `_id`.
pub trait Entity: Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> Option<ObjectId>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("serialization failed: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),
    #[error("deserialization failed: {0}")]
    Deserialization(#[from] mongodb::bson::de::Error),
    #[error("document has no _id")]
    MissingId,
    #[error("duplicate _id {0}")]
    DuplicateKey(ObjectId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default, Clone)]
pub struct Query {
    pub filter: Document,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn filter(filter: Document) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }
    /// Restricts returned documents to the listed top-level fields plus `_id`.
    pub fn project(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
    pub fn page(mut self, skip: u64, limit: i64) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }
}

/// Collection-level persistence port. Filters are plain equality documents;
/// dotted paths descend into sub-documents and arrays the way MongoDB does.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn insert(&self, item: &T) -> Result<ObjectId, StoreError>;
    async fn replace(&self, item: &T) -> Result<bool, StoreError>;
    /// `$set` on a single document; the only write path that touches part of a record.
    async fn set_fields(&self, _id: &ObjectId, fields: Document) -> Result<bool, StoreError>;
    async fn find_by_id(&self, _id: &ObjectId) -> Result<Option<T>, StoreError>;
    async fn find_many(&self, query: Query) -> Result<Vec<T>, StoreError>;
    /// Raw documents, for reads that only need part of each record.
    async fn find_documents(&self, query: Query) -> Result<Vec<Document>, StoreError>;
    async fn count(&self, filter: Document) -> Result<u64, StoreError>;
    async fn delete_by_id(&self, _id: &ObjectId) -> Result<u64, StoreError>;
    async fn delete_many(&self, filter: Document) -> Result<u64, StoreError>;
}
