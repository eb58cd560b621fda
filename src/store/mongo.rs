use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::FindOptions,
    Collection, Database,
};

use super::{Entity, Query, Repository, StoreError};

pub struct MongoRepository<T: Entity> {
    collection: Collection<T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<T>(T::COLLECTION),
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MongoRepository<T> {
    async fn insert(&self, item: &T) -> Result<ObjectId, StoreError> {
        let result = self.collection.insert_one(item, None).await?;
        result.inserted_id.as_object_id().ok_or(StoreError::MissingId)
    }
    async fn replace(&self, item: &T) -> Result<bool, StoreError> {
        let _id = item.id().ok_or(StoreError::MissingId)?;
        let result = self
            .collection
            .replace_one(doc! { "_id": _id }, item, None)
            .await?;
        Ok(result.matched_count > 0)
    }
    async fn set_fields(&self, _id: &ObjectId, fields: Document) -> Result<bool, StoreError> {
        let result = self
            .collection
            .update_one(doc! { "_id": *_id }, doc! { "$set": fields }, None)
            .await?;
        Ok(result.matched_count > 0)
    }
    async fn find_by_id(&self, _id: &ObjectId) -> Result<Option<T>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": *_id }, None).await?)
    }
    async fn find_many(&self, query: Query) -> Result<Vec<T>, StoreError> {
        let mut options = FindOptions::default();
        options.sort = query.sort;
        options.skip = query.skip;
        options.limit = query.limit;

        let cursor = self.collection.find(query.filter, options).await?;
        Ok(cursor.try_collect::<Vec<T>>().await?)
    }
    async fn find_documents(&self, query: Query) -> Result<Vec<Document>, StoreError> {
        let mut options = FindOptions::default();
        options.sort = query.sort;
        options.projection = query.projection;
        options.skip = query.skip;
        options.limit = query.limit;

        let cursor = self
            .collection
            .clone_with_type::<Document>()
            .find(query.filter, options)
            .await?;
        Ok(cursor.try_collect::<Vec<Document>>().await?)
    }
    async fn count(&self, filter: Document) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(filter, None).await?)
    }
    async fn delete_by_id(&self, _id: &ObjectId) -> Result<u64, StoreError> {
        let result = self.collection.delete_one(doc! { "_id": *_id }, None).await?;
        Ok(result.deleted_count)
    }
    async fn delete_many(&self, filter: Document) -> Result<u64, StoreError> {
        let result = self.collection.delete_many(filter, None).await?;
        Ok(result.deleted_count)
    }
}
