use std::{cmp::Ordering, marker::PhantomData};

use async_trait::async_trait;
use indexmap::IndexMap;
use mongodb::bson::{from_document, oid::ObjectId, to_document, Bson, Document};
use tokio::sync::RwLock;

use super::{Entity, Query, Repository, StoreError};

/// Keeps every document as BSON so reads go through the same serde path as the
/// MongoDB driver. Insertion order is preserved and used as the tie breaker when sorting.
pub struct MemoryRepository<T: Entity> {
    documents: RwLock<IndexMap<ObjectId, Document>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            documents: RwLock::new(IndexMap::new()),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

fn value_matches(value: &Bson, path: &[&str], expected: &Bson) -> bool {
    match (path.split_first(), value) {
        (None, Bson::Array(items)) => value == expected || items.iter().any(|item| item == expected),
        (None, _) => value == expected,
        (Some(_), Bson::Array(items)) => items
            .iter()
            .any(|item| value_matches(item, path, expected)),
        (Some((head, rest)), Bson::Document(document)) => document
            .get(*head)
            .is_some_and(|value| value_matches(value, rest, expected)),
        _ => false,
    }
}

fn document_matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        let path: Vec<&str> = key.split('.').collect();
        match path.split_first() {
            Some((head, rest)) => match document.get(*head) {
                Some(value) => value_matches(value, rest, expected),
                None => expected == &Bson::Null,
            },
            None => false,
        }
    })
}

fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    fn number(value: &Bson) -> Option<f64> {
        match value {
            Bson::Double(value) => Some(*value),
            Bson::Int32(value) => Some(f64::from(*value)),
            Bson::Int64(value) => Some(*value as f64),
            _ => None,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Bson::String(a), Bson::String(b)) => a.cmp(b),
            (Bson::DateTime(a), Bson::DateTime(b)) => a.cmp(b),
            (Bson::ObjectId(a), Bson::ObjectId(b)) => a.cmp(b),
            (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
            (Bson::Null, Bson::Null) => Ordering::Equal,
            (Bson::Null, _) => Ordering::Less,
            (_, Bson::Null) => Ordering::Greater,
            _ => match (number(a), number(b)) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        },
    }
}

fn project_document(document: &Document, projection: &Document) -> Document {
    document
        .iter()
        .filter(|(key, _)| key.as_str() == "_id" || projection.contains_key(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn sort_documents(documents: &mut [&Document], sort: &Document) {
    documents.sort_by(|a, b| {
        for (key, direction) in sort.iter() {
            let descending = match direction {
                Bson::Int32(direction) => *direction < 0,
                Bson::Int64(direction) => *direction < 0,
                _ => false,
            };
            let ordering = compare_bson(a.get(key), b.get(key));
            let ordering = if descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn insert(&self, item: &T) -> Result<ObjectId, StoreError> {
        let mut document = to_document(item)?;
        let _id = match document.get_object_id("_id") {
            Ok(_id) => _id,
            Err(_) => {
                let _id = ObjectId::new();
                document.insert("_id", _id);
                _id
            }
        };

        let mut documents = self.documents.write().await;
        if documents.contains_key(&_id) {
            return Err(StoreError::DuplicateKey(_id));
        }
        documents.insert(_id, document);
        Ok(_id)
    }
    async fn replace(&self, item: &T) -> Result<bool, StoreError> {
        let _id = item.id().ok_or(StoreError::MissingId)?;
        let document = to_document(item)?;

        let mut documents = self.documents.write().await;
        match documents.get_mut(&_id) {
            Some(stored) => {
                *stored = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }
    async fn set_fields(&self, _id: &ObjectId, fields: Document) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(_id) {
            Some(stored) => {
                for (key, value) in fields {
                    stored.insert(key, value);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
    async fn find_by_id(&self, _id: &ObjectId) -> Result<Option<T>, StoreError> {
        let documents = self.documents.read().await;
        match documents.get(_id) {
            Some(document) => Ok(Some(from_document::<T>(document.clone())?)),
            None => Ok(None),
        }
    }
    async fn find_many(&self, query: Query) -> Result<Vec<T>, StoreError> {
        self.find_documents(query)
            .await?
            .into_iter()
            .map(|document| from_document::<T>(document).map_err(StoreError::from))
            .collect()
    }
    async fn find_documents(&self, query: Query) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read().await;
        let mut matched: Vec<&Document> = documents
            .values()
            .filter(|document| document_matches(document, &query.filter))
            .collect();

        if let Some(sort) = &query.sort {
            sort_documents(&mut matched, sort);
        }

        let skip = query.skip.unwrap_or(0) as usize;
        let limit = match query.limit {
            Some(limit) if limit > 0 => limit as usize,
            _ => usize::MAX,
        };

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| match &query.projection {
                Some(projection) => project_document(document, projection),
                None => document.clone(),
            })
            .collect())
    }
    async fn count(&self, filter: Document) -> Result<u64, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .filter(|document| document_matches(document, &filter))
            .count() as u64)
    }
    async fn delete_by_id(&self, _id: &ObjectId) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        Ok(documents.shift_remove(_id).map_or(0, |_| 1))
    }
    async fn delete_many(&self, filter: Document) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, document| !document_matches(document, &filter));
        Ok((before - documents.len()) as u64)
    }
}
