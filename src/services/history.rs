use std::sync::Arc;

use mongodb::bson::{doc, oid::ObjectId};

use crate::{
    models::report_modification::ReportModification,
    store::{Query, Repository, StoreError},
};

/// Append-only log of report edits. Entries are only ever removed together
/// with the report they describe.
#[derive(Clone)]
pub struct ChangeHistory {
    modifications: Arc<dyn Repository<ReportModification>>,
}

impl ChangeHistory {
    pub fn new(modifications: Arc<dyn Repository<ReportModification>>) -> Self {
        Self { modifications }
    }

    pub async fn record_modification(
        &self,
        modification: &ReportModification,
    ) -> Result<ObjectId, StoreError> {
        self.modifications.insert(modification).await
    }
    pub async fn list_modifications(
        &self,
        report_id: &ObjectId,
    ) -> Result<Vec<ReportModification>, StoreError> {
        self.modifications
            .find_many(
                Query::filter(doc! { "report_id": *report_id }).sort(doc! { "time": 1, "_id": 1 }),
            )
            .await
    }
    pub async fn drop_report(&self, report_id: &ObjectId) -> Result<u64, StoreError> {
        self.modifications
            .delete_many(doc! { "report_id": *report_id })
            .await
    }
}
