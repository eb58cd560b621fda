use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Entity;

/// One audit entry: every top-level field an update changed, with who and when.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReportModification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub report_id: ObjectId,
    pub user_id: ObjectId,
    pub user_name: String,
    pub time: DateTime,
    pub note: Option<String>,
    pub changes: Vec<ReportFieldChange>,
}
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReportFieldChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

impl Entity for ReportModification {
    const COLLECTION: &'static str = "report_modifications";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
}
