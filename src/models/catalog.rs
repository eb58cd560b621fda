use mongodb::bson::{oid::ObjectId, to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::store::Entity;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Material,
    Capacity,
    Origin,
    Destination,
    CargoType,
    VehicleType,
}

/// Lookup value offered to report entry. Report lines copy the display value,
/// so catalog edits never rewrite existing reports.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub kind: CatalogKind,
    pub name: String,
    pub value: Option<f64>,
    pub active: bool,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogRequest {
    pub name: String,
    pub value: Option<f64>,
    pub active: Option<bool>,
}

impl Entity for CatalogEntry {
    const COLLECTION: &'static str = "catalogs";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
}

impl CatalogKind {
    pub fn to_bson(self) -> Bson {
        to_bson(&self).unwrap_or(Bson::Null)
    }
}

impl CatalogRequest {
    pub fn into_entry(self, _id: ObjectId, kind: CatalogKind) -> Result<CatalogEntry, Vec<String>> {
        let mut issues: Vec<String> = Vec::new();
        if self.name.trim().is_empty() {
            issues.push("CATALOG_ENTRY_MUST_HAVE_NAME".to_string());
        }
        if kind == CatalogKind::Capacity && !self.value.is_some_and(|value| value > 0.0) {
            issues.push("CAPACITY_MUST_HAVE_POSITIVE_VALUE".to_string());
        }
        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(CatalogEntry {
            _id: Some(_id),
            kind,
            name: self.name.trim().to_string(),
            value: self.value,
            active: self.active.unwrap_or(true),
        })
    }
}
