use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::store::Entity;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Personnel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub project_id: Vec<ObjectId>,
    pub active: bool,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct PersonnelRequest {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub project_id: Vec<ObjectId>,
    pub active: Option<bool>,
}

impl Entity for Personnel {
    const COLLECTION: &'static str = "personnel";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
}

impl PersonnelRequest {
    pub fn into_personnel(self, _id: ObjectId) -> Result<Personnel, Vec<String>> {
        if self.name.trim().is_empty() {
            return Err(vec!["PERSONNEL_MUST_HAVE_NAME".to_string()]);
        }
        Ok(Personnel {
            _id: Some(_id),
            name: self.name.trim().to_string(),
            position: self.position.trim().to_string(),
            project_id: self.project_id,
            active: self.active.unwrap_or(true),
        })
    }
}
