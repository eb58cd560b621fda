use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::store::Entity;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Vehicle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    pub kind: String,
    pub economic_number: String,
    pub odometer_start: f64,
    pub odometer_end: f64,
    pub hours_operated: f64,
    #[serde(default)]
    pub project_id: Vec<ObjectId>,
    pub active: bool,
}
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VehicleRequest {
    pub name: String,
    pub kind: String,
    pub economic_number: String,
    #[serde(default)]
    pub odometer_start: f64,
    #[serde(default)]
    pub project_id: Vec<ObjectId>,
    pub active: Option<bool>,
}
#[derive(Debug, Default)]
pub struct VehicleQuery {
    pub project_id: Option<ObjectId>,
    pub active: Option<bool>,
}

impl Entity for Vehicle {
    const COLLECTION: &'static str = "vehicles";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
}

impl VehicleRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues: Vec<String> = Vec::new();
        if self.name.trim().is_empty() {
            issues.push("VEHICLE_MUST_HAVE_NAME".to_string());
        }
        if self.economic_number.trim().is_empty() {
            issues.push("VEHICLE_MUST_HAVE_ECONOMIC_NUMBER".to_string());
        }
        if !self.odometer_start.is_finite() || self.odometer_start < 0.0 {
            issues.push("VEHICLE_MUST_HAVE_VALID_ODOMETER".to_string());
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

impl Vehicle {
    /// A freshly registered vehicle has no usage yet: its reading is its baseline.
    pub fn register(request: VehicleRequest) -> Self {
        Self {
            _id: Some(ObjectId::new()),
            name: request.name.trim().to_string(),
            kind: request.kind.trim().to_string(),
            economic_number: request.economic_number.trim().to_string(),
            odometer_start: request.odometer_start,
            odometer_end: request.odometer_start,
            hours_operated: 0.0,
            project_id: request.project_id,
            active: request.active.unwrap_or(true),
        }
    }
}
