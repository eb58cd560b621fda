use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::store::Entity;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatusKind {
    Running,
    Paused,
    Finished,
    Cancelled,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    pub code: String,
    pub location: Option<String>,
    pub status: Vec<ProjectStatus>,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ProjectStatus {
    pub kind: ProjectStatusKind,
    pub time: DateTime,
    pub message: Option<String>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct ProjectRequest {
    pub name: String,
    pub code: String,
    pub location: Option<String>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct ProjectStatusRequest {
    pub kind: ProjectStatusKind,
    pub message: Option<String>,
}

impl Entity for Project {
    const COLLECTION: &'static str = "projects";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
}

impl ProjectRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues: Vec<String> = Vec::new();
        if self.name.trim().is_empty() {
            issues.push("PROJECT_MUST_HAVE_NAME".to_string());
        }
        if self.code.trim().is_empty() {
            issues.push("PROJECT_MUST_HAVE_CODE".to_string());
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

impl Project {
    pub fn new(request: ProjectRequest) -> Self {
        Self {
            _id: Some(ObjectId::new()),
            name: request.name.trim().to_string(),
            code: request.code.trim().to_uppercase(),
            location: request.location,
            status: vec![ProjectStatus {
                kind: ProjectStatusKind::Running,
                time: DateTime::now(),
                message: None,
            }],
        }
    }
    pub fn current_status(&self) -> Option<ProjectStatusKind> {
        self.status.last().map(|status| status.kind)
    }
    pub fn update_status(&mut self, kind: ProjectStatusKind, message: Option<String>) {
        self.status.push(ProjectStatus {
            kind,
            time: DateTime::now(),
            message,
        });
    }
}
