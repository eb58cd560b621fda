use std::sync::Arc;

use mongodb::bson::{doc, oid::ObjectId, DateTime};
use tracing::{error, info};

use super::{fleet::FleetRegistry, history::ChangeHistory, report_diff::diff};
use crate::{
    database::Collections,
    error::{AppError, SideEffectWarning},
    models::{
        project::Project,
        report::{Report, ReportPatch, ReportQuery, ReportRequest},
        report_modification::ReportModification,
        user::ActingUser,
    },
    store::{Query, Repository},
};

/// A persisted primary result plus any secondary writes that did not go through.
#[derive(Debug)]
pub struct Outcome<T> {
    pub data: T,
    pub warnings: Vec<SideEffectWarning>,
}

#[derive(Clone)]
pub struct ReportEngine {
    reports: Arc<dyn Repository<Report>>,
    history: ChangeHistory,
    projects: Arc<dyn Repository<Project>>,
    fleet: FleetRegistry,
}

impl ReportEngine {
    pub fn new(db: &Collections) -> Self {
        Self {
            reports: db.reports.clone(),
            history: ChangeHistory::new(db.modifications.clone()),
            projects: db.projects.clone(),
            fleet: FleetRegistry::new(db.vehicles.clone(), db.reports.clone()),
        }
    }

    pub async fn create_report(
        &self,
        request: ReportRequest,
        issuer: &ActingUser,
    ) -> Result<Outcome<Report>, AppError> {
        let mut report = request
            .into_report(issuer.user_id)
            .map_err(AppError::Validation)?;
        report.normalize();
        report.validate().map_err(AppError::Validation)?;

        if self.projects.find_by_id(&report.project_id).await?.is_none() {
            return Err(AppError::NotFound("PROJECT_NOT_FOUND".to_string()));
        }

        let report_id = ObjectId::new();
        report._id = Some(report_id);
        self.reports.insert(&report).await?;
        info!(%report_id, project_id = %report.project_id, author = %issuer.user_id, "report created");

        let warnings = self.fleet.sync(&report.vehicle_ids()).await;
        Ok(Outcome {
            data: report,
            warnings,
        })
    }

    pub async fn update_report(
        &self,
        report_id: &ObjectId,
        patch: ReportPatch,
        issuer: &ActingUser,
        note: Option<String>,
    ) -> Result<Outcome<Report>, AppError> {
        let previous = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound("REPORT_NOT_FOUND".to_string()))?;

        let mut candidate = previous.clone();
        candidate.apply(patch);
        candidate.normalize();
        candidate.validate().map_err(AppError::Validation)?;

        let changes = diff(&previous, &candidate)?;
        if changes.is_empty() {
            return Ok(Outcome {
                data: previous,
                warnings: Vec::new(),
            });
        }

        if !self.reports.replace(&candidate).await? {
            return Err(AppError::NotFound("REPORT_NOT_FOUND".to_string()));
        }

        let modification = ReportModification {
            _id: Some(ObjectId::new()),
            report_id: *report_id,
            user_id: issuer.user_id,
            user_name: issuer.user_name.clone(),
            time: DateTime::now(),
            note: note.filter(|note| !note.trim().is_empty()),
            changes,
        };
        if let Err(e) = self.history.record_modification(&modification).await {
            error!(%report_id, error = %e, "history write failed, restoring previous report");
            if let Err(restore) = self.reports.replace(&previous).await {
                error!(%report_id, error = %restore, "restoring previous report failed");
            }
            return Err(e.into());
        }
        info!(
            %report_id,
            user = %issuer.user_id,
            fields = modification.changes.len(),
            "report updated"
        );

        let mut vehicle_ids = previous.vehicle_ids();
        vehicle_ids.extend(candidate.vehicle_ids());
        let warnings = self.fleet.sync(&vehicle_ids).await;

        Ok(Outcome {
            data: candidate,
            warnings,
        })
    }

    /// Removes the report and its history. Vehicle odometers are left as they are.
    /// History is dropped first; a failed history delete leaves the report in place.
    pub async fn delete_report(&self, report_id: &ObjectId) -> Result<u64, AppError> {
        if self.reports.find_by_id(report_id).await?.is_none() {
            return Err(AppError::NotFound("REPORT_NOT_FOUND".to_string()));
        }
        let history = self.history.drop_report(report_id).await?;
        let deleted = self.reports.delete_by_id(report_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("REPORT_NOT_FOUND".to_string()));
        }
        info!(%report_id, history, "report deleted");
        Ok(deleted)
    }

    pub async fn get_report(&self, report_id: &ObjectId) -> Result<Report, AppError> {
        self.reports
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound("REPORT_NOT_FOUND".to_string()))
    }

    pub async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<Report>, AppError> {
        let mut filter = doc! {};
        if let Some(project_id) = query.project_id {
            filter.insert("project_id", project_id);
        }
        let mut find = Query::filter(filter).sort(doc! { "date": -1, "created_at": -1 });
        find.skip = query.offset.map(|offset| offset as u64);
        find.limit = query.limit.map(|limit| limit as i64);

        Ok(self.reports.find_many(find).await?)
    }

    pub async fn get_modification_history(
        &self,
        report_id: &ObjectId,
    ) -> Result<Vec<ReportModification>, AppError> {
        if self.reports.find_by_id(report_id).await?.is_none() {
            return Err(AppError::NotFound("REPORT_NOT_FOUND".to_string()));
        }
        Ok(self.history.list_modifications(report_id).await?)
    }
}
