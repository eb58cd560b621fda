use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;
use mongodb::bson::{doc, from_document, oid::ObjectId, DateTime};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::{
    error::{AppError, ErrorKind, SideEffectWarning},
    models::{
        report::{Report, ReportMachinery},
        vehicle::Vehicle,
    },
    store::{Query, Repository, StoreError},
};

/// The slice of a report that drives fleet state.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineryLog {
    pub date: NaiveDate,
    pub created_at: DateTime,
    #[serde(default)]
    pub machinery_entries: Vec<ReportMachinery>,
}

impl From<&Report> for MachineryLog {
    fn from(report: &Report) -> Self {
        Self {
            date: report.date,
            created_at: report.created_at,
            machinery_entries: report.machinery_entries.clone(),
        }
    }
}

/// What the reports say about one vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleUsage {
    /// Reading of the most recent entry, `None` when nothing references the vehicle.
    pub odometer_end: Option<f64>,
    pub hours_operated: f64,
}

impl VehicleUsage {
    /// Folds every machinery entry for `vehicle_id` in report date, creation time
    /// and array order. The last reading wins; hours accumulate.
    pub fn collect(vehicle_id: &ObjectId, logs: &[MachineryLog]) -> Self {
        let mut ordered: Vec<&MachineryLog> = logs.iter().collect();
        ordered.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let mut usage = VehicleUsage {
            odometer_end: None,
            hours_operated: 0.0,
        };
        for entry in ordered
            .iter()
            .flat_map(|log| log.machinery_entries.iter())
            .filter(|entry| entry.vehicle_id.as_ref() == Some(vehicle_id))
        {
            usage.odometer_end = Some(entry.odometer_end);
            usage.hours_operated += entry.hours_operated;
        }
        usage
    }
}

#[derive(Clone)]
pub struct FleetRegistry {
    vehicles: Arc<dyn Repository<Vehicle>>,
    reports: Arc<dyn Repository<Report>>,
}

impl FleetRegistry {
    pub fn new(vehicles: Arc<dyn Repository<Vehicle>>, reports: Arc<dyn Repository<Report>>) -> Self {
        Self { vehicles, reports }
    }

    /// Writes the derived odometer state of one vehicle with a single-document `$set`.
    /// An unknown vehicle is logged and skipped so a report never fails on a stale reference.
    pub async fn apply_machinery_usage(
        &self,
        vehicle_id: &ObjectId,
        usage: VehicleUsage,
    ) -> Result<(), AppError> {
        let vehicle = match self.vehicles.find_by_id(vehicle_id).await? {
            Some(vehicle) => vehicle,
            None => {
                warn!(%vehicle_id, "machinery entry references an unknown vehicle");
                return Ok(());
            }
        };
        let odometer_end = usage.odometer_end.unwrap_or(vehicle.odometer_start);

        self.vehicles
            .set_fields(
                vehicle_id,
                doc! {
                    "odometer_end": odometer_end,
                    "hours_operated": usage.hours_operated,
                },
            )
            .await?;
        debug!(%vehicle_id, odometer_end, hours_operated = usage.hours_operated, "vehicle odometer updated");
        Ok(())
    }

    pub async fn recompute(&self, vehicle_id: &ObjectId) -> Result<VehicleUsage, AppError> {
        let logs = self
            .reports
            .find_documents(
                Query::filter(doc! { "machinery_entries.vehicle_id": *vehicle_id })
                    .project(doc! { "date": 1, "created_at": 1, "machinery_entries": 1 }),
            )
            .await?
            .into_iter()
            .map(|document| from_document::<MachineryLog>(document).map_err(StoreError::from))
            .collect::<Result<Vec<MachineryLog>, StoreError>>()?;
        let usage = VehicleUsage::collect(vehicle_id, &logs);
        self.apply_machinery_usage(vehicle_id, usage).await?;
        Ok(usage)
    }

    /// Recomputes each vehicle independently. Failures never abort the caller; they
    /// come back as warnings next to the already persisted report.
    pub async fn sync(&self, vehicle_ids: &BTreeSet<ObjectId>) -> Vec<SideEffectWarning> {
        let mut warnings: Vec<SideEffectWarning> = Vec::new();
        for vehicle_id in vehicle_ids.iter() {
            if let Err(e) = self.recompute(vehicle_id).await {
                error!(%vehicle_id, error = %e, "vehicle odometer sync failed");
                warnings.push(SideEffectWarning {
                    kind: ErrorKind::DependencyUnavailable,
                    target: format!("vehicle:{}", vehicle_id.to_hex()),
                    message: e.to_string(),
                });
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::report::tests::{machinery, request},
        store::MemoryRepository,
    };

    fn report_on(day: u32, created_ms: i64, entries: Vec<(ObjectId, f64, f64)>) -> MachineryLog {
        let mut report = request(ObjectId::new())
            .into_report(ObjectId::new())
            .unwrap();
        report._id = Some(ObjectId::new());
        report.date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        report.created_at = DateTime::from_millis(created_ms);
        report.machinery_entries = entries
            .into_iter()
            .map(|(vehicle_id, start, end)| machinery(Some(vehicle_id), start, end))
            .collect();
        report.normalize();
        MachineryLog::from(&report)
    }

    #[test]
    fn later_dates_win_regardless_of_storage_order() {
        let truck = ObjectId::new();
        let reports = vec![
            report_on(12, 1_000, vec![(truck, 110.0, 118.0)]),
            report_on(11, 2_000, vec![(truck, 100.0, 104.0), (truck, 104.0, 110.0)]),
        ];

        let usage = VehicleUsage::collect(&truck, &reports);

        assert_eq!(usage.odometer_end, Some(118.0));
        assert_eq!(usage.hours_operated, 18.0);
    }

    #[test]
    fn same_day_orders_by_creation() {
        let truck = ObjectId::new();
        let reports = vec![
            report_on(11, 5_000, vec![(truck, 50.0, 52.0)]),
            report_on(11, 1_000, vec![(truck, 60.0, 61.0)]),
        ];

        assert_eq!(
            VehicleUsage::collect(&truck, &reports).odometer_end,
            Some(52.0)
        );
    }

    #[test]
    fn unreferenced_vehicle_has_no_usage() {
        let reports = vec![report_on(11, 0, vec![(ObjectId::new(), 1.0, 2.0)])];
        let usage = VehicleUsage::collect(&ObjectId::new(), &reports);
        assert_eq!(usage.odometer_end, None);
        assert_eq!(usage.hours_operated, 0.0);
    }

    #[actix_web::test]
    async fn apply_is_idempotent_and_skips_unknown_vehicles() {
        let vehicles: Arc<dyn Repository<Vehicle>> = Arc::new(MemoryRepository::<Vehicle>::new());
        let reports: Arc<dyn Repository<Report>> = Arc::new(MemoryRepository::<Report>::new());
        let fleet = FleetRegistry::new(vehicles.clone(), reports);
        let vehicle = Vehicle {
            _id: Some(ObjectId::new()),
            name: "Cargador".to_string(),
            kind: "loader".to_string(),
            economic_number: "CF-03".to_string(),
            odometer_start: 900.0,
            odometer_end: 900.0,
            hours_operated: 0.0,
            project_id: Vec::new(),
            active: true,
        };
        let vehicle_id = vehicles.insert(&vehicle).await.unwrap();
        let usage = VehicleUsage {
            odometer_end: Some(912.5),
            hours_operated: 12.5,
        };

        fleet.apply_machinery_usage(&vehicle_id, usage).await.unwrap();
        fleet.apply_machinery_usage(&vehicle_id, usage).await.unwrap();
        fleet
            .apply_machinery_usage(&ObjectId::new(), usage)
            .await
            .unwrap();

        let stored = vehicles.find_by_id(&vehicle_id).await.unwrap().unwrap();
        assert_eq!(stored.odometer_end, 912.5);
        assert_eq!(stored.hours_operated, 12.5);
        assert_eq!(stored.odometer_start, 900.0);
    }

    #[actix_web::test]
    async fn recompute_reads_machinery_from_stored_reports() {
        let vehicles: Arc<dyn Repository<Vehicle>> = Arc::new(MemoryRepository::<Vehicle>::new());
        let reports: Arc<dyn Repository<Report>> = Arc::new(MemoryRepository::<Report>::new());
        let fleet = FleetRegistry::new(vehicles.clone(), reports.clone());
        let vehicle_id = vehicles
            .insert(&Vehicle {
                _id: Some(ObjectId::new()),
                name: "Cargador".to_string(),
                kind: "loader".to_string(),
                economic_number: "CF-03".to_string(),
                odometer_start: 100.0,
                odometer_end: 100.0,
                hours_operated: 0.0,
                project_id: Vec::new(),
                active: true,
            })
            .await
            .unwrap();
        let mut report = request(ObjectId::new())
            .into_report(ObjectId::new())
            .unwrap();
        report._id = Some(ObjectId::new());
        report.machinery_entries = vec![machinery(Some(vehicle_id), 100.0, 107.0)];
        report.normalize();
        reports.insert(&report).await.unwrap();

        let usage = fleet.recompute(&vehicle_id).await.unwrap();

        assert_eq!(usage.odometer_end, Some(107.0));
        assert_eq!(usage.hours_operated, 7.0);
        let stored = vehicles.find_by_id(&vehicle_id).await.unwrap().unwrap();
        assert_eq!(stored.odometer_end, 107.0);
    }
}
