use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::store::Entity;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportShift {
    First,
    Second,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub author_id: ObjectId,
    pub date: NaiveDate,
    pub shift: ReportShift,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub work_zone: Option<ReportArea>,
    pub work_section: Option<ReportArea>,
    pub front_supervisor_name: Option<String>,
    pub overseer_name: Option<String>,
    #[serde(default)]
    pub hauling_entries: Vec<ReportHauling>,
    #[serde(default)]
    pub material_entries: Vec<ReportMaterial>,
    #[serde(default)]
    pub water_entries: Vec<ReportWater>,
    #[serde(default)]
    pub machinery_entries: Vec<ReportMachinery>,
    #[serde(default)]
    pub personnel_entries: Vec<ReportPersonnel>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub map_pins: Vec<ReportMapPin>,
    pub created_at: DateTime,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReportArea {
    pub _id: Option<ObjectId>,
    pub name: String,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReportHauling {
    pub material: String,
    pub trip_count: u32,
    pub capacity: f64,
    #[serde(default)]
    pub loose_volume: f64,
    pub source_layer: Option<String>,
    pub origin: String,
    pub destination: String,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReportMaterial {
    pub material: String,
    pub unit: String,
    pub quantity: f64,
    pub zone: Option<String>,
    pub elevation: Option<f64>,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReportWater {
    pub economic_number: String,
    pub trip_count: u32,
    pub capacity: f64,
    #[serde(default)]
    pub volume: f64,
    pub origin: String,
    pub destination: String,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReportMachinery {
    pub vehicle_id: Option<ObjectId>,
    #[serde(default)]
    pub vehicle_name: String,
    #[serde(default)]
    pub vehicle_kind: String,
    #[serde(default)]
    pub economic_number: String,
    pub odometer_start: f64,
    pub odometer_end: f64,
    #[serde(default)]
    pub hours_operated: f64,
    #[serde(default)]
    pub operator_name: String,
    #[serde(default)]
    pub activity: String,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReportPersonnel {
    pub personnel_id: Option<ObjectId>,
    pub role_id: Option<ObjectId>,
    #[serde(default)]
    pub activity: String,
    pub hours_worked: f64,
    pub notes: Option<String>,
}
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReportMapPin {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub color: String,
}
#[derive(Debug, Default)]
pub struct ReportQuery {
    pub project_id: Option<ObjectId>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
/// Create payload. Required fields are optional here so that every missing one
/// can be reported in a single validation error.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ReportRequest {
    pub project_id: Option<ObjectId>,
    pub date: Option<NaiveDate>,
    pub shift: Option<ReportShift>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub work_zone: Option<ReportArea>,
    pub work_section: Option<ReportArea>,
    pub front_supervisor_name: Option<String>,
    pub overseer_name: Option<String>,
    #[serde(default)]
    pub hauling_entries: Vec<ReportHauling>,
    #[serde(default)]
    pub material_entries: Vec<ReportMaterial>,
    #[serde(default)]
    pub water_entries: Vec<ReportWater>,
    #[serde(default)]
    pub machinery_entries: Vec<ReportMachinery>,
    #[serde(default)]
    pub personnel_entries: Vec<ReportPersonnel>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub map_pins: Vec<ReportMapPin>,
}
/// Partial update. A `None` field means "leave as is", never "clear".
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ReportPatch {
    pub date: Option<NaiveDate>,
    pub shift: Option<ReportShift>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub work_zone: Option<ReportArea>,
    pub work_section: Option<ReportArea>,
    pub front_supervisor_name: Option<String>,
    pub overseer_name: Option<String>,
    pub hauling_entries: Option<Vec<ReportHauling>>,
    pub material_entries: Option<Vec<ReportMaterial>>,
    pub water_entries: Option<Vec<ReportWater>>,
    pub machinery_entries: Option<Vec<ReportMachinery>>,
    pub personnel_entries: Option<Vec<ReportPersonnel>>,
    pub notes: Option<String>,
    pub map_pins: Option<Vec<ReportMapPin>>,
}
#[derive(Debug, Default, Deserialize)]
pub struct ReportUpdateRequest {
    pub modification_note: Option<String>,
    #[serde(flatten)]
    pub patch: ReportPatch,
}

impl Entity for Report {
    const COLLECTION: &'static str = "reports";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
}

impl ReportRequest {
    /// Checks the required fields and turns the payload into an unsaved report.
    pub fn into_report(self, author_id: ObjectId) -> Result<Report, Vec<String>> {
        let mut issues: Vec<String> = Vec::new();
        if self.project_id.is_none() {
            issues.push("PROJECT_ID_REQUIRED".to_string());
        }
        if self.date.is_none() {
            issues.push("DATE_REQUIRED".to_string());
        }
        if self.shift.is_none() {
            issues.push("SHIFT_REQUIRED".to_string());
        }

        let (project_id, date, shift) = match (self.project_id, self.date, self.shift) {
            (Some(project_id), Some(date), Some(shift)) => (project_id, date, shift),
            _ => return Err(issues),
        };

        Ok(Report {
            _id: None,
            project_id,
            author_id,
            date,
            shift,
            start_time: self.start_time,
            end_time: self.end_time,
            work_zone: self.work_zone,
            work_section: self.work_section,
            front_supervisor_name: self.front_supervisor_name,
            overseer_name: self.overseer_name,
            hauling_entries: self.hauling_entries,
            material_entries: self.material_entries,
            water_entries: self.water_entries,
            machinery_entries: self.machinery_entries,
            personnel_entries: self.personnel_entries,
            notes: self.notes,
            map_pins: self.map_pins,
            created_at: DateTime::now(),
        })
    }
}

impl Report {
    pub fn apply(&mut self, patch: ReportPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(shift) = patch.shift {
            self.shift = shift;
        }
        if patch.start_time.is_some() {
            self.start_time = patch.start_time;
        }
        if patch.end_time.is_some() {
            self.end_time = patch.end_time;
        }
        if patch.work_zone.is_some() {
            self.work_zone = patch.work_zone;
        }
        if patch.work_section.is_some() {
            self.work_section = patch.work_section;
        }
        if patch.front_supervisor_name.is_some() {
            self.front_supervisor_name = patch.front_supervisor_name;
        }
        if patch.overseer_name.is_some() {
            self.overseer_name = patch.overseer_name;
        }
        if let Some(entries) = patch.hauling_entries {
            self.hauling_entries = entries;
        }
        if let Some(entries) = patch.material_entries {
            self.material_entries = entries;
        }
        if let Some(entries) = patch.water_entries {
            self.water_entries = entries;
        }
        if let Some(entries) = patch.machinery_entries {
            self.machinery_entries = entries;
        }
        if let Some(entries) = patch.personnel_entries {
            self.personnel_entries = entries;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(pins) = patch.map_pins {
            self.map_pins = pins;
        }
    }
    /// Recomputes every derived quantity from its inputs.
    pub fn normalize(&mut self) {
        for entry in self.hauling_entries.iter_mut() {
            entry.loose_volume = f64::from(entry.trip_count) * entry.capacity;
        }
        for entry in self.water_entries.iter_mut() {
            entry.volume = f64::from(entry.trip_count) * entry.capacity;
        }
        for entry in self.machinery_entries.iter_mut() {
            entry.hours_operated = entry.odometer_end - entry.odometer_start;
        }
    }
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues: Vec<String> = Vec::new();

        for (index, entry) in self.machinery_entries.iter().enumerate() {
            if !entry.odometer_start.is_finite() || !entry.odometer_end.is_finite() {
                issues.push(format!("MACHINERY_ENTRY_{index}_ODOMETER_NOT_A_NUMBER"));
            } else if entry.vehicle_id.is_some() && entry.odometer_end < entry.odometer_start {
                issues.push(format!(
                    "MACHINERY_ENTRY_{index}_ODOMETER_END_BELOW_START ({} < {})",
                    entry.odometer_end, entry.odometer_start
                ));
            }
        }
        for (index, pin) in self.map_pins.iter().enumerate() {
            if !(0.0..=100.0).contains(&pin.x) || !(0.0..=100.0).contains(&pin.y) {
                issues.push(format!("MAP_PIN_{index}_OUT_OF_BOUNDS"));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
    pub fn vehicle_ids(&self) -> BTreeSet<ObjectId> {
        self.machinery_entries
            .iter()
            .filter_map(|entry| entry.vehicle_id)
            .collect()
    }
}
