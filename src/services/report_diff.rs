use serde_json::{Map, Value};

use crate::{
    error::AppError,
    models::{report::Report, report_modification::ReportFieldChange},
};

/// Editable report fields in the order changes are recorded.
pub const REPORT_FIELDS: [&str; 15] = [
    "date",
    "shift",
    "start_time",
    "end_time",
    "work_zone",
    "work_section",
    "front_supervisor_name",
    "overseer_name",
    "hauling_entries",
    "material_entries",
    "water_entries",
    "machinery_entries",
    "personnel_entries",
    "notes",
    "map_pins",
];

fn as_object(report: &Report) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(report)? {
        Value::Object(object) => Ok(object),
        _ => Err(AppError::Internal("REPORT_NOT_AN_OBJECT".to_string())),
    }
}

/// Field-level diff: a change anywhere inside an array marks the whole array.
pub fn diff(old: &Report, new: &Report) -> Result<Vec<ReportFieldChange>, AppError> {
    let old = as_object(old)?;
    let new = as_object(new)?;

    Ok(REPORT_FIELDS
        .iter()
        .filter_map(|field| {
            let before = old.get(*field).cloned().unwrap_or(Value::Null);
            let after = new.get(*field).cloned().unwrap_or(Value::Null);
            (before != after).then(|| ReportFieldChange {
                field: field.to_string(),
                before,
                after,
            })
        })
        .collect())
}
