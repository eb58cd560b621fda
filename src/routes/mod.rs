use actix_web::{error::JsonPayloadError, web, HttpRequest};
use mongodb::bson::oid::ObjectId;
use std::str::FromStr;

use crate::error::AppError;

pub mod catalog;
pub mod personnel;
pub mod project;
pub mod report;
pub mod user;
pub mod vehicle;

pub fn parse_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::from_str(raw.trim()).map_err(|_| AppError::InvalidId(raw.to_string()))
}

fn json_error(error: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    AppError::validation(format!("INVALID_PAYLOAD: {error}")).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(user::create_user)
        .service(user::login)
        .service(user::get_users)
        .service(report::get_reports)
        .service(report::create_report)
        .service(report::get_report_history)
        .service(report::get_report)
        .service(report::update_report)
        .service(report::delete_report)
        .service(project::get_projects)
        .service(project::create_project)
        .service(project::update_project_status)
        .service(project::get_project)
        .service(project::update_project)
        .service(project::delete_project)
        .service(vehicle::get_vehicles)
        .service(vehicle::create_vehicle)
        .service(vehicle::get_vehicle)
        .service(vehicle::update_vehicle)
        .service(vehicle::delete_vehicle)
        .service(personnel::get_personnel)
        .service(personnel::create_personnel)
        .service(personnel::get_person)
        .service(personnel::update_personnel)
        .service(personnel::delete_personnel)
        .service(catalog::get_catalog)
        .service(catalog::create_catalog_entry)
        .service(catalog::update_catalog_entry)
        .service(catalog::delete_catalog_entry);
}
