use std::collections::BTreeSet;

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use mongodb::bson::doc;
use serde::Deserialize;
use tracing::info;

use super::parse_id;
use crate::{
    error::{AppError, ApiResponse},
    models::{
        role::RolePermission,
        vehicle::{Vehicle, VehicleQuery, VehicleRequest},
    },
    services::fleet::FleetRegistry,
    state::{authorize, AppState},
    store::Query,
};

#[derive(Deserialize)]
pub struct VehicleQueryParams {
    pub project_id: Option<String>,
    pub active: Option<bool>,
}

async fn find_vehicle(state: &AppState, vehicle_id: &str) -> Result<Vehicle, AppError> {
    let vehicle_id = parse_id(vehicle_id)?;
    state
        .db
        .vehicles
        .find_by_id(&vehicle_id)
        .await?
        .ok_or_else(|| AppError::NotFound("VEHICLE_NOT_FOUND".to_string()))
}

#[get("/vehicles")]
pub async fn get_vehicles(
    state: web::Data<AppState>,
    params: web::Query<VehicleQueryParams>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;

    let params = params.into_inner();
    let query: VehicleQuery = VehicleQuery {
        project_id: params.project_id.as_deref().map(parse_id).transpose()?,
        active: params.active,
    };

    let mut filter = doc! {};
    if let Some(project_id) = query.project_id {
        filter.insert("project_id", project_id);
    }
    if let Some(active) = query.active {
        filter.insert("active", active);
    }

    let vehicles = state
        .db
        .vehicles
        .find_many(Query::filter(filter).sort(doc! { "economic_number": 1 }))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(vehicles)))
}
#[get("/vehicles/{vehicle_id}")]
pub async fn get_vehicle(
    state: web::Data<AppState>,
    vehicle_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;

    let vehicle = find_vehicle(&state, &vehicle_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(vehicle)))
}
#[post("/vehicles")]
pub async fn create_vehicle(
    state: web::Data<AppState>,
    payload: web::Json<VehicleRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageFleet)?;

    let payload: VehicleRequest = payload.into_inner();
    payload.validate().map_err(AppError::Validation)?;

    let vehicle = Vehicle::register(payload);
    let vehicle_id = state.db.vehicles.insert(&vehicle).await?;
    info!(%vehicle_id, economic_number = %vehicle.economic_number, "vehicle registered");
    Ok(HttpResponse::Created().json(ApiResponse::ok(vehicle)))
}
/// Odometer readings are derived from reports and cannot be set here; a new
/// baseline triggers a recompute so the derived fields stay consistent.
#[put("/vehicles/{vehicle_id}")]
pub async fn update_vehicle(
    state: web::Data<AppState>,
    vehicle_id: web::Path<String>,
    payload: web::Json<VehicleRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageFleet)?;

    let payload: VehicleRequest = payload.into_inner();
    payload.validate().map_err(AppError::Validation)?;

    let vehicle = find_vehicle(&state, &vehicle_id).await?;
    let vehicle_id = vehicle._id.ok_or(AppError::Internal("VEHICLE_WITHOUT_ID".to_string()))?;
    let baseline_changed = vehicle.odometer_start != payload.odometer_start;

    state
        .db
        .vehicles
        .set_fields(
            &vehicle_id,
            doc! {
                "name": payload.name.trim(),
                "kind": payload.kind.trim(),
                "economic_number": payload.economic_number.trim(),
                "odometer_start": payload.odometer_start,
                "project_id": payload.project_id.clone(),
                "active": payload.active.unwrap_or(vehicle.active),
            },
        )
        .await?;

    let warnings = if baseline_changed {
        FleetRegistry::new(state.db.vehicles.clone(), state.db.reports.clone())
            .sync(&BTreeSet::from([vehicle_id]))
            .await
    } else {
        Vec::new()
    };

    let vehicle = find_vehicle(&state, &vehicle_id.to_hex()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_warnings(vehicle, warnings)))
}
#[delete("/vehicles/{vehicle_id}")]
pub async fn delete_vehicle(
    state: web::Data<AppState>,
    vehicle_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageFleet)?;

    let vehicle_id = parse_id(&vehicle_id)?;
    match state.db.vehicles.delete_by_id(&vehicle_id).await? {
        0 => Err(AppError::NotFound("VEHICLE_NOT_FOUND".to_string())),
        count => Ok(HttpResponse::Ok().json(ApiResponse::ok(count))),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use mongodb::bson::oid::ObjectId;
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        config::{AppConfig, StorageKind},
        database::Collections,
        models::{
            report::tests::{machinery, request},
            role::UserRole,
            user::{User, UserAuthenticationMiddlewareFactory},
        },
        routes,
    };

    #[actix_web::test]
    async fn new_baseline_is_reconciled_with_reports() {
        let config = AppConfig {
            storage: StorageKind::Memory,
            ..AppConfig::default()
        };
        let state = web::Data::new(AppState::new(config, Collections::in_memory()));
        let admin = User {
            _id: Some(ObjectId::new()),
            name: "Root".to_string(),
            email: "root@mina.mx".to_string(),
            password: "unused".to_string(),
            role: UserRole::Admin,
        };
        let admin_id = state.db.users.insert(&admin).await.unwrap();
        let token = state.keys.issue(&admin_id).unwrap();
        let vehicle = Vehicle::register(VehicleRequest {
            name: "Pipa".to_string(),
            kind: "water_truck".to_string(),
            economic_number: "PI-02".to_string(),
            odometer_start: 0.0,
            project_id: Vec::new(),
            active: None,
        });
        let vehicle_id = state.db.vehicles.insert(&vehicle).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(UserAuthenticationMiddlewareFactory)
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/vehicles/{}", vehicle_id.to_hex()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({
                "name": "Pipa",
                "kind": "water_truck",
                "economic_number": "PI-02",
                "odometer_start": 250.0
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["odometer_end"], json!(250.0));

        // With a report on file the baseline no longer drives the reading.
        let project_id = ObjectId::new();
        let mut report = request(project_id).into_report(admin_id).unwrap();
        report._id = Some(ObjectId::new());
        report.machinery_entries = vec![machinery(Some(vehicle_id), 250.0, 260.0)];
        report.normalize();
        state.db.reports.insert(&report).await.unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/vehicles/{}", vehicle_id.to_hex()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({
                "name": "Pipa",
                "kind": "water_truck",
                "economic_number": "PI-02",
                "odometer_start": 240.0
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["odometer_start"], json!(240.0));
        assert_eq!(body["data"]["odometer_end"], json!(260.0));
        assert_eq!(body["data"]["hours_operated"], json!(10.0));
    }
}
