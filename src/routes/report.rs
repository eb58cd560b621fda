use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::parse_id;
use crate::{
    error::{AppError, ApiResponse},
    models::{
        report::{ReportQuery, ReportRequest, ReportUpdateRequest},
        role::RolePermission,
    },
    state::{authorize, AppState},
};

#[derive(Deserialize)]
pub struct ReportQueryParams {
    pub project_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[get("/reports")]
pub async fn get_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;

    let params = params.into_inner();
    let query: ReportQuery = ReportQuery {
        project_id: params.project_id.as_deref().map(parse_id).transpose()?,
        limit: Some(state.config.page_size(params.limit)),
        offset: params.offset,
    };

    let reports = state.report_engine().list_reports(&query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(reports)))
}
#[get("/reports/{report_id}")]
pub async fn get_report(
    state: web::Data<AppState>,
    report_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;
    let report_id = parse_id(&report_id)?;

    let report = state.report_engine().get_report(&report_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(report)))
}
#[get("/reports/{report_id}/history")]
pub async fn get_report_history(
    state: web::Data<AppState>,
    report_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;
    let report_id = parse_id(&report_id)?;

    let history = state
        .report_engine()
        .get_modification_history(&report_id)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(history)))
}
#[post("/reports")]
pub async fn create_report(
    state: web::Data<AppState>,
    payload: web::Json<ReportRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let issuer = authorize(&req, RolePermission::CreateReport)?;

    let outcome = state
        .report_engine()
        .create_report(payload.into_inner(), &issuer)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_warnings(outcome.data, outcome.warnings)))
}
#[patch("/reports/{report_id}")]
pub async fn update_report(
    state: web::Data<AppState>,
    report_id: web::Path<String>,
    payload: web::Json<ReportUpdateRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let issuer = authorize(&req, RolePermission::UpdateReport)?;
    let report_id = parse_id(&report_id)?;
    let payload = payload.into_inner();

    let outcome = state
        .report_engine()
        .update_report(&report_id, payload.patch, &issuer, payload.modification_note)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_warnings(outcome.data, outcome.warnings)))
}
#[delete("/reports/{report_id}")]
pub async fn delete_report(
    state: web::Data<AppState>,
    report_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::DeleteReport)?;
    let report_id = parse_id(&report_id)?;

    let count = state.report_engine().delete_report(&report_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(count)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use mongodb::bson::oid::ObjectId;
    use serde_json::{json, Value};

    use crate::{
        config::{AppConfig, StorageKind},
        database::Collections,
        models::{
            project::{Project, ProjectRequest},
            role::UserRole,
            user::{User, UserAuthenticationMiddlewareFactory},
            vehicle::{Vehicle, VehicleRequest},
        },
        routes,
        state::AppState,
    };

    async fn state_with_user(role: UserRole) -> (web::Data<AppState>, String, ObjectId) {
        let config = AppConfig {
            storage: StorageKind::Memory,
            ..AppConfig::default()
        };
        let state = AppState::new(config, Collections::in_memory());
        let user = User {
            _id: Some(ObjectId::new()),
            name: "Alice".to_string(),
            email: "alice@mina.mx".to_string(),
            password: "unused".to_string(),
            role,
        };
        let user_id = state.db.users.insert(&user).await.unwrap();
        let token = state.keys.issue(&user_id).unwrap();
        let project = Project::new(ProjectRequest {
            name: "Tajo Norte".to_string(),
            code: "TN".to_string(),
            location: None,
        });
        let project_id = state.db.projects.insert(&project).await.unwrap();
        (web::Data::new(state), token, project_id)
    }

    #[actix_web::test]
    async fn report_lifecycle_over_http() {
        let (state, token, project_id) = state_with_user(UserRole::Supervisor).await;
        let vehicle = Vehicle::register(VehicleRequest {
            name: "Tractor".to_string(),
            kind: "dozer".to_string(),
            economic_number: "TD-11".to_string(),
            odometer_start: 300.0,
            project_id: vec![project_id],
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
        let bearer = ("Authorization", format!("Bearer {token}"));

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(bearer.clone())
            .set_json(json!({
                "project_id": project_id,
                "date": "2024-03-11",
                "shift": "first",
                "notes": "Start of campaign",
                "machinery_entries": [{
                    "vehicle_id": vehicle_id,
                    "odometer_start": 300.0,
                    "odometer_end": 309.5
                }]
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["machinery_entries"][0]["hours_operated"], json!(9.5));
        let report_id = body["data"]["_id"]["$oid"].as_str().unwrap().to_string();

        let req = test::TestRequest::patch()
            .uri(&format!("/reports/{report_id}"))
            .insert_header(bearer.clone())
            .set_json(json!({ "notes": "Campaign paused", "modification_note": "typo" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/reports/{report_id}/history"))
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["user_name"], json!("Alice"));
        assert_eq!(body["data"][0]["note"], json!("typo"));
        assert_eq!(body["data"][0]["changes"][0]["field"], json!("notes"));
        assert_eq!(body["data"][0]["changes"][0]["after"], json!("Campaign paused"));

        let stored = state.db.vehicles.find_by_id(&vehicle_id).await.unwrap().unwrap();
        assert_eq!(stored.odometer_end, 309.5);

        let req = test::TestRequest::delete()
            .uri(&format!("/reports/{report_id}"))
            .insert_header(bearer)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn validation_errors_use_the_envelope() {
        let (state, token, project_id) = state_with_user(UserRole::FieldLead).await;
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(UserAuthenticationMiddlewareFactory)
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/reports")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({
                "project_id": project_id,
                "date": "2024-03-11",
                "shift": "second",
                "machinery_entries": [{
                    "vehicle_id": ObjectId::new(),
                    "odometer_start": 10.0,
                    "odometer_end": 4.0
                }]
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["kind"], json!("VALIDATION_ERROR"));

        let req = test::TestRequest::delete()
            .uri(&format!("/reports/{}", ObjectId::new().to_hex()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn requests_without_token_are_unauthorized() {
        let (state, _, _) = state_with_user(UserRole::Admin).await;
        let app = test::init_service(
            App::new()
                .app_data(state)
                .wrap(UserAuthenticationMiddlewareFactory)
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/reports").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/reports/not-an-id")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
