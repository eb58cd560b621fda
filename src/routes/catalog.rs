use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use mongodb::bson::{doc, oid::ObjectId};

use super::parse_id;
use crate::{
    error::{AppError, ApiResponse},
    models::{
        catalog::{CatalogEntry, CatalogKind, CatalogRequest},
        role::RolePermission,
    },
    state::{authorize, AppState},
    store::Query,
};

fn parse_kind(raw: &str) -> Result<CatalogKind, AppError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| AppError::NotFound(format!("CATALOG_NOT_FOUND: {raw}")))
}

async fn find_entry(
    state: &AppState,
    kind: CatalogKind,
    entry_id: &ObjectId,
) -> Result<CatalogEntry, AppError> {
    match state.db.catalogs.find_by_id(entry_id).await? {
        Some(entry) if entry.kind == kind => Ok(entry),
        _ => Err(AppError::NotFound("CATALOG_ENTRY_NOT_FOUND".to_string())),
    }
}

#[get("/catalogs/{kind}")]
pub async fn get_catalog(
    state: web::Data<AppState>,
    kind: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;
    let kind = parse_kind(&kind)?;

    let entries = state
        .db
        .catalogs
        .find_many(Query::filter(doc! { "kind": kind.to_bson() }).sort(doc! { "name": 1 }))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(entries)))
}
#[post("/catalogs/{kind}")]
pub async fn create_catalog_entry(
    state: web::Data<AppState>,
    kind: web::Path<String>,
    payload: web::Json<CatalogRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageCatalogs)?;
    let kind = parse_kind(&kind)?;

    let entry: CatalogEntry = payload
        .into_inner()
        .into_entry(ObjectId::new(), kind)
        .map_err(AppError::Validation)?;
    state.db.catalogs.insert(&entry).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(entry)))
}
#[put("/catalogs/{kind}/{entry_id}")]
pub async fn update_catalog_entry(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    payload: web::Json<CatalogRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageCatalogs)?;
    let (kind, entry_id) = path.into_inner();
    let kind = parse_kind(&kind)?;
    let entry_id = parse_id(&entry_id)?;

    find_entry(&state, kind, &entry_id).await?;
    let entry: CatalogEntry = payload
        .into_inner()
        .into_entry(entry_id, kind)
        .map_err(AppError::Validation)?;
    state.db.catalogs.replace(&entry).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(entry)))
}
#[delete("/catalogs/{kind}/{entry_id}")]
pub async fn delete_catalog_entry(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageCatalogs)?;
    let (kind, entry_id) = path.into_inner();
    let kind = parse_kind(&kind)?;
    let entry_id = parse_id(&entry_id)?;

    find_entry(&state, kind, &entry_id).await?;
    let count = state.db.catalogs.delete_by_id(&entry_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(count)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        config::{AppConfig, StorageKind},
        database::Collections,
        models::{
            role::UserRole,
            user::{User, UserAuthenticationMiddlewareFactory},
        },
        routes,
    };

    #[actix_web::test]
    async fn catalog_kinds_parse_from_path_segments() {
        assert_eq!(parse_kind("cargo_type").unwrap(), CatalogKind::CargoType);
        assert!(parse_kind("CargoType").is_err());
    }

    #[actix_web::test]
    async fn entries_are_scoped_to_their_catalog() {
        let config = AppConfig {
            storage: StorageKind::Memory,
            ..AppConfig::default()
        };
        let state = web::Data::new(AppState::new(config, Collections::in_memory()));
        let user = User {
            _id: Some(ObjectId::new()),
            name: "Root".to_string(),
            email: "root@mina.mx".to_string(),
            password: "unused".to_string(),
            role: UserRole::Supervisor,
        };
        let user_id = state.db.users.insert(&user).await.unwrap();
        let bearer = ("Authorization", format!("Bearer {}", state.keys.issue(&user_id).unwrap()));
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(UserAuthenticationMiddlewareFactory)
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/catalogs/material")
            .insert_header(bearer.clone())
            .set_json(json!({ "name": "Tepetate" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let entry_id = body["data"]["_id"]["$oid"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/catalogs/origin")
            .insert_header(bearer.clone())
            .set_json(json!({ "name": "Banco 4" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/catalogs/material")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["data"][0]["name"], json!("Tepetate"));

        let req = test::TestRequest::delete()
            .uri(&format!("/catalogs/origin/{entry_id}"))
            .insert_header(bearer.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/catalogs/unknown")
            .insert_header(bearer)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
