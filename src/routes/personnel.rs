use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use mongodb::bson::{doc, oid::ObjectId};
use serde::Deserialize;

use super::parse_id;
use crate::{
    error::{AppError, ApiResponse},
    models::{
        personnel::{Personnel, PersonnelRequest},
        role::RolePermission,
    },
    state::{authorize, AppState},
    store::Query,
};

#[derive(Deserialize)]
pub struct PersonnelQueryParams {
    pub project_id: Option<String>,
}

#[get("/personnel")]
pub async fn get_personnel(
    state: web::Data<AppState>,
    params: web::Query<PersonnelQueryParams>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;

    let mut filter = doc! {};
    if let Some(project_id) = params.project_id.as_deref() {
        filter.insert("project_id", parse_id(project_id)?);
    }

    let personnel = state
        .db
        .personnel
        .find_many(Query::filter(filter).sort(doc! { "name": 1 }))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(personnel)))
}
#[get("/personnel/{personnel_id}")]
pub async fn get_person(
    state: web::Data<AppState>,
    personnel_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;
    let personnel_id = parse_id(&personnel_id)?;

    match state.db.personnel.find_by_id(&personnel_id).await? {
        Some(person) => Ok(HttpResponse::Ok().json(ApiResponse::ok(person))),
        None => Err(AppError::NotFound("PERSONNEL_NOT_FOUND".to_string())),
    }
}
#[post("/personnel")]
pub async fn create_personnel(
    state: web::Data<AppState>,
    payload: web::Json<PersonnelRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManagePersonnel)?;

    let person: Personnel = payload
        .into_inner()
        .into_personnel(ObjectId::new())
        .map_err(AppError::Validation)?;
    state.db.personnel.insert(&person).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(person)))
}
#[put("/personnel/{personnel_id}")]
pub async fn update_personnel(
    state: web::Data<AppState>,
    personnel_id: web::Path<String>,
    payload: web::Json<PersonnelRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManagePersonnel)?;
    let personnel_id = parse_id(&personnel_id)?;

    if state.db.personnel.find_by_id(&personnel_id).await?.is_none() {
        return Err(AppError::NotFound("PERSONNEL_NOT_FOUND".to_string()));
    }
    let person: Personnel = payload
        .into_inner()
        .into_personnel(personnel_id)
        .map_err(AppError::Validation)?;
    state.db.personnel.replace(&person).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(person)))
}
#[delete("/personnel/{personnel_id}")]
pub async fn delete_personnel(
    state: web::Data<AppState>,
    personnel_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManagePersonnel)?;
    let personnel_id = parse_id(&personnel_id)?;

    match state.db.personnel.delete_by_id(&personnel_id).await? {
        0 => Err(AppError::NotFound("PERSONNEL_NOT_FOUND".to_string())),
        count => Ok(HttpResponse::Ok().json(ApiResponse::ok(count))),
    }
}
