use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use mongodb::bson::doc;
use tracing::info;

use super::parse_id;
use crate::{
    error::{AppError, ApiResponse},
    models::{
        project::{Project, ProjectRequest, ProjectStatusRequest},
        role::RolePermission,
    },
    state::{authorize, AppState},
    store::Query,
};

async fn find_project(state: &AppState, project_id: &str) -> Result<Project, AppError> {
    let project_id = parse_id(project_id)?;
    state
        .db
        .projects
        .find_by_id(&project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("PROJECT_NOT_FOUND".to_string()))
}

#[get("/projects")]
pub async fn get_projects(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;

    let projects = state
        .db
        .projects
        .find_many(Query::default().sort(doc! { "name": 1 }))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(projects)))
}
#[get("/projects/{project_id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ReadData)?;

    let project = find_project(&state, &project_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(project)))
}
#[post("/projects")]
pub async fn create_project(
    state: web::Data<AppState>,
    payload: web::Json<ProjectRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageProjects)?;

    let payload: ProjectRequest = payload.into_inner();
    payload.validate().map_err(AppError::Validation)?;

    let project = Project::new(payload);
    let project_id = state.db.projects.insert(&project).await?;
    info!(%project_id, code = %project.code, "project created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(project)))
}
#[put("/projects/{project_id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    payload: web::Json<ProjectRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageProjects)?;

    let payload: ProjectRequest = payload.into_inner();
    payload.validate().map_err(AppError::Validation)?;

    let mut project = find_project(&state, &project_id).await?;
    project.name = payload.name.trim().to_string();
    project.code = payload.code.trim().to_uppercase();
    project.location = payload.location;

    state.db.projects.replace(&project).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(project)))
}
#[post("/projects/{project_id}/status")]
pub async fn update_project_status(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    payload: web::Json<ProjectStatusRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageProjects)?;

    let payload: ProjectStatusRequest = payload.into_inner();
    let mut project = find_project(&state, &project_id).await?;
    if project.current_status() == Some(payload.kind) {
        return Ok(HttpResponse::Ok().json(ApiResponse::ok(project)));
    }
    project.update_status(payload.kind, payload.message);

    state.db.projects.replace(&project).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(project)))
}
#[delete("/projects/{project_id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageProjects)?;

    let project_id = parse_id(&project_id)?;
    if state
        .db
        .reports
        .count(doc! { "project_id": project_id })
        .await?
        > 0
    {
        return Err(AppError::validation("PROJECT_HAS_REPORTS"));
    }

    match state.db.projects.delete_by_id(&project_id).await? {
        0 => Err(AppError::NotFound("PROJECT_NOT_FOUND".to_string())),
        count => Ok(HttpResponse::Ok().json(ApiResponse::ok(count))),
    }
}
