use actix_web::{get, post, web, HttpRequest, HttpResponse};
use mongodb::bson::{doc, oid::ObjectId};
use regex::Regex;
use tracing::info;

use crate::{
    error::{AppError, ApiResponse},
    models::{
        role::{RolePermission, UserRole},
        user::{User, UserCredential, UserRequest, UserResponse},
    },
    state::{authorize, AppState},
    store::Query,
};

fn check_request(payload: &UserRequest) -> Result<(), AppError> {
    let email_regex: Regex = Regex::new(
        r"^([a-z0-9_+]([a-z0-9_+.]*[a-z0-9_+])?)@([a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,6})$",
    )
    .map_err(|error| AppError::Internal(error.to_string()))?;

    let mut issues: Vec<String> = Vec::new();
    if payload.name.trim().is_empty() {
        issues.push("USER_MUST_HAVE_NAME".to_string());
    }
    if payload.password.len() < 8 {
        issues.push("USER_MUST_HAVE_VALID_PASSWORD".to_string());
    }
    if !email_regex.is_match(&payload.email.trim().to_lowercase()) {
        issues.push("USER_MUST_HAVE_VALID_EMAIL".to_string());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(issues))
    }
}

#[get("/users")]
pub async fn get_users(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    authorize(&req, RolePermission::ManageUsers)?;

    let users = state
        .db
        .users
        .find_many(Query::default().sort(doc! { "name": 1 }))
        .await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}
/// The first account ever created bootstraps the system as an admin; every
/// later account needs an issuer allowed to manage users.
#[post("/users")]
pub async fn create_user(
    state: web::Data<AppState>,
    payload: web::Json<UserRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let payload: UserRequest = payload.into_inner();

    let role = if state.db.users.count(doc! {}).await? == 0 {
        UserRole::Admin
    } else {
        authorize(&req, RolePermission::ManageUsers)?;
        payload.role.unwrap_or(UserRole::FieldLead)
    };
    check_request(&payload)?;

    let email = payload.email.trim().to_lowercase();
    if state.db.users.count(doc! { "email": &email }).await? > 0 {
        return Err(AppError::validation("USER_ALREADY_EXIST"));
    }

    let mut user: User = User {
        _id: Some(ObjectId::new()),
        name: payload.name.trim().to_string(),
        email,
        password: payload.password,
        role,
    };
    user.hash_password()?;

    let user_id = state.db.users.insert(&user).await?;
    info!(%user_id, role = ?user.role, "user created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(UserResponse::from(&user))))
}
#[post("/users/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<UserCredential>,
) -> Result<HttpResponse, AppError> {
    let response = payload.into_inner().authenticate(&state).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}
