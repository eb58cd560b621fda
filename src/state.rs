use actix_web::{HttpMessage, HttpRequest};

use crate::{
    config::AppConfig,
    database::Collections,
    error::AppError,
    models::{
        role::RolePermission,
        user::{ActingUser, TokenKeys},
    },
    services::report_engine::ReportEngine,
};

pub struct AppState {
    pub config: AppConfig,
    pub db: Collections,
    pub keys: TokenKeys,
}

impl AppState {
    pub fn new(config: AppConfig, db: Collections) -> Self {
        let keys = TokenKeys::from_config(&config);
        Self { config, db, keys }
    }
    pub fn report_engine(&self) -> ReportEngine {
        ReportEngine::new(&self.db)
    }
}

/// Resolves the authenticated principal of a request and checks one permission.
pub fn authorize(req: &HttpRequest, permit: RolePermission) -> Result<ActingUser, AppError> {
    let issuer = match req.extensions().get::<ActingUser>() {
        Some(issuer) => issuer.clone(),
        None => return Err(AppError::Unauthorized),
    };
    if !issuer.role.permits(permit) {
        return Err(AppError::Forbidden);
    }
    Ok(issuer)
}
