use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    DependencyUnavailable,
    Unauthorized,
    Forbidden,
    InvalidId,
    InternalError,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    DependencyUnavailable(String),
    #[error("UNAUTHORIZED")]
    Unauthorized,
    #[error("FORBIDDEN")]
    Forbidden,
    #[error("INVALID_ID: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::DependencyUnavailable(_) => ErrorKind::DependencyUnavailable,
            AppError::Unauthorized => ErrorKind::Unauthorized,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::InvalidId(_) => ErrorKind::InvalidId,
            AppError::Store(StoreError::Database(_)) | AppError::Store(StoreError::Unavailable(_)) => {
                ErrorKind::DependencyUnavailable
            }
            AppError::Store(_) | AppError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON_CONVERSION_FAILED: {error}"))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SideEffectWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            warnings: Vec::new(),
            error: None,
        }
    }
    pub fn with_warnings(data: T, warnings: Vec<SideEffectWarning>) -> Self {
        Self {
            warnings,
            ..Self::ok(data)
        }
    }
}

/// A secondary write that failed while the primary write was kept.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SideEffectWarning {
    pub kind: ErrorKind,
    pub target: String,
    pub message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ValidationError | ErrorKind::InvalidId => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    fn error_response(&self) -> HttpResponse {
        let body: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            warnings: Vec::new(),
            error: Some(ApiError {
                kind: self.kind(),
                message: self.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
